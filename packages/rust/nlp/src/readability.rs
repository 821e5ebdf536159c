//! Automated Readability Index.

/// Raw ARI score: `4.71 * (chars / tokens) + 0.5 * (tokens / sentences) - 21.43`.
///
/// Returns `None` when there are no tokens or no sentences.
pub fn ari_raw(num_characters: usize, num_tokens: usize, num_sentences: usize) -> Option<f64> {
    if num_tokens == 0 || num_sentences == 0 {
        return None;
    }
    let chars = num_characters as f64;
    let tokens = num_tokens as f64;
    let sentences = num_sentences as f64;
    Some(4.71 * (chars / tokens) + 0.5 * (tokens / sentences) - 21.43)
}

/// Approximate years of education needed to read text with the given ARI.
///
/// K-12 scores map to `score - 1`, a score of exactly 14 to a bachelor's
/// degree (16), and anything else above 13 adds two years per level past 14.
pub fn ari_years_education(ari_raw: f64) -> f64 {
    if ari_raw <= 13.0 {
        ari_raw - 1.0
    } else if ari_raw == 14.0 {
        16.0
    } else {
        16.0 + (ari_raw - 14.0) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ari_known_value() {
        // 4.71 * 5 + 0.5 * 10 - 21.43
        let score = ari_raw(500, 100, 10).unwrap();
        assert!((score - 7.12).abs() < 1e-9);
    }

    #[test]
    fn ari_degenerate_counts() {
        assert_eq!(ari_raw(10, 0, 1), None);
        assert_eq!(ari_raw(10, 3, 0), None);
    }

    #[test]
    fn ari_is_reproducible() {
        assert_eq!(ari_raw(1234, 210, 9), ari_raw(1234, 210, 9));
    }

    #[test]
    fn years_education_branches() {
        assert_eq!(ari_years_education(8.0), 7.0);
        assert_eq!(ari_years_education(13.0), 12.0);
        assert_eq!(ari_years_education(14.0), 16.0);
        assert_eq!(ari_years_education(15.5), 19.0);
    }
}
