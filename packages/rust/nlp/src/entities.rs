//! Named-entity spans over tagged tokens.

use crate::tagger::Pos;
use crate::tokenize::{Sentence, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// `$` amounts, optionally scaled ("$5 million").
    Money,
    /// Calendar dates and years.
    Date,
    /// Runs of proper nouns ("Environmental Protection Agency").
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
}

const MONTHS: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const SCALES: &[&str] = &["thousand", "million", "billion", "trillion"];

/// Lowercase words allowed inside a name when another proper noun follows.
const NAME_CONNECTORS: &[&str] = &["of", "the", "and", "for", "on"];

/// Find entities in document order. Spans never overlap or cross sentences.
pub fn recognize(text: &str, tokens: &[Token<'_>], sentences: &[Sentence]) -> Vec<Entity> {
    let mut entities = Vec::new();

    for sentence in sentences {
        let mut i = sentence.start;
        while i < sentence.end {
            let found = money_span(tokens, i, sentence.end)
                .map(|end| (end, EntityKind::Money))
                .or_else(|| date_span(tokens, i, sentence.end).map(|end| (end, EntityKind::Date)))
                .or_else(|| name_span(tokens, i, sentence.end).map(|end| (end, EntityKind::Name)));

            match found {
                Some((end, kind)) => {
                    entities.push(Entity {
                        text: text[tokens[i].start..tokens[end - 1].end].to_string(),
                        kind,
                    });
                    i = end;
                }
                None => i += 1,
            }
        }
    }
    entities
}

fn money_span(tokens: &[Token<'_>], i: usize, limit: usize) -> Option<usize> {
    if tokens[i].text != "$" || i + 1 >= limit || tokens[i + 1].kind != TokenKind::Number {
        return None;
    }
    let mut end = i + 2;
    if end < limit && SCALES.contains(&tokens[end].text.to_lowercase().as_str()) {
        end += 1;
    }
    Some(end)
}

fn date_span(tokens: &[Token<'_>], i: usize, limit: usize) -> Option<usize> {
    let tok = &tokens[i];
    if is_year(tok) {
        return Some(i + 1);
    }
    if !MONTHS.contains(&tok.text) {
        return None;
    }

    let mut end = i + 1;
    if end < limit && is_day(&tokens[end]) {
        end += 1;
        if end + 1 < limit && tokens[end].text == "," && is_year(&tokens[end + 1]) {
            end += 2;
        }
    } else if end < limit && is_year(&tokens[end]) {
        end += 1;
    }
    (end > i + 1).then_some(end)
}

fn name_span(tokens: &[Token<'_>], i: usize, limit: usize) -> Option<usize> {
    if tokens[i].pos != Pos::Propn {
        return None;
    }
    let mut end = i + 1;
    while end < limit {
        if tokens[end].pos == Pos::Propn {
            end += 1;
            continue;
        }
        let mut k = end;
        while k < limit && NAME_CONNECTORS.contains(&tokens[k].text) {
            k += 1;
        }
        if k > end && k < limit && tokens[k].pos == Pos::Propn {
            end = k + 1;
        } else {
            break;
        }
    }

    // A lone one-letter token is an initial or a list marker, not a name.
    if end == i + 1 && tokens[i].text.trim_end_matches('.').chars().count() < 2 {
        return None;
    }
    Some(end)
}

fn is_year(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Number
        && tok.text.len() == 4
        && tok
            .text
            .parse::<u32>()
            .is_ok_and(|y| (1700..2200).contains(&y))
}

fn is_day(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Number && tok.text.parse::<u32>().is_ok_and(|d| (1..=31).contains(&d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::Tagger;
    use crate::tokenize::{split_sentences, tokenize};

    fn entities(text: &str) -> Vec<(String, EntityKind)> {
        let mut tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        Tagger::new().tag(&mut tokens, &sentences);
        recognize(text, &tokens, &sentences)
            .into_iter()
            .map(|e| (e.text, e.kind))
            .collect()
    }

    #[test]
    fn money_amounts() {
        let got = entities("There is authorized $250,000,000 and $5 million for grants.");
        assert_eq!(
            got,
            vec![
                ("$250,000,000".to_string(), EntityKind::Money),
                ("$5 million".to_string(), EntityKind::Money),
            ]
        );
    }

    #[test]
    fn dates_and_years() {
        let got = entities("introduced on March 15, 2024 for fiscal year 2025.");
        assert_eq!(
            got,
            vec![
                ("March 15, 2024".to_string(), EntityKind::Date),
                ("2025".to_string(), EntityKind::Date),
            ]
        );
    }

    #[test]
    fn proper_noun_runs_with_connectors() {
        let got = entities("the Administrator of the Environmental Protection Agency shall act.");
        assert_eq!(
            got,
            vec![(
                "Administrator of the Environmental Protection Agency".to_string(),
                EntityKind::Name
            )]
        );
    }

    #[test]
    fn no_entities_in_plain_text() {
        assert!(entities("the term means a municipality.").is_empty());
    }
}
