//! Text statistics over the tokenizer, tagger and entity recognizer.

use std::collections::HashMap;

use tracing::{debug, instrument};

use billscope_shared::TextStats;

use crate::entities::{Entity, recognize};
use crate::tagger::{Pos, Tagger};
use crate::tokenize::{Sentence, Token, split_sentences, tokenize};

/// A tokenized, tagged, segmented text.
#[derive(Debug, Clone)]
pub struct Doc<'a> {
    pub text: &'a str,
    pub tokens: Vec<Token<'a>>,
    pub sentences: Vec<Sentence>,
    pub entities: Vec<Entity>,
}

impl<'a> Doc<'a> {
    pub fn sentence_texts(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.sentences
            .iter()
            .map(|s| s.text(self.text, &self.tokens))
    }
}

/// Linguistic analyzer. Build once per process and share it.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    tagger: Tagger,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            tagger: Tagger::new(),
        }
    }

    /// Tokenize, split, tag and recognize entities.
    pub fn parse<'a>(&self, text: &'a str) -> Doc<'a> {
        let mut tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        self.tagger.tag(&mut tokens, &sentences);
        let entities = recognize(text, &tokens, &sentences);
        Doc {
            text,
            tokens,
            sentences,
            entities,
        }
    }

    /// Compute [`TextStats`] for `text`. Empty text yields all-zero stats.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn analyze(&self, text: &str) -> TextStats {
        let doc = self.parse(text);
        let mut stats = TextStats {
            num_characters: text.chars().count(),
            num_tokens: doc.tokens.len(),
            num_sentences: doc.sentences.len(),
            num_entities: doc.entities.len(),
            ..TextStats::default()
        };

        for token in &doc.tokens {
            match token.pos {
                Pos::Noun | Pos::Propn | Pos::Pron => stats.num_nouns += 1,
                Pos::Verb => stats.num_verbs += 1,
                Pos::Adj => stats.num_adjectives += 1,
                Pos::Adv => stats.num_adverbs += 1,
                Pos::Punct => stats.num_punctuations += 1,
                Pos::Num => stats.num_numbers += 1,
                _ => {}
            }
        }

        if stats.num_tokens > 0 {
            let total_chars: usize = doc.tokens.iter().map(Token::char_len).sum();
            stats.avg_token_length = total_chars as f64 / stats.num_tokens as f64;
            stats.token_entropy = token_entropy(&doc.tokens);
        }
        if stats.num_sentences > 0 {
            let total_tokens: usize = doc.sentences.iter().map(Sentence::len).sum();
            stats.avg_sentence_length = total_tokens as f64 / stats.num_sentences as f64;
        }

        stats.entities = doc.entities.iter().map(|e| e.text.clone()).collect();
        stats.money_sentences = doc
            .sentence_texts()
            .filter(|s| is_money_sentence(s))
            .map(str::to_string)
            .collect();

        debug!(
            tokens = stats.num_tokens,
            sentences = stats.num_sentences,
            entities = stats.num_entities,
            money_sentences = stats.money_sentences.len(),
            "analyzed text"
        );
        stats
    }
}

/// `-Σ p ln p` over the empirical frequency of each distinct token text.
fn token_entropy(tokens: &[Token<'_>]) -> f64 {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.text).or_default() += 1;
    }
    let n = tokens.len() as f64;
    let mut ordered: Vec<usize> = counts.into_values().collect();
    ordered.sort_unstable();
    -ordered
        .into_iter()
        .map(|c| {
            let p = c as f64 / n;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Contains a `$` or the word "dollar" (case-insensitive, after a space).
pub fn is_money_sentence(sentence: &str) -> bool {
    sentence.contains('$') || sentence.to_lowercase().contains(" dollar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_averages() {
        let stats = Analyzer::new().analyze("The agency shall act. It must report.");
        assert_eq!(stats.num_tokens, 9);
        assert_eq!(stats.num_sentences, 2);
        assert_eq!(stats.num_characters, 37);
        assert_eq!(stats.num_punctuations, 2);
        assert!((stats.avg_sentence_length - 4.5).abs() < 1e-9);
        // 3+6+5+3+1+2+4+6+1 = 31 chars over 9 tokens
        assert!((stats.avg_token_length - 31.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_of_uniform_tokens() {
        let stats = Analyzer::new().analyze("alpha beta gamma delta");
        assert!((stats.token_entropy - 4f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn entropy_of_repeated_token_is_zero() {
        let stats = Analyzer::new().analyze("water water water");
        assert!(stats.token_entropy.abs() < 1e-12);
    }

    #[test]
    fn money_sentences_detected() {
        let stats = Analyzer::new().analyze(
            "Grants are limited to $5,000.\nNo funds shall be spent.\nPaid in Canadian dollars.",
        );
        assert_eq!(
            stats.money_sentences,
            vec![
                "Grants are limited to $5,000.".to_string(),
                "Paid in Canadian dollars.".to_string()
            ]
        );
    }

    #[test]
    fn empty_text_is_degenerate() {
        let stats = Analyzer::new().analyze("");
        assert_eq!(stats, TextStats::default());
    }

    #[test]
    fn analysis_is_deterministic() {
        let text = "The Administrator of the Environmental Protection Agency shall issue rules by January 1, 2026.";
        let analyzer = Analyzer::new();
        assert_eq!(analyzer.analyze(text), analyzer.analyze(text));
        assert_eq!(analyzer.analyze(text).num_entities, 2);
    }

    #[test]
    fn money_heuristic() {
        assert!(is_money_sentence("costs $5"));
        assert!(is_money_sentence("Fifty Dollars each"));
        assert!(!is_money_sentence("Dollar General"));
        assert!(!is_money_sentence("the amount of funds"));
    }
}
