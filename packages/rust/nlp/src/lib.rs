//! Linguistic analysis and readability scoring for bill text.
//!
//! The [`Analyzer`] is a deterministic, rule-based pipeline:
//! tokenize → split sentences → tag parts of speech → recognize entities.
//! It produces the [`TextStats`](billscope_shared::TextStats) recorded on
//! every bill and section.

mod analyzer;
mod entities;
mod readability;
mod tagger;
mod tokenize;

pub use analyzer::{Analyzer, Doc, is_money_sentence};
pub use entities::{Entity, EntityKind};
pub use readability::{ari_raw, ari_years_education};
pub use tagger::{Pos, Tagger};
pub use tokenize::{Sentence, Token, TokenKind, split_sentences, tokenize};
