//! Rule-based tokenizer and sentence splitter.

use std::sync::LazyLock;

use regex::Regex;

use crate::tagger::Pos;

/// Surface class of a token, assigned by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Number,
    Punct,
    Symbol,
}

/// One token: a slice of the source text plus its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
    /// Filled in by the tagger; `Pos::X` until then.
    pub pos: Pos,
}

impl Token<'_> {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Token index range `[start, end)` of one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence {
    pub start: usize,
    pub end: usize,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Source text from the first token through the last.
    pub fn text<'a>(&self, source: &'a str, tokens: &[Token<'_>]) -> &'a str {
        if self.is_empty() {
            return "";
        }
        &source[tokens[self.start].start..tokens[self.end - 1].end]
    }
}

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<abbr>(?:\p{L}\.){2,})",
        r"|(?P<num>\d+(?:[.,]\d+)*\p{L}*)",
        r"|(?P<word>\p{L}[\p{L}\p{M}\p{N}]*(?:['’]\p{L}+)?)",
        r"|(?P<punct>\p{P})",
        r"|(?P<sym>\S)",
    ))
    .expect("valid regex")
});

/// Words that keep a directly following period.
const ABBREVIATIONS: &[&str] = &[
    "art", "cl", "co", "corp", "dept", "dr", "etc", "gen", "inc", "jr", "ltd", "mr", "mrs", "ms",
    "no", "nos", "pp", "pub", "rep", "sec", "secs", "sen", "sr", "st", "stat", "subch", "subsec",
    "vol", "vs",
];

/// Split `text` into tokens. Whitespace is never a token.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens: Vec<Token<'_>> = TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let (m, kind) = if let Some(m) = caps.name("abbr") {
                (m, TokenKind::Word)
            } else if let Some(m) = caps.name("num") {
                (m, TokenKind::Number)
            } else if let Some(m) = caps.name("word") {
                (m, TokenKind::Word)
            } else if let Some(m) = caps.name("punct") {
                (m, TokenKind::Punct)
            } else {
                (caps.name("sym")?, TokenKind::Symbol)
            };
            Some(Token {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
                kind,
                pos: Pos::X,
            })
        })
        .collect();

    merge_abbreviations(text, &mut tokens);
    tokens
}

/// Fold a trailing "." into known abbreviations and single capital initials.
fn merge_abbreviations<'a>(text: &'a str, tokens: &mut Vec<Token<'a>>) {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i];
        let next = tokens.get(i + 1);
        let takes_period = tok.kind == TokenKind::Word
            && next.is_some_and(|n| n.text == "." && n.start == tok.end)
            && (is_initial(tok.text)
                || ABBREVIATIONS.contains(&tok.text.to_lowercase().as_str()));

        match next {
            Some(period) if takes_period => {
                merged.push(Token {
                    text: &text[tok.start..period.end],
                    end: period.end,
                    ..tok
                });
                i += 2;
            }
            _ => {
                merged.push(tok);
                i += 1;
            }
        }
    }
    *tokens = merged;
}

fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

/// Group tokens into sentences.
///
/// A sentence ends after `.`, `!` or `?`, and at every line break.
pub fn split_sentences(text: &str, tokens: &[Token<'_>]) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, tok) in tokens.iter().enumerate() {
        let terminal = matches!(tok.text, "." | "!" | "?");
        let line_break = tokens
            .get(i + 1)
            .is_some_and(|next| text[tok.end..next.start].contains('\n'));

        if terminal || line_break {
            sentences.push(Sentence { start, end: i + 1 });
            start = i + 1;
        }
    }
    if start < tokens.len() {
        sentences.push(Sentence {
            start,
            end: tokens.len(),
        });
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn tokenizes_words_numbers_and_punctuation() {
        let tokens = tokenize("Appropriated $250,000,000 for (fiscal) year 2025.");
        assert_eq!(
            texts(&tokens),
            vec![
                "Appropriated", "$", "250,000,000", "for", "(", "fiscal", ")", "year", "2025", "."
            ]
        );
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[4].kind, TokenKind::Punct);
    }

    #[test]
    fn keeps_abbreviations_whole() {
        let tokens = tokenize("See H. R. 1234 and 42 U.S.C. 300f, sec. 2.");
        assert_eq!(
            texts(&tokens),
            vec!["See", "H.", "R.", "1234", "and", "42", "U.S.C.", "300f", ",", "sec.", "2", "."]
        );
    }

    #[test]
    fn apostrophes_stay_inside_words() {
        let tokens = tokenize("the Nation's water");
        assert_eq!(texts(&tokens), vec!["the", "Nation's", "water"]);
    }

    #[test]
    fn sentences_split_on_terminators_and_lines() {
        let text = "SEC. 2. Definitions\nIn this Act: the term applies. It ends here";
        let tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        let got: Vec<&str> = sentences.iter().map(|s| s.text(text, &tokens)).collect();
        assert_eq!(
            got,
            vec![
                "SEC. 2.",
                "Definitions",
                "In this Act: the term applies.",
                "It ends here"
            ]
        );
    }

    #[test]
    fn empty_input() {
        let tokens = tokenize("   \n ");
        assert!(tokens.is_empty());
        assert!(split_sentences("   \n ", &tokens).is_empty());
    }
}
