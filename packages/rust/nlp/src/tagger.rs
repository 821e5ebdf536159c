//! Lexicon and suffix-rule part-of-speech tagger.
//!
//! Tags follow the Universal Dependencies coarse tag set.

use std::collections::HashMap;

use crate::tokenize::{Sentence, Token, TokenKind};

/// Universal POS tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pos {
    Noun,
    Propn,
    Pron,
    Verb,
    Adj,
    Adv,
    Punct,
    Num,
    Det,
    Adp,
    Cconj,
    Sconj,
    Part,
    Aux,
    Sym,
    X,
}

impl Pos {
    /// Function-word classes; these keep their tag even when capitalized.
    pub fn is_closed_class(self) -> bool {
        matches!(
            self,
            Pos::Pron | Pos::Det | Pos::Adp | Pos::Cconj | Pos::Sconj | Pos::Part | Pos::Aux
        )
    }
}

const DETERMINERS: &[&str] = &[
    "a", "all", "an", "another", "any", "both", "each", "either", "every", "neither", "no", "some",
    "such", "that", "the", "these", "this", "those",
];

const PRONOUNS: &[&str] = &[
    "he", "her", "hers", "herself", "him", "himself", "his", "i", "it", "its", "itself", "me",
    "my", "our", "ours", "ourselves", "she", "their", "theirs", "them", "themselves", "there",
    "they", "us", "we", "what", "which", "who", "whom", "whose", "you", "your",
];

const ADPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "among", "around", "at", "before", "behind",
    "below", "beneath", "between", "beyond", "by", "concerning", "despite", "during", "except",
    "for", "from", "in", "including", "inside", "into", "like", "near", "of", "off", "on", "onto",
    "out", "over", "pursuant", "regarding", "since", "through", "throughout", "to", "toward",
    "towards", "under", "until", "upon", "via", "with", "within", "without",
];

const COORDINATORS: &[&str] = &["and", "but", "nor", "or", "plus", "yet"];

const SUBORDINATORS: &[&str] = &[
    "although", "because", "if", "notwithstanding", "provided", "than", "though", "unless",
    "whereas", "whether", "while",
];

const PARTICLES: &[&str] = &["not", "n't", "'s"];

const AUXILIARIES: &[&str] = &[
    "am", "are", "be", "been", "being", "can", "could", "did", "do", "does", "had", "has", "have",
    "having", "is", "may", "might", "must", "shall", "should", "was", "were", "will", "would",
];

const ADVERBS: &[&str] = &[
    "again", "also", "already", "always", "hereafter", "hereby", "herein", "however", "further",
    "furthermore", "moreover", "never", "not", "now", "often", "only", "otherwise", "so", "still",
    "then", "thereafter", "thereby", "therefore", "therein", "thereof", "thereto", "thus", "too",
    "very", "when", "where",
];

const VERBS: &[&str] = &[
    "add", "adds", "allow", "amend", "amends", "apply", "applies", "appropriate", "authorize",
    "authorizes", "carry", "cite", "consider", "continue", "create", "define", "direct", "enact",
    "ensure", "establish", "establishes", "give", "include", "includes", "issue", "make",
    "makes", "mean", "means", "made", "operate", "operates", "provide", "provides", "receive",
    "reduce", "repeal", "require", "requires", "said", "say", "strike", "submit", "take", "took",
    "use", "uses",
];

const ADJECTIVES: &[&str] = &[
    "additional", "appropriate", "available", "certain", "current", "eligible", "federal",
    "final", "first", "following", "foreign", "general", "new", "other", "public", "relevant",
    "second", "same", "such", "third", "total",
];

const NUMBER_WORDS: &[&str] = &[
    "billion", "eight", "eighteen", "eighty", "eleven", "fifteen", "fifty", "five", "forty",
    "four", "fourteen", "hundred", "million", "nine", "nineteen", "ninety", "one", "seven",
    "seventeen", "seventy", "six", "sixteen", "sixty", "ten", "thirteen", "thirty", "thousand",
    "three", "trillion", "twelve", "twenty", "two", "zero",
];

/// Word → tag lookup plus suffix rules for unknown words.
#[derive(Debug, Clone)]
pub struct Tagger {
    lexicon: HashMap<&'static str, Pos>,
}

impl Default for Tagger {
    fn default() -> Self {
        Self::new()
    }
}

impl Tagger {
    pub fn new() -> Self {
        // Later tables win, so the more specific classes come last.
        let tables: [(&[&str], Pos); 11] = [
            (NUMBER_WORDS, Pos::Num),
            (VERBS, Pos::Verb),
            (ADJECTIVES, Pos::Adj),
            (ADVERBS, Pos::Adv),
            (ADPOSITIONS, Pos::Adp),
            (SUBORDINATORS, Pos::Sconj),
            (COORDINATORS, Pos::Cconj),
            (PRONOUNS, Pos::Pron),
            (DETERMINERS, Pos::Det),
            (AUXILIARIES, Pos::Aux),
            (PARTICLES, Pos::Part),
        ];

        let mut lexicon = HashMap::new();
        for (words, pos) in tables {
            for word in words {
                lexicon.insert(*word, pos);
            }
        }
        Self { lexicon }
    }

    /// Assign `pos` to every token in place.
    pub fn tag(&self, tokens: &mut [Token<'_>], sentences: &[Sentence]) {
        for sentence in sentences {
            let mut prev: Option<Pos> = None;
            for i in sentence.start..sentence.end {
                let pos = self.tag_token(&tokens[i], i == sentence.start, prev);
                tokens[i].pos = pos;
                prev = Some(pos);
            }

            // A capitalized opener directly followed by a proper noun is part of the name.
            if sentence.len() > 1 {
                let (first, second) = (&tokens[sentence.start], &tokens[sentence.start + 1]);
                if first.kind == TokenKind::Word
                    && first.is_capitalized()
                    && matches!(first.pos, Pos::Noun | Pos::Adj)
                    && second.pos == Pos::Propn
                {
                    tokens[sentence.start].pos = Pos::Propn;
                }
            }
        }
    }

    fn tag_token(&self, token: &Token<'_>, sentence_start: bool, prev: Option<Pos>) -> Pos {
        match token.kind {
            TokenKind::Number => Pos::Num,
            TokenKind::Punct => Pos::Punct,
            TokenKind::Symbol => Pos::Sym,
            TokenKind::Word => self.tag_word(token, sentence_start, prev),
        }
    }

    fn tag_word(&self, token: &Token<'_>, sentence_start: bool, prev: Option<Pos>) -> Pos {
        let word = token.text;
        let lower = word.to_lowercase();
        let capitalized = token.is_capitalized();

        if let Some(&pos) = self.lexicon.get(lower.as_str()) {
            if pos.is_closed_class() || pos == Pos::Num || sentence_start || !capitalized {
                return pos;
            }
            return Pos::Propn;
        }

        if capitalized && !sentence_start {
            return Pos::Propn;
        }
        if word.chars().count() > 1 && word.chars().all(|c| !c.is_lowercase()) {
            return Pos::Propn;
        }

        suffix_tag(&lower, prev)
    }
}

fn suffix_tag(lower: &str, prev: Option<Pos>) -> Pos {
    let long = lower.chars().count() > 4;
    let after_modifier = matches!(prev, Some(Pos::Det | Pos::Adj));

    if long && lower.ends_with("ly") {
        Pos::Adv
    } else if long && (lower.ends_with("ing") || lower.ends_with("ed")) {
        if after_modifier { Pos::Adj } else { Pos::Verb }
    } else if ["ize", "ise", "ify"].iter().any(|s| lower.ends_with(s)) {
        Pos::Verb
    } else if ["able", "ible", "ous", "ful", "ive", "ical", "less"]
        .iter()
        .any(|s| lower.ends_with(s))
    {
        Pos::Adj
    } else {
        Pos::Noun
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::{split_sentences, tokenize};

    fn tags(text: &str) -> Vec<(String, Pos)> {
        let mut tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        Tagger::new().tag(&mut tokens, &sentences);
        tokens.iter().map(|t| (t.text.to_string(), t.pos)).collect()
    }

    #[test]
    fn closed_classes_and_punctuation() {
        let got = tags("The term shall not apply to the program.");
        assert_eq!(got[0].1, Pos::Det);
        assert_eq!(got[1].1, Pos::Noun);
        assert_eq!(got[2].1, Pos::Aux);
        assert_eq!(got[3].1, Pos::Part);
        assert_eq!(got[4].1, Pos::Verb);
        assert_eq!(got[5].1, Pos::Adp);
        assert_eq!(got[8].1, Pos::Punct);
    }

    #[test]
    fn capitalized_words_mid_sentence_are_proper_nouns() {
        let got = tags("The Administrator of the Environmental Protection Agency");
        assert_eq!(got[1].1, Pos::Propn);
        assert_eq!(got[2].1, Pos::Adp);
        assert_eq!(got[4].1, Pos::Propn);
        assert_eq!(got[6].1, Pos::Propn);
    }

    #[test]
    fn suffix_rules() {
        let got = tags("it quickly modernized the amended water system");
        assert_eq!(got[1].1, Pos::Adv);
        assert_eq!(got[2].1, Pos::Verb);
        assert_eq!(got[4].1, Pos::Adj);
        assert_eq!(got[5].1, Pos::Noun);
    }

    #[test]
    fn numbers_and_symbols() {
        let got = tags("$5 for two years");
        assert_eq!(got[0].1, Pos::Sym);
        assert_eq!(got[1].1, Pos::Num);
        assert_eq!(got[3].1, Pos::Num);
    }

    #[test]
    fn capitalized_opener_joins_name() {
        let got = tags("Clean Water Act funding");
        assert_eq!(got[0].1, Pos::Propn);
        assert_eq!(got[1].1, Pos::Propn);
    }
}
