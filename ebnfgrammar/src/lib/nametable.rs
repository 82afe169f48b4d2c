//! The indexed name tables the analyzer and emitters share: keyword names
//! (with their lexemes), class names, and terminal names.
//!
//! Keyword and class names are bucketed by their first letter and kept sorted
//! within each bucket; terminal names live in a single sorted bucket. The
//! bucket capacities bound the size of grammar this tool is designed for;
//! overflowing one is a fatal diagnostic, not a recoverable condition.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ebnf::{EbnfGrammarError, EbnfGrammarErrorKind};

const LETTER_SIZE: usize = 200;
const CLASS_SIZE: usize = 400;
const NUM_LETTERS: usize = 26;

// Callers guarantee the names handed to these tables start with an ASCII
// letter: keyword and terminal names come from an all-caps lexeme, class
// names from a production name.
fn bucket_of(name: &str) -> usize {
    let c = name
        .chars()
        .next()
        .expect("name table entries cannot be empty");
    debug_assert!(c.is_ascii_alphabetic());
    (c.to_ascii_lowercase() as u8 - b'a') as usize
}

/// One keyword: its name as it appears in the grammar and the lexeme the
/// generated lexer should match. The lexeme starts out identical to the name
/// and is replaced when the grammar carries an explicit spelling production.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeywordEntry {
    pub name: String,
    pub lexeme: String,
}

/// The keyword table: 26 first-letter buckets of sorted, duplicate-free
/// keyword entries.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeywordNames {
    buckets: Vec<Vec<KeywordEntry>>,
}

impl KeywordNames {
    pub fn new() -> Self {
        KeywordNames {
            buckets: vec![Vec::new(); NUM_LETTERS],
        }
    }

    /// Insert `name` in sorted position within its first-letter bucket. A
    /// name already present is ignored.
    pub fn record(&mut self, name: &str) -> Result<(), EbnfGrammarError> {
        let bucket = &mut self.buckets[bucket_of(name)];
        match bucket.binary_search_by(|e| e.name.as_str().cmp(name)) {
            Ok(_) => Ok(()),
            Err(pos) => {
                if bucket.len() == LETTER_SIZE {
                    return Err(EbnfGrammarError::new(EbnfGrammarErrorKind::TooManyKeywords(
                        name.chars().next().unwrap(),
                    )));
                }
                bucket.insert(
                    pos,
                    KeywordEntry {
                        name: name.to_string(),
                        lexeme: name.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    /// If `name` is a recorded keyword, return its (bucket, position)
    /// coordinates.
    pub fn find(&self, name: &str) -> Option<(usize, usize)> {
        if !name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return None;
        }
        let b = bucket_of(name);
        self.buckets[b]
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|pos| (b, pos))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The lexeme recorded for `name`, if `name` is a keyword.
    pub fn lexeme(&self, name: &str) -> Option<&str> {
        self.find(name)
            .map(|(b, pos)| self.buckets[b][pos].lexeme.as_str())
    }

    pub(crate) fn set_lexeme(&mut self, bucket: usize, pos: usize, lexeme: String) {
        self.buckets[bucket][pos].lexeme = lexeme;
    }

    /// Iterate over all keywords in `A`..`Z` order, sorted within each
    /// letter.
    pub fn iter(&self) -> impl Iterator<Item = &KeywordEntry> {
        self.buckets.iter().flat_map(|b| b.iter())
    }
}

/// The class-name table: 26 first-letter buckets of sorted, duplicate-free
/// names of the classes the emitter will print.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassNames {
    buckets: Vec<Vec<String>>,
}

impl ClassNames {
    pub fn new() -> Self {
        ClassNames {
            buckets: vec![Vec::new(); NUM_LETTERS],
        }
    }

    pub fn record(&mut self, name: &str) -> Result<(), EbnfGrammarError> {
        let bucket = &mut self.buckets[bucket_of(name)];
        match bucket.binary_search_by(|e| e.as_str().cmp(name)) {
            Ok(_) => Ok(()),
            Err(pos) => {
                if bucket.len() == CLASS_SIZE {
                    return Err(EbnfGrammarError::new(EbnfGrammarErrorKind::TooManyClasses(
                        name.chars().next().unwrap(),
                    )));
                }
                bucket.insert(pos, name.to_string());
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let c = match name.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => c,
            _ => return false,
        };
        self.buckets[(c.to_ascii_lowercase() as u8 - b'a') as usize]
            .binary_search_by(|e| e.as_str().cmp(name))
            .is_ok()
    }

    /// Iterate over all class names in `a`..`z` order, sorted within each
    /// letter.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().flat_map(|b| b.iter().map(|s| s.as_str()))
    }
}

/// The terminal-name table: one flat sorted, duplicate-free bucket.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerminalNames {
    names: Vec<String>,
}

impl TerminalNames {
    pub fn new() -> Self {
        TerminalNames { names: Vec::new() }
    }

    pub fn record(&mut self, name: &str) -> Result<(), EbnfGrammarError> {
        match self.names.binary_search_by(|e| e.as_str().cmp(name)) {
            Ok(_) => Ok(()),
            Err(pos) => {
                if self.names.len() == LETTER_SIZE {
                    return Err(EbnfGrammarError::new(EbnfGrammarErrorKind::TooManyTerminals));
                }
                self.names.insert(pos, name.to_string());
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|e| e.as_str().cmp(name)).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keywords_sorted_within_bucket() {
        let mut kws = KeywordNames::new();
        kws.record("ENDSEC").unwrap();
        kws.record("DATA").unwrap();
        kws.record("DIRECTION").unwrap();
        kws.record("DATA").unwrap();
        assert_eq!(
            kws.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["DATA", "DIRECTION", "ENDSEC"]
        );
    }

    #[test]
    fn test_keyword_lexeme_aliases_name() {
        let mut kws = KeywordNames::new();
        kws.record("PLANE").unwrap();
        assert_eq!(kws.lexeme("PLANE"), Some("PLANE"));
        let (b, pos) = kws.find("PLANE").unwrap();
        kws.set_lexeme(b, pos, "PLA_NE".to_string());
        assert_eq!(kws.lexeme("PLANE"), Some("PLA_NE"));
    }

    #[test]
    fn test_keyword_bucket_overflow() {
        let mut kws = KeywordNames::new();
        for n in 0..LETTER_SIZE {
            kws.record(&format!("A{}", n)).unwrap();
        }
        match kws.record("AZZZ") {
            Err(e) => assert_eq!(*e.kind(), EbnfGrammarErrorKind::TooManyKeywords('A')),
            Ok(_) => panic!("bucket overflow not detected"),
        }
        // Re-recording an existing name must still succeed.
        kws.record("A0").unwrap();
    }

    #[test]
    fn test_class_names() {
        let mut cls = ClassNames::new();
        cls.record("workplan").unwrap();
        cls.record("plane").unwrap();
        cls.record("project").unwrap();
        assert_eq!(
            cls.iter().collect::<Vec<_>>(),
            vec!["plane", "project", "workplan"]
        );
        assert!(cls.contains("plane"));
        assert!(!cls.contains("planes"));
    }

    #[test]
    fn test_terminals_flat_and_sorted() {
        let mut terms = TerminalNames::new();
        terms.record("REALSTRING").unwrap();
        terms.record("CHARSTRING").unwrap();
        terms.record("INTSTRING").unwrap();
        terms.record("CHARSTRING").unwrap();
        assert_eq!(
            terms.iter().collect::<Vec<_>>(),
            vec!["CHARSTRING", "INTSTRING", "REALSTRING"]
        );
    }
}
