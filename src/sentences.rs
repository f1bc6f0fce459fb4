use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::{fs, io};
use thiserror::Error;
use tracing::debug;

static DATA_DIR: Dir = include_dir!("src/data");

const BUNDLED_FILE: &str = "sentences.json";

#[derive(Debug, Error)]
pub enum SentenceError {
    #[error("bundled sentence file {0} not found")]
    MissingBundle(&'static str),

    #[error("failed to read sentences: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse sentences: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct BundledSentences {
    sentences: Vec<String>,
}

/// Hands out the next sentence to show during a test.
pub trait SentenceSource {
    /// `None` once the source has nothing new to offer.
    fn next_sentence(&mut self) -> Option<String>;
}

impl SentenceSource for VecDeque<String> {
    fn next_sentence(&mut self) -> Option<String> {
        self.pop_front()
    }
}

/// The set of sentences a test can draw from. Entries are trimmed,
/// non-empty and unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceBank {
    sentences: Vec<String>,
}

impl SentenceBank {
    pub fn new<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sentences = sentences
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .unique()
            .collect();
        Self { sentences }
    }

    /// Sentences shipped with the binary.
    pub fn bundled() -> Result<Self, SentenceError> {
        let contents = DATA_DIR
            .get_file(BUNDLED_FILE)
            .and_then(|f| f.contents_utf8())
            .ok_or(SentenceError::MissingBundle(BUNDLED_FILE))?;
        let bundled: BundledSentences = serde_json::from_str(contents)?;
        Ok(Self::new(bundled.sentences))
    }

    /// One sentence per line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SentenceError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let bank = Self::new(contents.lines());
        debug!(path = %path.as_ref().display(), count = bank.len(), "loaded sentences");
        Ok(bank)
    }

    /// Write one sentence per line, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SentenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = self.sentences.join("\n");
        contents.push('\n');
        fs::write(path, contents)?;
        debug!(path = %path.display(), count = self.len(), "saved sentences");
        Ok(())
    }

    /// The file at `path` if given and present, otherwise the bundled set.
    pub fn load(path: Option<&Path>) -> Result<Self, SentenceError> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Self::bundled(),
        }
    }

    /// Returns false for blank or duplicate sentences.
    pub fn add(&mut self, sentence: &str) -> bool {
        let sentence = sentence.trim();
        if sentence.is_empty() || self.sentences.iter().any(|s| s == sentence) {
            return false;
        }
        self.sentences.push(sentence.to_string());
        true
    }

    pub fn remove(&mut self, sentence: &str) -> bool {
        let before = self.sentences.len();
        self.sentences.retain(|s| s != sentence.trim());
        self.sentences.len() != before
    }

    /// Case-insensitive substring search.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.sentences
            .iter()
            .filter(|s| s.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(String::as_str)
    }

    /// A shuffled deck that never repeats a sentence.
    pub fn deck(&self) -> SentenceDeck {
        let mut remaining = self.sentences.clone();
        remaining.shuffle(&mut rand::thread_rng());
        SentenceDeck { remaining }
    }
}

#[derive(Debug, Clone)]
pub struct SentenceDeck {
    remaining: Vec<String>,
}

impl SentenceDeck {
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl SentenceSource for SentenceDeck {
    fn next_sentence(&mut self) -> Option<String> {
        self.remaining.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn test_bundled_sentences() {
        let bank = SentenceBank::bundled().unwrap();
        assert!(bank.len() >= 10);
        assert!(bank.iter().all(|s| !s.is_empty() && s.trim() == s));
    }

    #[test]
    fn test_new_trims_and_dedupes() {
        let bank = SentenceBank::new(["  one  ", "two", "", "one", "   "]);
        assert_eq!(bank.iter().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sentences.txt");
        fs::write(&path, "First sentence.\n\nSecond sentence.  \nFirst sentence.\n").unwrap();

        let bank = SentenceBank::from_file(&path).unwrap();
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_load_falls_back_to_bundled() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let bank = SentenceBank::load(Some(missing.as_path())).unwrap();
        assert_eq!(bank, SentenceBank::bundled().unwrap());
    }

    #[test]
    fn test_add_remove_search() {
        let mut bank = SentenceBank::new(["The cat sat.", "A dog ran."]);
        assert!(bank.add("Birds sing at dawn."));
        assert!(!bank.add("The cat sat."));
        assert!(!bank.add("  "));
        assert_eq!(bank.search("CAT"), vec!["The cat sat."]);
        assert!(bank.remove("A dog ran."));
        assert!(!bank.remove("A dog ran."));
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_edits_survive_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sentences.txt");

        let mut bank = SentenceBank::new(["The cat sat.", "A dog ran."]);
        bank.add("Birds sing at dawn.");
        bank.remove("The cat sat.");
        bank.save(&path).unwrap();

        let reloaded = SentenceBank::load(Some(path.as_path())).unwrap();
        assert_eq!(reloaded, bank);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "A dog ran.\nBirds sing at dawn.\n"
        );
    }

    #[test]
    fn test_deck_never_repeats() {
        let bank = SentenceBank::new(["a", "b", "c", "d"]);
        let mut deck = bank.deck();
        let mut seen = HashSet::new();
        while let Some(s) = deck.next_sentence() {
            assert!(seen.insert(s));
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(deck.remaining(), 0);
    }
}
