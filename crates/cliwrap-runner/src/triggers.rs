//! Trigger word registry used to detect interactive prompts.

/// Ordered, append-only set of prompt substrings.
///
/// A chunk of child output "matches" when any registered word occurs in it.
/// Matching is plain substring containment over a linear scan; registries are
/// a handful of phrases long.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerWords {
    words: Vec<String>,
}

impl TriggerWords {
    #[must_use]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Register a word. Duplicates are kept; they do not change matching.
    pub fn add(&mut self, word: impl Into<String>) {
        self.words.push(word.into());
    }

    /// True iff some registered word is a substring of `chunk`.
    #[must_use]
    pub fn matches(&self, chunk: &str) -> bool {
        self.words.iter().any(|word| chunk.contains(word.as_str()))
    }

    /// First registered word found in `chunk`, in registration order.
    #[must_use]
    pub fn first_match(&self, chunk: &str) -> Option<&str> {
        self.words
            .iter()
            .map(String::as_str)
            .find(|word| chunk.contains(word))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TriggerWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for TriggerWords {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.words.extend(iter.into_iter().map(Into::into));
    }
}
