//! Vault path normalization and match selection.
//!
//! Agents refer to notes loosely ("Daily note", "💡 Project Ideas"). The
//! [`PathNormalizer`] reduces any such candidate to a comparison key, and
//! [`PathNormalizer::select_match`] picks the listing entry it refers to.

use std::cmp::Ordering;

/// Default extension enforced on normalized keys.
pub const DEFAULT_EXTENSION: &str = ".md";

/// Punctuation that survives normalization (everything else that is not
/// alphanumeric or whitespace is treated as decoration).
const KEPT_PUNCTUATION: &[char] = &['/', '.', '-', '_', '\'', '(', ')', '&', ',', '+', '#'];

/// Reduces path candidates to comparison keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNormalizer {
    extension: String,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}

impl PathNormalizer {
    /// Create a normalizer enforcing `extension` (with or without the dot).
    pub fn new(extension: impl AsRef<str>) -> Self {
        let ext = extension.as_ref().trim().to_lowercase();
        let extension = if ext.is_empty() || ext.starts_with('.') {
            ext
        } else {
            format!(".{ext}")
        };
        Self { extension }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Normalize a candidate into its comparison key.
    ///
    /// Strips emoji and other decorative symbols, lowercases, collapses
    /// whitespace, trims every path segment and appends the expected
    /// extension when it is missing.
    pub fn normalize(&self, candidate: &str) -> String {
        let cleaned: String = candidate
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(c))
            .flat_map(char::to_lowercase)
            .collect();

        let segments: Vec<String> = cleaned
            .split('/')
            .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|segment| !segment.is_empty())
            .collect();
        let mut key = segments.join("/");

        if !self.extension.is_empty() && !key.ends_with(&self.extension) {
            key.push_str(&self.extension);
        }
        key
    }

    /// Key without the enforced extension.
    fn stem<'k>(&self, key: &'k str) -> &'k str {
        key.strip_suffix(self.extension.as_str()).unwrap_or(key)
    }

    /// Whether a key carries nothing but the enforced extension.
    fn is_blank_key(&self, key: &str) -> bool {
        self.stem(key).trim().is_empty()
    }

    /// Pick the listing entry that `candidate` refers to.
    ///
    /// 1. An entry whose key equals the candidate's key.
    /// 2. Otherwise entries whose key contains, or is contained in, the
    ///    candidate's key, compared without the extension. Ties are broken
    ///    by ascending key length, then ascending path length, then
    ///    lexicographically.
    ///
    /// Returns the original (non-normalized) listing path.
    pub fn select_match<'a>(&self, candidate: &str, listing: &'a [String]) -> Option<&'a str> {
        let key = self.normalize(candidate);
        if self.is_blank_key(&key) {
            return None;
        }

        let keyed: Vec<(String, &'a str)> = listing
            .iter()
            .map(|path| (self.normalize(path), path.as_str()))
            .filter(|(entry_key, _)| !self.is_blank_key(entry_key))
            .collect();

        let exact = keyed
            .iter()
            .filter(|(entry_key, _)| *entry_key == key)
            .min_by(|a, b| rank(a, b));
        if let Some((_, path)) = exact {
            return Some(*path);
        }

        let stem = self.stem(&key);
        keyed
            .iter()
            .filter(|(entry_key, _)| {
                let entry_stem = self.stem(entry_key);
                entry_stem.contains(stem) || stem.contains(entry_stem)
            })
            .min_by(|a, b| rank(a, b))
            .map(|(_, path)| *path)
    }
}

fn rank(a: &(String, &str), b: &(String, &str)) -> Ordering {
    a.0.len()
        .cmp(&b.0.len())
        .then_with(|| a.1.len().cmp(&b.1.len()))
        .then_with(|| a.1.cmp(b.1))
}
