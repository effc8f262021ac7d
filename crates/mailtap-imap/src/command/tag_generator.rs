//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

use std::sync::atomic::{AtomicU32, Ordering};

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format "a001", "a002", etc. Numbers
/// past 999 simply widen.
#[derive(Debug)]
pub struct TagGenerator {
    counter: AtomicU32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self {
            counter: AtomicU32::new(0),
            prefix,
        }
    }

    /// Generates the next tag.
    #[must_use]
    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        format!("{}{:03}", self.prefix, n)
    }

    /// Returns how many tags have been generated.
    #[must_use]
    pub fn current(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('a')
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_generation() {
        let generator = TagGenerator::default();
        assert_eq!(generator.next(), "a001");
        assert_eq!(generator.next(), "a002");
        assert_eq!(generator.next(), "a003");
    }

    #[test]
    fn test_custom_prefix() {
        let generator = TagGenerator::new('T');
        assert_eq!(generator.next(), "T001");
    }

    #[test]
    fn test_current() {
        let generator = TagGenerator::default();
        assert_eq!(generator.current(), 0);
        let _ = generator.next();
        assert_eq!(generator.current(), 1);
    }

    #[test]
    fn test_widens_past_999() {
        let generator = TagGenerator::default();
        for _ in 0..999 {
            let _ = generator.next();
        }
        assert_eq!(generator.next(), "a1000");
    }

    #[test]
    fn test_uniqueness() {
        let generator = TagGenerator::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5000 {
            assert!(seen.insert(generator.next()), "duplicate tag generated");
        }
    }
}
