use crate::registry::OrderedTable;

// ---------------------------------------------------------------------------
// KeywordDetector
// ---------------------------------------------------------------------------

/// Maps free-form text to an execution mode by case-insensitive substring
/// search. Registration order is the tie-break on both levels: modes are
/// scanned in the order they first appeared, patterns within a mode in the
/// order they were added, and the first hit wins.
#[derive(Debug, Clone, Default)]
pub struct KeywordDetector {
    table: OrderedTable<Vec<String>>,
}

impl KeywordDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trigger pattern for `mode`, creating the mode entry on first
    /// use. Patterns are stored lowercased; duplicates are kept as given
    /// (they cannot change the match outcome).
    pub fn add_keyword(&mut self, mode: impl Into<String>, pattern: impl Into<String>) {
        let mode = mode.into();
        let pattern = pattern.into().to_lowercase();
        if let Some(patterns) = self.table.get_mut(&mode) {
            patterns.push(pattern);
        } else {
            self.table.insert(mode, vec![pattern]);
        }
    }

    /// First mode any of whose patterns occurs in `text`, scanning in
    /// registration order. `None` when nothing matches.
    pub fn detect(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        for (mode, patterns) in self.table.iter() {
            if patterns.iter().any(|p| haystack.contains(p.as_str())) {
                return Some(mode);
            }
        }
        None
    }

    /// Registered modes and their patterns, in registration order.
    pub fn modes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.table.iter().map(|(mode, patterns)| (mode, patterns.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> KeywordDetector {
        let mut d = KeywordDetector::new();
        d.add_keyword("autopilot", "build me");
        d.add_keyword("ralph", "don't stop");
        d
    }

    #[test]
    fn detects_case_insensitively() {
        let d = stock();
        assert_eq!(d.detect("please build me a feature"), Some("autopilot"));
        assert_eq!(d.detect("PLEASE BUILD ME A FEATURE"), Some("autopilot"));
        assert_eq!(d.detect("don't stop until it's done"), Some("ralph"));
        assert_eq!(d.detect("hello world"), None);
    }

    #[test]
    fn uppercase_patterns_are_normalized() {
        let mut d = KeywordDetector::new();
        d.add_keyword("autopilot", "BUILD ME");
        assert_eq!(d.detect("build me a thing"), Some("autopilot"));
    }

    #[test]
    fn first_registered_mode_wins_ties() {
        let mut d = KeywordDetector::new();
        d.add_keyword("first", "go");
        d.add_keyword("second", "go");
        assert_eq!(d.detect("go now"), Some("first"));
    }

    #[test]
    fn later_pattern_still_matches_earlier_mode() {
        let mut d = stock();
        // New pattern for the first-registered mode: that mode is still
        // scanned first, so it beats any ralph pattern.
        d.add_keyword("autopilot", "don't stop");
        assert_eq!(d.detect("don't stop now"), Some("autopilot"));
    }

    #[test]
    fn substring_not_word_boundary() {
        let d = stock();
        assert_eq!(d.detect("xxbuild mexx"), Some("autopilot"));
    }

    #[test]
    fn empty_detector_matches_nothing() {
        let d = KeywordDetector::new();
        assert_eq!(d.detect("build me"), None);
        assert!(d.is_empty());
    }

    #[test]
    fn modes_listed_in_registration_order() {
        let d = stock();
        let modes: Vec<&str> = d.modes().map(|(m, _)| m).collect();
        assert_eq!(modes, vec!["autopilot", "ralph"]);

        let (_, patterns) = d.modes().next().unwrap();
        assert_eq!(patterns, ["build me"]);
    }
}
