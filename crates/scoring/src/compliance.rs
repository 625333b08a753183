use regex::Regex;

/// The fixed table of banned Arena phrasing.
///
/// Arena narratives must not reference win rates, tier rankings, or
/// predictive advice about future rounds, in any supported language. The
/// table is data: new phrasings are added here with a matching test, never
/// inferred at runtime.
const BANNED_PATTERNS: &[&str] = &[
    // Win-rate phrasing.
    r"(?i)win\s*-?\s*rates?",
    r"(?i)\d{1,3}\s*%\s*(?:chance|odds|likely)",
    r"(?i)odds\s+of\s+winning",
    r"(?i)likel(?:y|ihood)\s+to\s+win",
    // Tier rankings.
    r"(?i)tier\s*(?:list|rank)",
    r"(?i)\b[SABCD]\s*-?\s*tier\b",
    // Future-round predictions.
    r"(?i)next\s+round",
    r"(?i)future\s+rounds?",
    r"(?i)you\s+(?:will|are\s+going\s+to)\s+(?:win|lose)",
    // Chinese-language variants of the same policies.
    r"胜率",
    r"下一局",
    r"下一轮",
    r"段位",
];

/// A banned pattern found in narrator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceViolation {
    /// The pattern that matched.
    pub pattern: String,
}

impl std::fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "banned pattern matched: {}", self.pattern)
    }
}

/// Post-generation text filter for Arena narratives.
#[derive(Debug)]
pub struct ComplianceFilter {
    patterns: Vec<Regex>,
}

impl Default for ComplianceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceFilter {
    /// Compile the banned-pattern table.
    ///
    /// # Panics
    ///
    /// Panics if a pattern in the table is not a valid regex; the table is
    /// compile-time data and covered by tests, so this cannot happen at
    /// runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: BANNED_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("banned pattern table must compile"))
                .collect(),
        }
    }

    /// Check a narrative (and its bullet lists) against the panel.
    ///
    /// # Errors
    ///
    /// Returns the first [`ComplianceViolation`] found.
    pub fn check(&self, text: &str) -> Result<(), ComplianceViolation> {
        for regex in &self.patterns {
            if regex.is_match(text) {
                return Err(ComplianceViolation {
                    pattern: regex.as_str().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Check every piece of a draft reply in one pass.
    pub fn check_all<'a>(
        &self,
        pieces: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ComplianceViolation> {
        for piece in pieces {
            self.check(piece)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_arena_text_passes() {
        let filter = ComplianceFilter::new();
        filter
            .check("Your duo traded health for damage perfectly in the long rounds.")
            .unwrap();
    }

    #[test]
    fn every_banned_pattern_rejects_something() {
        let filter = ComplianceFilter::new();
        let samples = [
            "your win rate should climb",
            "about an 80% chance there",
            "the odds of winning were slim",
            "you are likely to win more",
            "consult the tier list",
            "that comp is S-tier",
            "focus fire next round",
            "in future rounds pick tanks",
            "you will win if you stall",
            "你下一局胜率更高",
            "下一轮会更好",
            "你的段位会提升",
        ];
        for sample in samples {
            assert!(
                filter.check(sample).is_err(),
                "expected rejection: {sample}"
            );
        }
    }

    #[test]
    fn violation_names_the_pattern() {
        let filter = ComplianceFilter::new();
        let violation = filter.check("你下一局胜率更高").unwrap_err();
        assert!(!violation.pattern.is_empty());
        assert!(violation.to_string().contains("banned pattern"));
    }

    #[test]
    fn winrate_variants_covered() {
        let filter = ComplianceFilter::new();
        assert!(filter.check("winrate is up").is_err());
        assert!(filter.check("Win Rate: 54%").is_err());
        assert!(filter.check("win - rate talk").is_err());
    }

    #[test]
    fn check_all_scans_every_piece() {
        let filter = ComplianceFilter::new();
        let pieces = ["clean text", "also clean", "mind the next round"];
        assert!(filter.check_all(pieces).is_err());

        let clean = ["clean text", "also clean"];
        assert!(filter.check_all(clean).is_ok());
    }

    #[test]
    fn case_insensitive_matching() {
        let filter = ComplianceFilter::new();
        assert!(filter.check("NEXT ROUND you should group").is_err());
        assert!(filter.check("WIN RATE").is_err());
    }

    #[test]
    fn tier_words_in_other_contexts_pass() {
        let filter = ComplianceFilter::new();
        // "tier" alone is not banned, only ranking phrasing.
        filter.check("your frontier control was solid").unwrap();
    }
}
