//! Ordered first-match-wins extraction rules
//!
//! Each field owns an ordered list of rules. Rules are tried in list order
//! and the first one that matches decides the value; later rules are never
//! consulted, even if they would match earlier in the text.

use regex::Regex;
use tracing::trace;

use crate::domain::{SpecField, SpecMap, SpecValue};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// How a rule recognises its marker in the text
#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Plain substring check
    Literal {
        needle: &'static str,
        case_insensitive: bool,
    },
    /// Regular expression
    Pattern(Regex),
}

/// What value a matching rule produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValue {
    /// A fixed label, e.g. `Region free` -> `Free`
    Fixed(&'static str),
    /// A fixed number, e.g. `Single disc` -> 1
    FixedInteger(i64),
    /// The matched text itself, whitespace collapsed
    Matched,
    /// A capture group as text
    Capture(usize),
    /// A capture group parsed as an integer; a parse failure means no match
    CaptureInteger(usize),
}

/// One (pattern, field) rule
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub name: &'static str,
    pub field: SpecField,
    pub matcher: RuleMatcher,
    pub value: RuleValue,
}

impl ExtractionRule {
    pub const fn literal(
        name: &'static str,
        field: SpecField,
        needle: &'static str,
        value: RuleValue,
    ) -> Self {
        Self {
            name,
            field,
            matcher: RuleMatcher::Literal {
                needle,
                case_insensitive: true,
            },
            value,
        }
    }

    pub fn pattern(
        name: &'static str,
        field: SpecField,
        pattern: &str,
        value: RuleValue,
    ) -> ParsingResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| ParsingError::invalid_pattern(name, e))?;
        Ok(Self {
            name,
            field,
            matcher: RuleMatcher::Pattern(regex),
            value,
        })
    }

    /// Apply this rule alone to `text`
    pub fn apply(&self, text: &str) -> Option<SpecValue> {
        match &self.matcher {
            RuleMatcher::Literal {
                needle,
                case_insensitive,
            } => {
                let found = if *case_insensitive {
                    text.to_lowercase().contains(&needle.to_lowercase())
                } else {
                    text.contains(needle)
                };
                if !found {
                    return None;
                }
                match &self.value {
                    RuleValue::Fixed(label) => Some(SpecValue::from(*label)),
                    RuleValue::FixedInteger(n) => Some(SpecValue::Integer(*n)),
                    RuleValue::Matched => Some(SpecValue::from(*needle)),
                    RuleValue::Capture(_) | RuleValue::CaptureInteger(_) => None,
                }
            }
            RuleMatcher::Pattern(regex) => {
                let captures = regex.captures(text)?;
                match &self.value {
                    RuleValue::Fixed(label) => Some(SpecValue::from(*label)),
                    RuleValue::FixedInteger(n) => Some(SpecValue::Integer(*n)),
                    RuleValue::Matched => {
                        let whole = captures.get(0)?.as_str();
                        Some(SpecValue::Text(collapse_ws(whole)))
                    }
                    RuleValue::Capture(i) => {
                        let group = captures.get(*i)?.as_str().trim();
                        (!group.is_empty()).then(|| SpecValue::Text(collapse_ws(group)))
                    }
                    RuleValue::CaptureInteger(i) => {
                        let group = captures.get(*i)?.as_str().trim();
                        group.parse::<i64>().ok().map(SpecValue::Integer)
                    }
                }
            }
        }
    }
}

/// Try `rules` in order; the first match wins.
pub fn apply_rules<'r>(
    rules: &'r [ExtractionRule],
    text: &str,
) -> Option<(SpecValue, &'r ExtractionRule)> {
    rules.iter().find_map(|rule| {
        let value = rule.apply(text)?;
        trace!("Rule '{}' matched for {}", rule.name, rule.field);
        Some((value, rule))
    })
}

/// Rules for every field, each field's list in priority order
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ExtractionRule>,
}

impl RuleSet {
    pub const fn new(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    /// Rules for one field, in priority order
    pub fn rules_for(&self, field: SpecField) -> Vec<ExtractionRule> {
        self.rules.iter().filter(|r| r.field == field).cloned().collect()
    }

    /// Run every field's rule list over `text`
    pub fn extract(&self, text: &str) -> SpecMap {
        let mut map = SpecMap::new();
        for field in SpecField::ALL {
            if let Some((value, _)) = apply_rules(&self.rules_for(field), text) {
                map.insert(field, value);
            }
        }
        map
    }

    /// Retailer page rules
    pub fn retailer_page() -> ParsingResult<Self> {
        use RuleValue::{CaptureInteger, Fixed, FixedInteger, Matched};
        use SpecField::{Audio, DiscCount, Packaging, Region, Runtime};

        let rules = vec![
            ExtractionRule::pattern("runtime", Runtime, r"(?i)\bruntime\s*:?\s*(\d{1,3})\s*min", CaptureInteger(1))?,
            ExtractionRule::pattern("audio_dts_hd_ma", Audio, r"DTS-HD Master Audio(?:[ \t]+\d\.\d)?", Matched)?,
            ExtractionRule::pattern("audio_truehd", Audio, r"Dolby TrueHD(?:[ \t]+\d\.\d)?", Matched)?,
            ExtractionRule::pattern("audio_atmos", Audio, r"Dolby Atmos", Matched)?,
            ExtractionRule::pattern("audio_dts_x", Audio, r"DTS:X", Matched)?,
            ExtractionRule::pattern("audio_lpcm", Audio, r"LPCM[ \t]+\d\.\d", Matched)?,
            ExtractionRule::pattern("audio_dolby_digital", Audio, r"Dolby Digital[ \t]+\d\.\d", Matched)?,
            ExtractionRule::pattern("region_a", Region, r"\bRegion\s*:?\s*A\b", Fixed("A"))?,
            ExtractionRule::pattern("region_b", Region, r"\bRegion\s*:?\s*B\b", Fixed("B"))?,
            ExtractionRule::pattern("region_c", Region, r"\bRegion\s*:?\s*C\b", Fixed("C"))?,
            ExtractionRule::literal("region_free", Region, "region free", Fixed("Free")),
            ExtractionRule::literal("packaging_steelbook", Packaging, "steelbook", Fixed("SteelBook")),
            ExtractionRule::literal("packaging_digibook", Packaging, "digibook", Fixed("DigiBook")),
            ExtractionRule::literal("packaging_mediabook", Packaging, "mediabook", Fixed("Mediabook")),
            ExtractionRule::literal("packaging_slipcover", Packaging, "slipcover", Fixed("Slipcover")),
            ExtractionRule::literal("packaging_keep_case", Packaging, "keep case", Fixed("Keep Case")),
            ExtractionRule::pattern("discs_bd_count", DiscCount, r"\((\d+)\s+BDs?\)", CaptureInteger(1))?,
            ExtractionRule::pattern("discs_n_disc_set", DiscCount, r"(?i)\b(\d+)-disc set", CaptureInteger(1))?,
            ExtractionRule::literal("discs_single", DiscCount, "single disc", FixedInteger(1)),
            ExtractionRule::literal("discs_two", DiscCount, "two-disc set", FixedInteger(2)),
            ExtractionRule::literal("discs_three", DiscCount, "three-disc set", FixedInteger(3)),
        ];

        Ok(Self::new(rules))
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rules() -> RuleSet {
        RuleSet::retailer_page().unwrap()
    }

    #[test]
    fn test_dts_hd_with_channels() {
        let map = rules().extract("Audio\nDTS-HD Master Audio 7.1\nEnglish");
        assert_eq!(map.get(SpecField::Audio), Some(&SpecValue::from("DTS-HD Master Audio 7.1")));
    }

    #[rstest]
    #[case::dts_first("DTS-HD Master Audio 5.1\nDolby Atmos")]
    #[case::atmos_first("Dolby Atmos\nDTS-HD Master Audio 5.1")]
    fn test_audio_priority_ignores_text_order(#[case] text: &str) {
        let map = rules().extract(text);
        assert_eq!(map.get(SpecField::Audio), Some(&SpecValue::from("DTS-HD Master Audio 5.1")));
    }

    #[rstest]
    #[case("Dolby TrueHD 7.1\nDolby Atmos", "Dolby TrueHD 7.1")]
    #[case("English: Dolby Atmos", "Dolby Atmos")]
    #[case("English: LPCM 2.0", "LPCM 2.0")]
    #[case("French: Dolby Digital 5.1", "Dolby Digital 5.1")]
    fn test_audio_rules(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(rules().extract(text).get(SpecField::Audio), Some(&SpecValue::from(expected)));
    }

    #[rstest]
    #[case("Blu-ray Disc\nRegion A (B, C untested)", "A")]
    #[case("Region: B", "B")]
    #[case("4K Ultra HD: Region free", "Free")]
    #[case("Region A\nRegion free", "A")]
    fn test_region_rules(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(rules().extract(text).get(SpecField::Region), Some(&SpecValue::from(expected)));
    }

    #[rstest]
    #[case("Packaging: Keep case, Slipcover in original pressing", "Slipcover")]
    #[case("Limited Edition SteelBook", "SteelBook")]
    #[case("Keep Case", "Keep Case")]
    fn test_packaging_rules(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(rules().extract(text).get(SpecField::Packaging), Some(&SpecValue::from(expected)));
    }

    #[rstest]
    #[case("Two-disc set (1 BD-66, 1 BD-50)", 2)]
    #[case("Three-disc set (2 BDs, 1 DVD)", 3)]
    #[case("Blu-ray + DVD (2 BDs)", 2)]
    #[case("Single disc (1 BD)", 1)]
    #[case("4-disc set", 4)]
    fn test_disc_count_rules(#[case] text: &str, #[case] expected: i64) {
        assert_eq!(rules().extract(text).get(SpecField::DiscCount), Some(&SpecValue::Integer(expected)));
    }

    #[test]
    fn test_runtime_rule() {
        let map = rules().extract("Video\nRuntime: 170 min\nRated R");
        assert_eq!(map.get(SpecField::Runtime), Some(&SpecValue::Integer(170)));
    }

    #[test]
    fn test_no_match_leaves_field_absent() {
        let map = rules().extract("Nothing useful here");
        assert!(map.is_empty());
    }

    #[test]
    fn test_single_rule_applies_independently() {
        let set = rules();
        let atmos = set
            .rules_for(SpecField::Audio)
            .into_iter()
            .find(|r| r.name == "audio_atmos")
            .unwrap();

        assert_eq!(atmos.apply("Dolby Atmos"), Some(SpecValue::from("Dolby Atmos")));
        assert_eq!(atmos.apply("DTS-HD Master Audio 7.1"), None);
    }

    #[test]
    fn test_apply_rules_reports_winning_rule() {
        let set = rules();
        let audio = set.rules_for(SpecField::Audio);
        let (value, rule) = apply_rules(&audio, "Dolby Atmos / Dolby TrueHD 7.1").unwrap();

        assert_eq!(rule.name, "audio_truehd");
        assert_eq!(value, SpecValue::from("Dolby TrueHD 7.1"));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let err = ExtractionRule::pattern("broken", SpecField::Runtime, r"(\d+", RuleValue::Matched).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidPattern { .. }));
    }
}
