use crate::domain::query::{Preset, TimeRangeSpec, TimeUnit, DEFAULT_LIMIT};
use anyhow::Context;
use regex::Regex;

const YTD_PHRASES: [&str; 3] = ["this year", "ytd", "year to date"];

/// Phrase patterns shared by the rule path and the normalizer. All methods expect
/// lower-cased text.
#[derive(Debug, Clone)]
pub struct Grammar {
    relative: Regex,
    count_after_verb: Regex,
    bare_count: Regex,
    transaction_id: Regex,
}

/// Everything the normalizer needs to know about the user's wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCues {
    pub ytd: bool,
    pub last_month: bool,
    pub time_phrase: Option<TimeRangeSpec>,
    pub count: Option<CountCue>,
}

/// A "N transactions" phrase. `value` is `None` when the digits do not fit a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountCue {
    pub value: Option<u32>,
}

impl CountCue {
    pub fn limit(self) -> u64 {
        self.value.map(u64::from).unwrap_or(DEFAULT_LIMIT)
    }
}

impl Grammar {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            relative: Regex::new(
                r"\b(last|past|previous)\s+(\d+)\s+(day|days|week|weeks|month|months|year|years)\b",
            )
            .context("relative time pattern")?,
            count_after_verb: Regex::new(
                r"\b(give\s+me|show\s+me|show|last|recent|my|need|want)\s+(\d+)\s+transactions?\b",
            )
            .context("count pattern")?,
            bare_count: Regex::new(r"\b(\d+)\s+transactions?\b").context("bare count pattern")?,
            transaction_id: Regex::new(r"\b(t\d{3})\b").context("transaction id pattern")?,
        })
    }

    pub fn cues(&self, text: &str) -> TextCues {
        let text = text.to_lowercase();
        TextCues {
            ytd: has_ytd_cue(&text),
            last_month: text.contains("last month"),
            time_phrase: self.time_phrase(&text),
            count: self.count(&text),
        }
    }

    /// "this year" / "ytd" / "year to date", "this month", "last month", bare "last week",
    /// then "(last|past|previous) N unit(s)", first match wins.
    pub fn time_phrase(&self, text: &str) -> Option<TimeRangeSpec> {
        if has_ytd_cue(text) {
            return Some(TimeRangeSpec::preset(Preset::Ytd));
        }
        if text.contains("this month") {
            return Some(TimeRangeSpec::preset(Preset::ThisMonth));
        }
        if text.contains("last month") {
            return Some(TimeRangeSpec::preset(Preset::LastMonth));
        }
        if text.contains("last week") {
            return TimeRangeSpec::relative(1, TimeUnit::Weeks).ok();
        }

        let caps = self.relative.captures(text)?;
        let n = caps.get(2)?.as_str().parse::<u32>().ok()?;
        let unit = TimeUnit::from_word(caps.get(3)?.as_str())?;
        TimeRangeSpec::relative(n, unit).ok()
    }

    /// "(give me|show me|show|last|recent|my|need|want) N transaction(s)", else bare
    /// "N transaction(s)".
    pub fn count(&self, text: &str) -> Option<CountCue> {
        let digits = match self.count_after_verb.captures(text) {
            Some(caps) => caps.get(2)?,
            None => self.bare_count.captures(text)?.get(1)?,
        };
        Some(CountCue {
            value: digits.as_str().parse().ok(),
        })
    }

    pub fn transaction_id(&self, text: &str) -> Option<String> {
        let caps = self.transaction_id.captures(text)?;
        Some(caps.get(1)?.as_str().to_string())
    }
}

pub fn has_ytd_cue(text: &str) -> bool {
    YTD_PHRASES.iter().any(|p| text.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        Grammar::new().unwrap()
    }

    #[test]
    fn named_phrases_map_to_presets() {
        let g = grammar();
        assert_eq!(g.time_phrase("spending year to date"), Some(TimeRangeSpec::preset(Preset::Ytd)));
        assert_eq!(g.time_phrase("what did i buy this month"), Some(TimeRangeSpec::preset(Preset::ThisMonth)));
        assert_eq!(g.time_phrase("transactions last month"), Some(TimeRangeSpec::preset(Preset::LastMonth)));
        assert_eq!(
            g.time_phrase("transactions from last week"),
            Some(TimeRangeSpec::relative(1, TimeUnit::Weeks).unwrap())
        );
    }

    #[test]
    fn numbered_phrases_map_to_relative() {
        let g = grammar();
        assert_eq!(
            g.time_phrase("my last 3 months subscriptions"),
            Some(TimeRangeSpec::relative(3, TimeUnit::Months).unwrap())
        );
        assert_eq!(
            g.time_phrase("past 2 weeks"),
            Some(TimeRangeSpec::relative(2, TimeUnit::Weeks).unwrap())
        );
        assert_eq!(
            g.time_phrase("previous 1 year"),
            Some(TimeRangeSpec::relative(1, TimeUnit::Years).unwrap())
        );
        assert_eq!(g.time_phrase("last 0 days"), None);
        assert_eq!(g.time_phrase("last 10 transactions"), None);
    }

    #[test]
    fn counts() {
        let g = grammar();
        let value = |text: &str| g.count(text).map(|c| c.value);
        assert_eq!(value("give me 20 transactions"), Some(Some(20)));
        assert_eq!(value("i need 15 transactions please"), Some(Some(15)));
        assert_eq!(value("15 transaction"), Some(Some(15)));
        assert_eq!(value("last 30 days transactions"), None);
    }

    #[test]
    fn oversized_count_still_matches() {
        let cue = grammar().count("show me 99999999999 transactions").unwrap();
        assert_eq!(cue.value, None);
        assert_eq!(cue.limit(), 50);
    }

    #[test]
    fn transaction_ids() {
        let g = grammar();
        assert_eq!(g.transaction_id("what is t016 about"), Some("t016".to_string()));
        assert_eq!(g.transaction_id("t0160 is too long"), None);
        assert_eq!(g.transaction_id("this transaction"), None);
    }

    #[test]
    fn cues_lowercase_input() {
        let cues = grammar().cues("Show Me My Last Month Transactions");
        assert!(cues.last_month);
        assert!(!cues.ytd);
        assert_eq!(cues.time_phrase, Some(TimeRangeSpec::preset(Preset::LastMonth)));
        assert_eq!(cues.count, None);
    }
}
