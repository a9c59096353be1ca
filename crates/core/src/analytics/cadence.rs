use serde::Serialize;

/// Minimum score a cadence needs before a merchant counts as recurring.
pub const MIN_CADENCE_SCORE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Unknown,
}

impl Cadence {
    /// Candidates in tie-break order, with their target gap in days.
    pub const CANDIDATES: [(Cadence, f64); 5] = [
        (Cadence::Weekly, 7.0),
        (Cadence::Biweekly, 14.0),
        (Cadence::Monthly, 30.0),
        (Cadence::Quarterly, 90.0),
        (Cadence::Yearly, 365.0),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Biweekly => "biweekly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
            Cadence::Yearly => "yearly",
            Cadence::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CadenceMatch {
    pub cadence: Cadence,
    /// Score of the best candidate in `[0, 1]`, reported even when below the threshold.
    pub confidence: f64,
    pub median_gap_days: f64,
}

/// Median of the gaps; the two middle values are averaged for even lengths.
pub fn median_gap(gaps: &[i64]) -> Option<f64> {
    if gaps.is_empty() {
        return None;
    }
    let mut sorted = gaps.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    };
    Some(median)
}

/// `max(0, 1 - |median - target| / target)`
pub fn cadence_score(median_gap_days: f64, target_days: f64) -> f64 {
    (1.0 - (median_gap_days - target_days).abs() / target_days).max(0.0)
}

pub fn classify_median(median_gap_days: f64) -> CadenceMatch {
    let mut best = Cadence::Unknown;
    let mut best_score = 0.0;
    for (cadence, target) in Cadence::CANDIDATES {
        let score = cadence_score(median_gap_days, target);
        // Strictly greater keeps the earlier candidate on exact ties.
        if score > best_score {
            best = cadence;
            best_score = score;
        }
    }

    CadenceMatch {
        cadence: if best_score >= MIN_CADENCE_SCORE {
            best
        } else {
            Cadence::Unknown
        },
        confidence: best_score,
        median_gap_days,
    }
}

/// Classifies chronologically ordered day-gaps between consecutive charges.
pub fn classify_gaps(gaps: &[i64]) -> CadenceMatch {
    match median_gap(gaps) {
        Some(median) => classify_median(median),
        None => CadenceMatch {
            cadence: Cadence::Unknown,
            confidence: 0.0,
            median_gap_days: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_gaps_score_perfectly() {
        let m = classify_gaps(&[30, 31, 29]);
        assert_eq!(m.median_gap_days, 30.0);
        assert_eq!(m.cadence, Cadence::Monthly);
        assert!((m.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ten_day_gaps_are_unknown() {
        let m = classify_gaps(&[10, 11, 9]);
        assert_eq!(m.median_gap_days, 10.0);
        assert_eq!(m.cadence, Cadence::Unknown);
        assert!(m.confidence < MIN_CADENCE_SCORE);
        // weekly alone would be 1 - 3/7
        assert!((cadence_score(10.0, 7.0) - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn even_length_median_averages_middle_values() {
        assert_eq!(median_gap(&[7, 30, 14, 28]), Some(21.0));
        assert_eq!(median_gap(&[]), None);
    }

    #[test]
    fn noisy_weekly_and_quarterly_gaps() {
        assert_eq!(classify_gaps(&[7, 6, 8, 7, 9]).cadence, Cadence::Weekly);
        assert_eq!(classify_gaps(&[14, 15]).cadence, Cadence::Biweekly);
        assert_eq!(classify_gaps(&[91, 92, 89]).cadence, Cadence::Quarterly);
        assert_eq!(classify_gaps(&[365, 366]).cadence, Cadence::Yearly);
    }

    #[test]
    fn threshold_is_inclusive() {
        // 30 * 1.25 = 37.5 -> monthly score exactly 0.75
        let m = classify_median(37.5);
        assert_eq!(m.cadence, Cadence::Monthly);
        assert!((m.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_gaps_are_unknown() {
        let m = classify_gaps(&[]);
        assert_eq!(m.cadence, Cadence::Unknown);
        assert_eq!(m.confidence, 0.0);
    }
}
