use crate::domain::query::{Preset, QuerySpec, TimeRangeSpec};

/// `$1,234.56`. Negative values render as `-$1.00`.
pub fn money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Human wording for the window a query covers.
pub fn describe_range(spec: &QuerySpec) -> String {
    if spec.params.limit_only() {
        return "your most recent activity".to_string();
    }
    match spec.time_range {
        None => "recent history".to_string(),
        Some(TimeRangeSpec::Preset { preset }) => match preset {
            Preset::Ytd => "year-to-date".to_string(),
            Preset::ThisMonth => "this month".to_string(),
            Preset::LastMonth => "last month".to_string(),
        },
        Some(TimeRangeSpec::Relative { last, unit }) => format!("the last {last} {}", unit.as_str()),
        Some(TimeRangeSpec::Custom { start, end }) => format!("{start} to {end}"),
    }
}
