use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::num::NonZeroU32;

pub const DEFAULT_LIMIT: u64 = 50;
pub const SAFE_DEFAULT_LIMIT: u64 = 10;
pub const YTD_LIMIT_CAP: u64 = 1000;
pub const DEFAULT_TOP_K: u64 = 5;
pub const DEFAULT_MIN_OCCURRENCES: u64 = 3;

pub mod param {
    pub const LIMIT: &str = "limit";
    pub const LIMIT_ONLY: &str = "limit_only";
    pub const INCLUDE_PENDING: &str = "include_pending";
    pub const TOP_K: &str = "top_k";
    pub const MIN_OCCURRENCES: &str = "min_occurrences";
    pub const TRANSACTION_ID: &str = "transaction_id";
}

/// Tri-state banking flag. Serialized as `true` / `false` / `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum BankingDomain {
    Yes,
    No,
    #[default]
    Unknown,
}

impl BankingDomain {
    pub fn is_banking(self) -> bool {
        self == BankingDomain::Yes
    }
}

impl From<Option<bool>> for BankingDomain {
    fn from(v: Option<bool>) -> Self {
        match v {
            Some(true) => BankingDomain::Yes,
            Some(false) => BankingDomain::No,
            None => BankingDomain::Unknown,
        }
    }
}

impl From<BankingDomain> for Option<bool> {
    fn from(v: BankingDomain) -> Self {
        match v {
            BankingDomain::Yes => Some(true),
            BankingDomain::No => Some(false),
            BankingDomain::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    TopSpendingYtd,
    TransactionsList,
    RecurringPayments,
    UnrecognizedTransaction,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::TopSpendingYtd => "top_spending_ytd",
            Intent::TransactionsList => "transactions_list",
            Intent::RecurringPayments => "recurring_payments",
            Intent::UnrecognizedTransaction => "unrecognized_transaction",
        }
    }

    /// Whether answering this intent reads a calendar window of transactions.
    pub fn is_windowed(self) -> bool {
        !matches!(self, Intent::UnrecognizedTransaction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Ytd,
    ThisMonth,
    LastMonth,
}

impl Preset {
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Ytd => "ytd",
            Preset::ThisMonth => "this_month",
            Preset::LastMonth => "last_month",
        }
    }

    fn is_calendar_month(self) -> bool {
        matches!(self, Preset::ThisMonth | Preset::LastMonth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    /// Day multiplier. Months and years are fixed approximations.
    pub fn days(self) -> u64 {
        match self {
            TimeUnit::Days => 1,
            TimeUnit::Weeks => 7,
            TimeUnit::Months => 30,
            TimeUnit::Years => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "day" | "days" => Some(TimeUnit::Days),
            "week" | "weeks" => Some(TimeUnit::Weeks),
            "month" | "months" => Some(TimeUnit::Months),
            "year" | "years" => Some(TimeUnit::Years),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    Preset,
    #[default]
    Relative,
    Custom,
}

/// Abstract time range. Each variant carries exactly the fields its mode needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeRangeSpec {
    Preset { preset: Preset },
    Relative { last: NonZeroU32, unit: TimeUnit },
    Custom { start: NaiveDate, end: NaiveDate },
}

impl TimeRangeSpec {
    pub fn preset(preset: Preset) -> Self {
        TimeRangeSpec::Preset { preset }
    }

    pub fn relative(last: u32, unit: TimeUnit) -> anyhow::Result<Self> {
        let last = NonZeroU32::new(last).context("relative time range needs a positive count")?;
        Ok(TimeRangeSpec::Relative { last, unit })
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        ensure!(
            start <= end,
            "custom time range end {end} is before start {start}"
        );
        Ok(TimeRangeSpec::Custom { start, end })
    }

    pub fn trailing_days(days: u32) -> Self {
        TimeRangeSpec::Relative {
            last: NonZeroU32::new(days).unwrap_or(NonZeroU32::MIN),
            unit: TimeUnit::Days,
        }
    }

    pub fn trailing_months(months: u32) -> Self {
        TimeRangeSpec::Relative {
            last: NonZeroU32::new(months).unwrap_or(NonZeroU32::MIN),
            unit: TimeUnit::Months,
        }
    }

    pub fn is_relative(&self, last: u32, unit: TimeUnit) -> bool {
        matches!(self, TimeRangeSpec::Relative { last: l, unit: u } if l.get() == last && *u == unit)
    }
}

/// Loose time range as proposed by either compilation path. Mixed-mode shapes such as
/// `mode=relative` with `preset=last_month` are representable here and repaired on the
/// way into a [`TimeRangeSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRangeDraft {
    #[serde(default)]
    pub mode: TimeMode,
    #[serde(default)]
    pub preset: Option<Preset>,
    #[serde(default)]
    pub last: Option<u32>,
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl TimeRangeDraft {
    /// A calendar-month preset alongside any other mode or relative fields.
    pub fn is_mixed_mode(&self) -> bool {
        match self.preset {
            Some(p) if p.is_calendar_month() => {
                self.mode != TimeMode::Preset || self.last.is_some() || self.unit.is_some()
            }
            _ => false,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.clone().into_spec().map(drop)
    }

    pub fn into_spec(self) -> anyhow::Result<TimeRangeSpec> {
        // this_month / last_month win over whatever mode was declared.
        if let Some(preset) = self.preset.filter(|p| p.is_calendar_month()) {
            return Ok(TimeRangeSpec::preset(preset));
        }

        match self.mode {
            TimeMode::Preset => {
                let preset = self.preset.context("preset is required when mode=preset")?;
                Ok(TimeRangeSpec::preset(preset))
            }
            TimeMode::Relative => {
                let last = self.last.context("last is required when mode=relative")?;
                let unit = self.unit.context("unit is required when mode=relative")?;
                TimeRangeSpec::relative(last, unit)
            }
            TimeMode::Custom => {
                let start = self.start.context("start is required when mode=custom")?;
                let end = self.end.context("end is required when mode=custom")?;
                TimeRangeSpec::custom(start, end)
            }
        }
    }
}

impl From<&TimeRangeSpec> for TimeRangeDraft {
    fn from(spec: &TimeRangeSpec) -> Self {
        match *spec {
            TimeRangeSpec::Preset { preset } => TimeRangeDraft {
                mode: TimeMode::Preset,
                preset: Some(preset),
                ..Default::default()
            },
            TimeRangeSpec::Relative { last, unit } => TimeRangeDraft {
                mode: TimeMode::Relative,
                last: Some(last.get()),
                unit: Some(unit),
                ..Default::default()
            },
            TimeRangeSpec::Custom { start, end } => TimeRangeDraft {
                mode: TimeMode::Custom,
                start: Some(start),
                end: Some(end),
                ..Default::default()
            },
        }
    }
}

/// Open parameter map with lenient typed accessors for the well-known keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Non-negative integer, accepting integral floats and numeric strings.
    pub fn count(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn limit(&self) -> Option<u64> {
        self.count(param::LIMIT)
    }

    pub fn limit_only(&self) -> bool {
        self.flag(param::LIMIT_ONLY).unwrap_or(false)
    }

    pub fn include_pending(&self) -> bool {
        self.flag(param::INCLUDE_PENDING).unwrap_or(true)
    }

    pub fn top_k(&self) -> u64 {
        self.count(param::TOP_K).unwrap_or(DEFAULT_TOP_K)
    }

    pub fn min_occurrences(&self) -> u64 {
        self.count(param::MIN_OCCURRENCES)
            .unwrap_or(DEFAULT_MIN_OCCURRENCES)
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.string(param::TRANSACTION_ID)
    }
}

/// Unvalidated interpretation of a request, from the oracle or the rule path.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDraft {
    pub is_banking_domain: BankingDomain,
    pub intent: Intent,
    pub time_range: Option<TimeRangeDraft>,
    pub params: Params,
}

/// Canonical structured query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    pub is_banking_domain: BankingDomain,
    pub intent: Intent,
    pub time_range: Option<TimeRangeSpec>,
    pub params: Params,
}

impl QuerySpec {
    #[cfg(test)]
    pub fn new(
        is_banking_domain: BankingDomain,
        intent: Intent,
        time_range: Option<TimeRangeSpec>,
        params: Params,
    ) -> anyhow::Result<Self> {
        let spec = Self {
            is_banking_domain,
            intent,
            time_range,
            params,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Returned when compilation fails outright: trailing 30 days, small page.
    pub fn safe_default() -> Self {
        Self {
            is_banking_domain: BankingDomain::Yes,
            intent: Intent::TransactionsList,
            time_range: Some(TimeRangeSpec::trailing_days(30)),
            params: Params::new()
                .with(param::LIMIT, SAFE_DEFAULT_LIMIT)
                .with(param::INCLUDE_PENDING, true),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !(self.intent == Intent::UnrecognizedTransaction && self.time_range.is_some()),
            "unrecognized_transaction must not carry a time range"
        );
        if self.params.limit_only() {
            ensure!(
                self.time_range.is_none(),
                "limit-only queries must not carry a time range"
            );
        }
        if let Some(TimeRangeSpec::Custom { start, end }) = self.time_range {
            ensure!(start <= end, "custom time range end {end} is before start {start}");
        }
        Ok(())
    }

    pub fn to_draft(&self) -> QueryDraft {
        QueryDraft {
            is_banking_domain: self.is_banking_domain,
            intent: self.intent,
            time_range: self.time_range.as_ref().map(TimeRangeDraft::from),
            params: self.params.clone(),
        }
    }

    pub fn with_time_range(self, time_range: Option<TimeRangeSpec>) -> Self {
        Self { time_range, ..self }
    }

    pub fn with_params(self, params: Params) -> Self {
        Self { params, ..self }
    }
}
