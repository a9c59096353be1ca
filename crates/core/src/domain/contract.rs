use crate::domain::query::{
    BankingDomain, Intent, Params, Preset, QueryDraft, TimeMode, TimeRangeDraft, TimeUnit,
};
use anyhow::{bail, ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query object as the oracle emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmQuery {
    pub intent: Intent,
    #[serde(default, alias = "is_banking")]
    pub is_banking_domain: Option<bool>,
    #[serde(default)]
    pub time_range: Option<LlmTimeRange>,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmTimeRange {
    #[serde(default)]
    pub mode: Option<TimeMode>,
    #[serde(default)]
    pub preset: Option<Preset>,
    #[serde(default)]
    pub last: Option<i64>,
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Full oracle reply. The query may be nested under `"query"` with the banking flag at the
/// top level, or emitted flat.
#[derive(Debug, Clone)]
pub struct LlmQueryReply {
    pub is_banking_domain: Option<bool>,
    pub query: LlmQuery,
}

impl LlmQueryReply {
    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        let obj = value
            .as_object()
            .context("oracle reply is not a JSON object")?;

        let top_level_flag = match obj.get("is_banking_domain").or_else(|| obj.get("is_banking")) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => bail!("is_banking_domain must be true, false or null (got {other})"),
        };

        let query_value = match obj.get("query") {
            Some(nested @ Value::Object(_)) => nested.clone(),
            _ => value.clone(),
        };
        let query = serde_json::from_value::<LlmQuery>(query_value)
            .context("oracle reply does not match the query schema")?;

        Ok(Self {
            is_banking_domain: top_level_flag.or(query.is_banking_domain),
            query,
        })
    }

    pub fn validate_and_into_draft(self) -> anyhow::Result<QueryDraft> {
        let time_range = match self.query.time_range {
            Some(tr) if !tr.is_blank() => Some(tr.validate_and_into_draft()?),
            _ => None,
        };

        let params = params_from_value(self.query.params)?;

        Ok(QueryDraft {
            is_banking_domain: BankingDomain::from(self.is_banking_domain),
            intent: self.query.intent,
            time_range,
            params,
        })
    }
}

impl LlmTimeRange {
    fn is_blank(&self) -> bool {
        self.mode.is_none()
            && self.preset.is_none()
            && self.last.is_none()
            && self.unit.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    fn validate_and_into_draft(self) -> anyhow::Result<TimeRangeDraft> {
        let last = match self.last {
            Some(n) => {
                ensure!(n > 0, "time_range.last must be positive (got {n})");
                Some(u32::try_from(n).with_context(|| format!("time_range.last too large: {n}"))?)
            }
            None => None,
        };

        let draft = TimeRangeDraft {
            mode: self.mode.unwrap_or_default(),
            preset: self.preset,
            last,
            unit: self.unit,
            start: parse_date("start", self.start.as_deref())?,
            end: parse_date("end", self.end.as_deref())?,
        };
        draft.validate()?;
        Ok(draft)
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("time_range.{field} is not a YYYY-MM-DD date: {raw}"))?;
    Ok(Some(date))
}

fn params_from_value(value: Value) -> anyhow::Result<Params> {
    match value {
        Value::Null => Ok(Params::new()),
        Value::Object(map) => Ok(Params::from_map(map)),
        // Some models JSON-encode the params object as a string.
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(Params::from_map(map)),
            _ if s.trim().is_empty() => Ok(Params::new()),
            _ => bail!("params string is not a JSON object: {s}"),
        },
        other => bail!("params must be an object (got {other})"),
    }
}
