use crate::compiler::grammar::{Grammar, TextCues};
use crate::domain::envelope::ConversationContext;
use crate::domain::query::{
    param, Params, Preset, QueryDraft, QuerySpec, TimeRangeSpec, TimeUnit, DEFAULT_LIMIT,
    YTD_LIMIT_CAP,
};
use serde::Serialize;

/// A correction applied while turning a draft into a canonical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Repair {
    InjectedSelectedTransaction,
    ForcedYearToDate,
    CoercedMonthPreset,
    LastMonthFromThirtyDays,
    ClearedLimitOnly,
    AppliedLimitOnly,
    DroppedTimeRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub spec: QuerySpec,
    pub repairs: Vec<Repair>,
}

/// Validates a draft from either path and repairs the extraction mistakes we know about.
///
/// Running it on `spec.to_draft()` of its own output, with the same text and context,
/// returns the same spec.
pub fn normalize(
    grammar: &Grammar,
    draft: &QueryDraft,
    message: &str,
    context: Option<&ConversationContext>,
) -> anyhow::Result<Normalized> {
    let cues = grammar.cues(message);
    let mut repairs = Vec::new();

    let mixed_mode = draft
        .time_range
        .as_ref()
        .is_some_and(|tr| tr.is_mixed_mode());
    let window = draft.time_range.clone().map(|tr| tr.into_spec()).transpose()?;
    if mixed_mode {
        repairs.push(Repair::CoercedMonthPreset);
    }

    let mut spec = QuerySpec {
        is_banking_domain: draft.is_banking_domain,
        intent: draft.intent,
        time_range: window,
        params: draft.params.clone(),
    };

    spec = inject_selected_transaction(spec, context, &mut repairs);
    if spec.intent.is_windowed() {
        spec = force_year_to_date(spec, &cues, &mut repairs);
        spec = last_month_from_thirty_days(spec, &cues, &mut repairs);
        spec = reconcile_limit_only(spec, &cues, &mut repairs);
    } else if spec.time_range.is_some() {
        repairs.push(Repair::DroppedTimeRange);
        spec = spec.with_time_range(None);
    }

    spec.validate()?;
    Ok(Normalized { spec, repairs })
}

fn inject_selected_transaction(
    spec: QuerySpec,
    context: Option<&ConversationContext>,
    repairs: &mut Vec<Repair>,
) -> QuerySpec {
    if spec.intent.is_windowed() {
        return spec;
    }
    let Some(selected) = context.and_then(|c| c.selected()) else {
        return spec;
    };
    if spec.params.transaction_id() == Some(selected) {
        return spec;
    }
    repairs.push(Repair::InjectedSelectedTransaction);
    let params = spec.params.clone().with(param::TRANSACTION_ID, selected);
    spec.with_params(params)
}

// A full-year report must not be truncated or reinterpreted as a count query.
fn force_year_to_date(spec: QuerySpec, cues: &TextCues, repairs: &mut Vec<Repair>) -> QuerySpec {
    if !cues.ytd {
        return spec;
    }
    let ytd = TimeRangeSpec::preset(Preset::Ytd);
    let params = spec
        .params
        .clone()
        .without(param::LIMIT_ONLY)
        .with(param::LIMIT, YTD_LIMIT_CAP);
    if spec.time_range == Some(ytd) && params == spec.params {
        return spec;
    }
    repairs.push(Repair::ForcedYearToDate);
    spec.with_time_range(Some(ytd)).with_params(params)
}

// Oracles tend to read "last month" as the trailing 30 days.
fn last_month_from_thirty_days(
    spec: QuerySpec,
    cues: &TextCues,
    repairs: &mut Vec<Repair>,
) -> QuerySpec {
    let thirty_days = spec
        .time_range
        .is_some_and(|tr| tr.is_relative(30, TimeUnit::Days));
    if !(cues.last_month && thirty_days) {
        return spec;
    }
    repairs.push(Repair::LastMonthFromThirtyDays);
    spec.with_time_range(Some(TimeRangeSpec::preset(Preset::LastMonth)))
}

// An explicit time phrase outranks a count-only reading; otherwise a count-only reading
// drops the window and carries the requested row count.
fn reconcile_limit_only(spec: QuerySpec, cues: &TextCues, repairs: &mut Vec<Repair>) -> QuerySpec {
    let limit_only = spec.params.limit_only();

    if let (Some(phrase), true) = (cues.time_phrase, limit_only) {
        repairs.push(Repair::ClearedLimitOnly);
        let window = spec.time_range.or(Some(phrase));
        let params = spec.params.clone().without(param::LIMIT_ONLY);
        return spec.with_time_range(window).with_params(params);
    }

    let count_only = cues.count.is_some() && cues.time_phrase.is_none();
    if !(limit_only || count_only) {
        return spec;
    }

    let limit = match cues.count {
        Some(cue) => cue.limit(),
        None => spec.params.limit().unwrap_or(DEFAULT_LIMIT),
    };
    let params: Params = spec
        .params
        .clone()
        .with(param::LIMIT_ONLY, true)
        .with(param::LIMIT, limit);
    if spec.time_range.is_none() && params == spec.params {
        return spec;
    }
    repairs.push(Repair::AppliedLimitOnly);
    spec.with_time_range(None).with_params(params)
}
