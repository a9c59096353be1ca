use crate::compiler::grammar::{has_ytd_cue, CountCue, Grammar};
use crate::domain::envelope::ConversationContext;
use crate::domain::query::{
    param, BankingDomain, Intent, Params, Preset, QueryDraft, TimeRangeDraft, TimeRangeSpec,
    DEFAULT_LIMIT, DEFAULT_MIN_OCCURRENCES, DEFAULT_TOP_K,
};

const UNRECOGNIZED_PHRASES: [&str; 4] = [
    "don't recognize",
    "don\u{2019}t recognize",
    "dont recognize",
    "unrecognized",
];

const RANKING_WORDS: [&str; 3] = ["top", "biggest", "most"];

/// Keyword decision tree used when the oracle is unavailable or its reply is unusable.
/// Rules are tried in priority order and the first match wins.
pub fn compile_rules(
    grammar: &Grammar,
    message: &str,
    context: Option<&ConversationContext>,
) -> QueryDraft {
    let text = message.trim().to_lowercase();

    if is_unrecognized_charge(&text) {
        let transaction_id = grammar
            .transaction_id(&text)
            .or_else(|| context.and_then(|c| c.selected()).map(str::to_string));
        let params = match transaction_id {
            Some(id) => Params::new().with(param::TRANSACTION_ID, id),
            None => Params::new(),
        };
        return draft(Intent::UnrecognizedTransaction, None, params);
    }

    if text.contains("recurring") || text.contains("subscription") {
        let window = grammar
            .time_phrase(&text)
            .unwrap_or_else(|| TimeRangeSpec::trailing_months(3));
        return draft(
            Intent::RecurringPayments,
            Some(window),
            Params::new().with(param::MIN_OCCURRENCES, DEFAULT_MIN_OCCURRENCES),
        );
    }

    if RANKING_WORDS.iter().any(|w| text.contains(w))
        && text.contains("spend")
        && (text.contains("year") || has_ytd_cue(&text))
    {
        return draft(
            Intent::TopSpendingYtd,
            Some(TimeRangeSpec::preset(Preset::Ytd)),
            Params::new().with(param::TOP_K, DEFAULT_TOP_K),
        );
    }

    if text.contains("transaction") {
        let window = grammar.time_phrase(&text);
        let count = grammar.count(&text);
        let params = Params::new()
            .with(param::LIMIT, count.map_or(DEFAULT_LIMIT, CountCue::limit))
            .with(param::INCLUDE_PENDING, true);

        return match (window, count) {
            (Some(window), _) => draft(Intent::TransactionsList, Some(window), params),
            (None, Some(_)) => draft(
                Intent::TransactionsList,
                None,
                params.with(param::LIMIT_ONLY, true),
            ),
            (None, None) => draft(
                Intent::TransactionsList,
                Some(TimeRangeSpec::trailing_days(30)),
                params,
            ),
        };
    }

    draft(
        Intent::TransactionsList,
        Some(TimeRangeSpec::trailing_days(30)),
        Params::new()
            .with(param::LIMIT, DEFAULT_LIMIT)
            .with(param::INCLUDE_PENDING, true),
    )
}

fn is_unrecognized_charge(text: &str) -> bool {
    UNRECOGNIZED_PHRASES.iter().any(|p| text.contains(p))
        || (text.contains("what is this")
            && (text.contains("charge") || text.contains("transaction")))
}

fn draft(intent: Intent, window: Option<TimeRangeSpec>, params: Params) -> QueryDraft {
    QueryDraft {
        is_banking_domain: BankingDomain::Yes,
        intent,
        time_range: window.as_ref().map(TimeRangeDraft::from),
        params,
    }
}
