/// Instruction text sent with every oracle request. Keep it in step with
/// [`crate::domain::contract::LlmQueryReply`].
pub fn query_instructions() -> String {
    [
        "You classify questions a customer asks about their own bank account.",
        "Return ONLY valid JSON. Do not wrap in markdown. No prose, no comments, no trailing commas.",
        "Output schema:",
        "{",
        "  \"is_banking_domain\": true | false | null,",
        "  \"query\": {",
        "    \"intent\": \"top_spending_ytd\" | \"transactions_list\" | \"recurring_payments\" | \"unrecognized_transaction\",",
        "    \"time_range\": {",
        "      \"mode\": \"preset\" | \"relative\" | \"custom\",",
        "      \"preset\": \"ytd\" | \"this_month\" | \"last_month\" | null,",
        "      \"last\": null,",
        "      \"unit\": \"days\" | \"weeks\" | \"months\" | \"years\" | null,",
        "      \"start\": \"YYYY-MM-DD\" | null,",
        "      \"end\": \"YYYY-MM-DD\" | null",
        "    } | null,",
        "    \"params\": {}",
        "  }",
        "}",
        "Banking flag:",
        "- true for anything about spending, transactions, payments, subscriptions, bills, charges or disputes",
        "- false for unrelated topics such as weather, sports, news or greetings",
        "- null for gibberish",
        "Intents:",
        "- unrecognized_transaction: the user does not recognize or wants to dispute a charge; time_range=null; params.transaction_id only if an id like t016 appears",
        "- recurring_payments: subscriptions, recurring payments or bills; default relative 3 months; params.min_occurrences=3",
        "- top_spending_ytd: top/biggest/most spending this year; preset ytd; params.top_k=5",
        "- transactions_list: everything else; default relative 30 days; params.limit=50 or the number asked for",
        "Time ranges:",
        "- \"this year\" / \"ytd\" => preset ytd",
        "- \"this month\" => preset this_month",
        "- \"last month\" => preset last_month (never relative 30 days)",
        "- \"last N days/weeks/months/years\" => relative, last=N, unit as written",
        "Counts:",
        "- a number of transactions with no time window (\"last 10 transactions\") => time_range=null, params.limit=N, params.limit_only=true",
        "- a number of transactions with a time window => keep the window, params.limit=N",
        "Output ONLY JSON.",
    ]
    .join("\n")
}
