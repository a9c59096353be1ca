use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerchat_core::compiler::QueryCompiler;
use ledgerchat_core::config::Settings;
use ledgerchat_core::domain::envelope::{ChatRequest, ConversationContext};
use ledgerchat_core::orchestrator::Orchestrator;
use ledgerchat_core::source::http::HttpTransactionSource;
use ledgerchat_core::source::memory::InMemoryTransactionSource;
use ledgerchat_core::source::TransactionSource;

#[derive(Debug, Parser)]
#[command(name = "ledgerchat")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a question into a structured query and print it as JSON.
    Compile {
        #[arg(long)]
        message: String,

        #[arg(long)]
        selected_transaction_id: Option<String>,

        /// Skip the oracle and use the keyword rules only.
        #[arg(long)]
        offline: bool,
    },

    /// Answer a question end to end and print the response envelope.
    Ask {
        #[arg(long)]
        account_id: String,

        #[arg(long)]
        message: String,

        #[arg(long)]
        selected_transaction_id: Option<String>,

        /// JSON array of transactions to read instead of the tool API.
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD). Defaults to today's UTC date.
        #[arg(long)]
        today: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let result = run(args, &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run(args: Args, settings: &Settings) -> anyhow::Result<()> {
    match args.command {
        Command::Compile {
            message,
            selected_transaction_id,
            offline,
        } => {
            let compiler = build_compiler(settings, offline)?;
            let context = context(selected_transaction_id);
            let compilation = compiler.compile_traced(&message, context.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&compilation)?);
        }
        Command::Ask {
            account_id,
            message,
            selected_transaction_id,
            fixture,
            today,
        } => {
            let today = resolve_today(today.as_deref())?;
            let source: Arc<dyn TransactionSource> = match fixture {
                Some(path) => {
                    let source = InMemoryTransactionSource::from_file(&path)?;
                    tracing::info!(path = %path.display(), transactions = source.len(), "loaded fixture");
                    Arc::new(source)
                }
                None => Arc::new(HttpTransactionSource::new(&settings.source()?)?),
            };
            let orchestrator = Orchestrator::new(build_compiler(settings, false)?, source);

            let req = ChatRequest {
                account_id,
                message,
                context: context(selected_transaction_id),
            };
            let res = orchestrator.handle(&req, today).await?;
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
    }
    Ok(())
}

fn build_compiler(settings: &Settings, offline: bool) -> anyhow::Result<QueryCompiler> {
    let oracle = if offline {
        None
    } else {
        ledgerchat_core::llm::build_oracle(&settings.oracle()?)?
    };
    QueryCompiler::new(oracle)
}

fn context(selected_transaction_id: Option<String>) -> Option<ConversationContext> {
    selected_transaction_id.map(|id| ConversationContext {
        selected_transaction_id: Some(id),
    })
}

fn resolve_today(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --today (expected YYYY-MM-DD): {s}")),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_command() {
        let args = Args::try_parse_from([
            "ledgerchat",
            "ask",
            "--account-id",
            "A123",
            "--message",
            "show my subscriptions",
            "--fixture",
            "txs.json",
            "--today",
            "2024-06-15",
        ])
        .unwrap();
        let Command::Ask { account_id, fixture, today, .. } = args.command else {
            panic!("expected ask");
        };
        assert_eq!(account_id, "A123");
        assert_eq!(fixture, Some(PathBuf::from("txs.json")));
        assert_eq!(resolve_today(today.as_deref()).unwrap(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn rejects_bad_today() {
        assert!(resolve_today(Some("15/06/2024")).is_err());
    }

    #[test]
    fn compile_offline_flag() {
        let args = Args::try_parse_from(["ledgerchat", "compile", "--message", "hi", "--offline"]).unwrap();
        assert!(matches!(args.command, Command::Compile { offline: true, .. }));
    }
}
