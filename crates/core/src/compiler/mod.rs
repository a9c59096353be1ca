pub mod error;
pub mod grammar;
pub mod normalize;
pub mod rules;

use crate::compiler::error::CompileFailure;
use crate::compiler::grammar::Grammar;
use crate::compiler::normalize::{normalize, Normalized, Repair};
use crate::domain::envelope::ConversationContext;
use crate::domain::query::QuerySpec;
use crate::llm::error::OracleDiagnosticsError;
use crate::llm::{json, prompt, Oracle};
use serde::Serialize;
use std::sync::Arc;

/// Which path produced a compiled query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilePath {
    Oracle,
    Rules,
    SafeDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    pub spec: QuerySpec,
    pub path: CompilePath,
    pub repairs: Vec<Repair>,
}

/// Oracle first, rules second, both through the normalizer.
pub struct QueryCompiler {
    oracle: Option<Arc<dyn Oracle>>,
    grammar: Grammar,
    instructions: String,
}

impl QueryCompiler {
    pub fn new(oracle: Option<Arc<dyn Oracle>>) -> anyhow::Result<Self> {
        Ok(Self {
            oracle,
            grammar: Grammar::new()?,
            instructions: prompt::query_instructions(),
        })
    }

    /// Never fails: anything that goes wrong ends in [`QuerySpec::safe_default`].
    pub async fn compile(&self, message: &str, context: Option<&ConversationContext>) -> QuerySpec {
        self.compile_traced(message, context).await.spec
    }

    pub async fn compile_traced(
        &self,
        message: &str,
        context: Option<&ConversationContext>,
    ) -> Compilation {
        match self.oracle_path(message, context).await {
            Ok(normalized) => return finish(normalized, CompilePath::Oracle),
            Err(CompileFailure::OracleUnavailable) => {}
            Err(failure) => {
                if let CompileFailure::Oracle(err) = &failure {
                    if let Some(diag) = err.downcast_ref::<OracleDiagnosticsError>() {
                        tracing::debug!(
                            provider = ?diag.provider,
                            stage = diag.stage,
                            raw_output = diag.raw_output.as_deref(),
                            "oracle diagnostics"
                        );
                    }
                }
                tracing::warn!(kind = failure.kind(), error = %failure, "oracle path failed; using rules");
            }
        }
        self.compile_rules(message, context)
    }

    /// Rule path only. Identical to what [`Self::compile_traced`] returns when the oracle fails.
    pub fn compile_rules(&self, message: &str, context: Option<&ConversationContext>) -> Compilation {
        match self.rules_path(message, context) {
            Ok(normalized) => finish(normalized, CompilePath::Rules),
            Err(failure) => {
                tracing::error!(kind = failure.kind(), error = %failure, "rule path failed; using safe default");
                Compilation {
                    spec: QuerySpec::safe_default(),
                    path: CompilePath::SafeDefault,
                    repairs: Vec::new(),
                }
            }
        }
    }

    async fn oracle_path(
        &self,
        message: &str,
        context: Option<&ConversationContext>,
    ) -> Result<Normalized, CompileFailure> {
        let oracle = self.oracle.as_ref().ok_or(CompileFailure::OracleUnavailable)?;
        let raw = oracle
            .submit(&self.instructions, message)
            .await
            .map_err(CompileFailure::Oracle)?;
        let reply = json::parse_reply(&raw).map_err(CompileFailure::Oracle)?;
        let draft = reply
            .validate_and_into_draft()
            .map_err(CompileFailure::Validation)?;
        normalize(&self.grammar, &draft, message, context).map_err(CompileFailure::Validation)
    }

    fn rules_path(
        &self,
        message: &str,
        context: Option<&ConversationContext>,
    ) -> Result<Normalized, CompileFailure> {
        let draft = rules::compile_rules(&self.grammar, message, context);
        normalize(&self.grammar, &draft, message, context).map_err(CompileFailure::Validation)
    }
}

fn finish(normalized: Normalized, path: CompilePath) -> Compilation {
    let Normalized { spec, repairs } = normalized;
    tracing::info!(
        ?path,
        intent = spec.intent.as_str(),
        ?repairs,
        "compiled query"
    );
    Compilation { spec, path, repairs }
}
