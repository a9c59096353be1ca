use std::fmt;

/// Why a compilation path produced no query. Never escapes [`super::QueryCompiler::compile`].
#[derive(Debug)]
pub enum CompileFailure {
    /// No oracle is configured.
    OracleUnavailable,
    /// Transport error, timeout or an unparsable reply.
    Oracle(anyhow::Error),
    /// The draft violates the query contract.
    Validation(anyhow::Error),
}

impl CompileFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            CompileFailure::OracleUnavailable => "oracle_unavailable",
            CompileFailure::Oracle(_) => "oracle",
            CompileFailure::Validation(_) => "validation",
        }
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileFailure::OracleUnavailable => write!(f, "no oracle configured"),
            CompileFailure::Oracle(err) => write!(f, "oracle failure: {err:#}"),
            CompileFailure::Validation(err) => write!(f, "invalid query draft: {err:#}"),
        }
    }
}

impl std::error::Error for CompileFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileFailure::OracleUnavailable => None,
            CompileFailure::Oracle(err) | CompileFailure::Validation(err) => Some(err.as_ref()),
        }
    }
}
