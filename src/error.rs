use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// Two curve points share no endpoint through which their
    /// parametrisations could be merged.
    #[error("curve points share no resolvable endpoint")]
    NoSharedEndpoint,
    #[error("curve point needs at least one endpoint consistent with t = {t}")]
    MissingEndpoints { t: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrokeError {
    #[error("resampling planned {planned} vertices, expected {target}")]
    ResampleMismatch { target: usize, planned: usize },
    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// Failure reported by a user supplied predicate, function or shader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{0}")]
    Failed(String),
    #[error("degenerate input: {0}")]
    Degenerate(&'static str),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Stroke(#[from] StrokeError),
}

impl EvalError {
    pub fn failed(msg: impl Into<String>) -> Self { EvalError::Failed(msg.into()) }
}

/// Which stage of an operator failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    #[error("predicate failed: {0}")]
    Predicate(#[source] EvalError),
    #[error("modifier failed: {0}")]
    Modifier(#[source] EvalError),
    #[error("function failed: {0}")]
    Function(#[source] EvalError),
    #[error("chaining traversal failed: {0}")]
    Traversal(#[source] EvalError),
    #[error(transparent)]
    Curve(#[from] CurveError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid shader configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parameter `{name}` out of range: {value}")]
    OutOfRange { name: &'static str, value: f64 },
}
