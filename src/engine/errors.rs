use thiserror::Error;

/// Failures produced by a parsing backend.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to set parser language: {0}")]
    LanguageSet(String),

    #[error("parser produced no tree")]
    ParseFailed,

    #[error("unknown engine: {name}")]
    UnknownEngine { name: String },

    #[error("cannot derive a range for node kind: {kind}")]
    UnknownRangeKind { kind: String },
}
