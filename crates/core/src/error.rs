//! Error taxonomy
//!
//! Everything here is spec misuse: a domain whose declaration cannot
//! support the dialog it produces, or a policy invariant broken
//! mid-session. Both abort corpus generation; there is nothing sensible
//! to write. Session-local failures (a runaway conversation hitting the
//! safety cap) are not errors: the session is abandoned, recorded with a
//! failure reward, and the run continues.

use thiserror::Error;

/// Simulator errors. All variants are fatal to the running corpus.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no {kind} template for slot {slot}")]
    MissingTemplate { slot: String, kind: &'static str },

    #[error("unknown slot {0}")]
    UnknownSlot(String),

    #[error("policy invariant violated: {0}")]
    PolicyViolation(String),

    #[error("the system must speak first")]
    UserSpeaksFirst,

    #[error("user cannot handle {0}")]
    UnsupportedAct(&'static str),

    #[error("database query matched no rows")]
    EmptyQueryResult,

    #[error("domain spec error: {0}")]
    Domain(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
