//! Error types for tree synchronization

use thiserror::Error;

use crate::Op;

/// Errors raised while sending or receiving a unit.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No codec is registered for a node or marker kind. Scoped to the unit
    /// being sent; the rest of a batch of units still completes.
    #[error("no codec registered for `{0}`")]
    UnknownNodeKind(Box<str>),

    /// A decode was requested against a cached value of another kind.
    #[error("cannot decode `{expected}` against a cached `{found}`")]
    ShapeMismatch { expected: Box<str>, found: Box<str> },

    /// Sender and receiver no longer agree on the position in the stream.
    #[error("synchronization lost: {reason}{}", sent_from(.site))]
    Desync { reason: Desync, site: Option<Box<str>> },

    /// Two decodes of the same node id or type signature in one session
    /// produced different objects.
    #[error("`{0}` was decoded to two distinct objects")]
    IdentityViolation(Box<str>),

    #[error("malformed batch: {0}")]
    Wire(#[from] postcard::Error),
}

impl SyncError {
    /// Whether the error leaves the session unusable. Session-fatal errors
    /// require a fresh session and a full, non-diffed resend.
    pub fn is_session_fatal(&self) -> bool {
        !matches!(self, Self::UnknownNodeKind(_))
    }

    pub(crate) fn shape_mismatch(expected: &str, found: &str) -> Self {
        Self::ShapeMismatch { expected: expected.into(), found: found.into() }
    }
}

impl From<Desync> for SyncError {
    fn from(reason: Desync) -> Self {
        Self::Desync { reason, site: None }
    }
}

fn sent_from(site: &Option<Box<str>>) -> String {
    site.as_deref().map(|site| format!(" (sent from {site})")).unwrap_or_default()
}

/// Why a receiver lost positional agreement with its sender.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Desync {
    #[error("operation stream ended while expecting {expected}")]
    Exhausted { expected: &'static str },

    #[error("`unchanged` received for an attribute with no cached value")]
    UnchangedWithoutBaseline,

    #[error("`changed` received for an attribute with no cached value")]
    ChangedWithoutBaseline,

    #[error("expected {expected}, found `{found}`")]
    UnexpectedOp { expected: &'static str, found: Op },

    #[error("list edit refers to cached element {index} of {len}")]
    ListOutOfBounds { index: usize, len: usize },

    #[error("reference to undefined type #{0}")]
    UnknownTypeRef(u32),

    #[error("type #{found} defined out of order, expected #{expected}")]
    TypeDefOutOfOrder { expected: u32, found: u32 },

    #[error("type `{expected}` defined again as `{found}`")]
    TypeSignatureMismatch { expected: Box<str>, found: Box<str> },

    #[error("invalid {what} discriminant {value}")]
    InvalidDiscriminant { what: &'static str, value: i64 },

    #[error("`{found}` where the unit should have ended")]
    TrailingOps { found: Op },

    #[error("unit announced root {expected} but decoded {found}")]
    RootMismatch { expected: Box<str>, found: Box<str> },
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
