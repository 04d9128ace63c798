//! Remote existence check: raw id in, canonical id out.
//!
//! Implementations talk to the metadata service. Absence and lookup failure
//! are both "not found" to the caller; [`NotFoundReason`] keeps them apart
//! for logs only.

use std::fmt;

use podsb_core::{BoxFuture, CanonicalAssetId, RawAssetId};

/// Resolves a syntactically valid id to the id the remote service uses.
pub trait ExistenceChecker: Send + Sync {
    fn resolve<'a>(
        &'a self,
        id: &'a RawAssetId,
    ) -> BoxFuture<'a, Result<CanonicalAssetId, NotFoundError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The service answered with zero matches.
    NoMatch,
    /// The lookup itself failed (network, auth, quota, bad response).
    LookupFailed(String),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => f.write_str("no matching asset"),
            Self::LookupFailed(reason) => write!(f, "lookup failed: {reason}"),
        }
    }
}

/// The id could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("asset {id} could not be resolved: {reason}")]
pub struct NotFoundError {
    pub id: String,
    pub reason: NotFoundReason,
}

impl NotFoundError {
    pub fn no_match(id: &RawAssetId) -> Self {
        Self {
            id: id.to_string(),
            reason: NotFoundReason::NoMatch,
        }
    }

    pub fn lookup_failed(id: &RawAssetId, reason: impl fmt::Display) -> Self {
        Self {
            id: id.to_string(),
            reason: NotFoundReason::LookupFailed(reason.to_string()),
        }
    }
}
