//! # podsb-cache -- Media Acquisition Cache
//!
//! Turns a client-supplied asset id into a finished audio file on local disk,
//! running the external fetch+transform tool at most once per asset no matter
//! how many requests arrive for it at the same time.
//!
//! ## Components
//!
//! - [`store::CacheStore`]: `{data_root}/audio/{id}.m4a`; presence is a hit.
//! - [`lock::LockRegistry`]: one async mutex per canonical id, dropped when
//!   the last waiter leaves.
//! - [`fetch::FetchPipeline`]: the external tool; [`fetch::YtDlpPipeline`]
//!   stages output and renames it into place.
//! - [`cache::MediaCache`]: hit, or lock → recheck → fetch.
//! - [`service::AcquisitionService`]: validate → resolve → obtain.
//!
//! Collaborators are trait objects ([`resolve::ExistenceChecker`],
//! [`fetch::FetchPipeline`]) so tests can swap in fakes.

pub mod cache;
pub mod fetch;
pub mod lock;
pub mod resolve;
pub mod service;
pub mod store;

pub use cache::{ArtifactOrigin, CacheStats, CacheStatsSnapshot, CachedArtifact, MediaCache};
pub use fetch::{FetchError, FetchPipeline, FetchToolConfig, YtDlpPipeline};
pub use lock::{KeyLock, LockRegistry};
pub use resolve::{ExistenceChecker, NotFoundError, NotFoundReason};
pub use service::{AcquireError, AcquisitionService};
pub use store::{CacheStore, StagingDir, StoreError};
