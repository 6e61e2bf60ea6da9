//! Resolver engine for images published on the Open Build Service.
//!
//! The pipeline for one run is:
//!
//! ```text
//! listing ──▶ selector ──▶ poller (optional) ──▶ download ──▶ verify ──▶ persist
//!                              │
//!                              └──▶ manifest ──▶ filter
//! ```
//!
//! Every outward effect goes through a seam so the engine can be tested
//! without a network or a real clock: [`Fetch`] for HTTP, [`Clock`] for the
//! poller's waits, [`Reporter`] for progress and [`InputProvider`] for
//! interactively built lists.

pub mod error;
pub mod fetch;
pub mod filter;
pub mod input;
pub mod listing;
pub mod manifest;
pub mod persist;
pub mod poller;
pub mod reporter;
pub mod resolver;
pub mod selector;
pub mod verify;

pub use error::ResolveError;
pub use fetch::{Fetch, HttpFetcher};
pub use input::{InputProvider, StaticInput};
pub use persist::StagedFile;
pub use poller::{Clock, ConditionPoller, Snapshot, SystemClock};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{ImageResolver, RETRY_INTERVAL, ResolverConfig};
pub use verify::{ChecksumAlgorithm, DigestWriter, IntegrityVerifier, Verification};

/// User Agent string for requests to the build service
pub const USER_AGENT: &str = concat!("obsimg-core/", env!("CARGO_PKG_VERSION"));
