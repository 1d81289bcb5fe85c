//! Remote Module
//!
//! Object-storage downloads and the scoped temp files they are parsed from.

mod fetcher;
mod temp;

pub use fetcher::{FetchOutcome, RemoteFetcher, CODE_PLACEHOLDER};
pub use temp::TempArtifact;
