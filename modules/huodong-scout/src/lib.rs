pub mod classify;
pub mod config;
pub mod error;
pub mod extractor;
pub mod renderer;
pub mod scout;
pub mod snapshot;
pub mod tags;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod timing;
pub mod types;

pub use config::{Config, ExtractorSettings, Region};
pub use error::{Result, ScoutError};
pub use types::{EnrichedActivity, RawCard, Snapshot, Status};
