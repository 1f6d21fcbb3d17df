//! Paginated collection of track metadata and audio features, and assembly of the
//! collected records into a filtered, popularity-ordered dataset.
#![deny(missing_docs)]

pub use popsift_catalog as pc;

mod error;
pub use error::{DatasetError, DatasetResult};

mod record;
pub use record::{Field, ReleaseDate, TrackId, TrackMetadata, TrackRecord};

mod columns;
pub use columns::Columns;

mod fetch;
pub use fetch::{
    Catalog, FetchConfig, FetchOutput, FetchProgress, FetchSummary, FetchWindow, RetryPolicy,
    WindowFailure, WindowReport, fetch_all, windows,
};

mod table;
pub use table::{FilterCriteria, MismatchPolicy, Table};

mod dataset;
pub use dataset::Dataset;

#[cfg(test)]
mod test_util;
