//! Recovery artifact module
//!
//! When rows cannot be confirmed as stored, they are written to a local
//! delimited file so they can be re-ingested later. Two kinds exist:
//! - `remaining_<source>.csv` - rows that failed even row-by-row
//! - `failed_upload_<source>.csv` - written when the store became unreachable
//!
//! Files carry a header row, keep the original row order and values, and
//! are UTF-8 (with a BOM by default so spreadsheet tools detect the encoding).

mod writer;

pub use writer::{
    ArtifactKind, FailedUploadScope, RecoveryArtifact, RecoveryConfig, RecoveryWriter,
};
