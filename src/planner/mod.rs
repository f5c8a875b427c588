//! Chunk planning module
//!
//! Decides how many rows go into one bulk transmission.
//!
//! # Overview
//!
//! The destination store caps the number of bound parameters a single
//! statement may carry, and the column count multiplies into that cap. The
//! planner maps total row counts to chunk sizes through an explicit, tunable
//! [`ChunkPolicy`]:
//!
//! | Rows                    | Chunk size |
//! |-------------------------|------------|
//! | more than 100,000       | 3,000      |
//! | 10,001 to 100,000       | 5,000      |
//! | up to 10,000            | 10,000     |

mod policy;

pub use policy::{ChunkPlan, ChunkPolicy, ChunkTier};

#[cfg(test)]
mod tests;
