//! Per-job status extraction and the per-group verdict.
//!
//! - [`color`]: color tokens as reported by the build server
//! - [`extract`]: reading one job's artifacts into a [`JobSnapshot`]
//! - [`group`]: folding snapshots into a [`GroupStatus`]

pub mod color;
pub mod extract;
pub mod group;

pub use color::JobColor;
pub use extract::JobSnapshot;
pub use group::GroupStatus;
