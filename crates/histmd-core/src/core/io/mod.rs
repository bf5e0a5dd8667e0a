//! Frame ingestion.
//!
//! File formats live outside this crate; readers hand frames over through the
//! [`FrameSource`] trait, either in bulk or from a background loader thread owned
//! by the trajectory.

pub(crate) mod loader;
pub mod traits;

pub use traits::{FrameSource, LoadError};
