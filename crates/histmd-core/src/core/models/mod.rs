//! # Core Models Module
//!
//! Data structures holding a molecular-dynamics trajectory.
//!
//! ## Key Components
//!
//! - [`frame`] - one time step as delivered by a reader
//! - [`store`] - base per-frame arrays (positions, cell, stress, time, energy)
//! - [`md`] - optional molecular-dynamics arrays (velocities, temperature, ...)
//! - [`trajectory`] - the owning container, its accessors and its loader
//!
//! ## Usage
//!
//! ```ignore
//! use histmd::core::models::{frame::Frame, trajectory::Trajectory};
//!
//! let mut traj = Trajectory::new(vec![14], vec![1, 1])?;
//! traj.append_frame(Frame::new(positions, rprimd, 0.0))?;
//! let v = traj.volume(0)?;
//! ```

pub mod error;
pub mod frame;
pub mod md;
pub mod store;
pub mod trajectory;
