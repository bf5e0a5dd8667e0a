//! # Workflows Module
//!
//! High-level analyses chaining several engine operations over a time window
//! of a trajectory.
//!
//! - **Phonon Workflow** ([`phonon`]) - VACF, PDOS and harmonic thermodynamics
//!   at the mean temperature, plus a temperature sweep of the thermodynamic
//!   functions.

pub mod phonon;
