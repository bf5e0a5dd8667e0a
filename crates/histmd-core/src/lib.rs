//! # histmd
//!
//! Analysis of molecular-dynamics trajectories: frame storage, velocity
//! derivation, trajectory merging and resampling, vibrational spectra and
//! harmonic thermodynamics.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** The frame-oriented data model (`Trajectory`,
//!   `FieldStore`, `MdFields`), background frame ingestion, chemical reference
//!   data and unit conversions.
//!
//! - **[`engine`]: The Logic Core.** Derivation, merging, resampling, spectral
//!   analysis, thermodynamic integration and aggregation over a trajectory,
//!   with the error taxonomy and configuration they share.
//!
//! - **[`workflows`]: The Public API.** Complete analyses that chain engine
//!   operations, such as the phonon density of states and the resulting
//!   thermodynamic functions.

pub mod core;
pub mod engine;
pub mod workflows;
