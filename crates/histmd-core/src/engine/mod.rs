//! # Engine Module
//!
//! The analysis layer: every operation that transforms a trajectory or derives
//! physical quantities from it.
//!
//! ## Architecture
//!
//! - **Derivation** ([`derive`]) - finite-difference velocities, kinetic temperature and pressure
//! - **Merging** ([`merge`]) - appending trajectories, with optional atom reordering
//! - **Resampling** ([`resample`]) - linear interpolation between consecutive frames
//! - **Spectral Analysis** ([`spectral`]) - velocity autocorrelation and phonon density of states
//! - **Thermodynamics** ([`thermo`]) - harmonic free energy, energy, heat capacity and entropy
//! - **Aggregation** ([`aggregate`], [`summary`]) - time averages and mean/deviation reports
//! - **Configuration** ([`config`]) - analysis parameters loadable from TOML
//! - **Progress Monitoring** ([`progress`]) - callbacks for long-running work
//! - **Error Handling** ([`error`]) - the engine error taxonomy
//!
//! Most operations are inherent methods of
//! [`Trajectory`](crate::core::models::trajectory::Trajectory), defined next to
//! the algorithm they expose. Operations that mutate a trajectory validate
//! their inputs first and leave it unchanged on error.

pub mod aggregate;
pub mod config;
pub mod derive;
pub mod error;
pub mod merge;
pub mod progress;
pub mod resample;
pub mod spectral;
pub mod summary;
pub mod thermo;
