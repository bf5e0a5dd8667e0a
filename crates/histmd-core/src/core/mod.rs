//! # Core Module
//!
//! Stateless building blocks of the trajectory engine: the per-frame data model,
//! frame ingestion, read-only chemical reference data and unit conversions.
//!
//! ## Architecture
//!
//! - **Data Model** ([`models`]) - `Frame`, `FieldStore`, `MdFields` and `Trajectory`
//! - **Ingestion** ([`io`]) - the `FrameSource` trait and the background loader
//! - **Reference Data** ([`species`]) - atomic masses and symbols by atomic number
//! - **Units** ([`units`]) - physical constants and conversions from atomic units
//! - **Numerics** ([`utils`]) - cell geometry and simple statistics
//!
//! Everything stored in a trajectory is expressed in atomic units, except
//! temperatures (Kelvin) and pressures (GPa).

pub mod io;
pub mod models;
pub mod species;
pub mod units;
pub mod utils;
