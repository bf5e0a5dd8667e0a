use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Time index {index} is out of range for a trajectory of {ntime} frame(s)")]
    TimeOutOfRange { index: usize, ntime: usize },

    #[error("Invalid time range [{tbegin}, {tend}) for a trajectory of {ntime} frame(s)")]
    InvalidTimeRange {
        tbegin: usize,
        tend: usize,
        ntime: usize,
    },

    #[error("Atom {atom} has species index {typat}, but {nspecies} species are defined")]
    InvalidSpecies {
        atom: usize,
        typat: usize,
        nspecies: usize,
    },

    #[error("Frame field '{field}' has {found} values, expected {expected}")]
    InvalidFrame {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Trajectory does not carry molecular-dynamics fields")]
    MdFieldsUnavailable,

    #[error("Trajectory has no velocities")]
    VelocitiesUnavailable,
}
