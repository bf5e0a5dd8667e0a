use super::merge::MatchError;
use crate::core::io::traits::LoadError;
use crate::core::models::error::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Atom count mismatch: expected {expected} atoms, found {found}")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("Species mismatch: {0}")]
    SpeciesMismatch(String),

    #[error("No reference mass for atomic number {0}")]
    UnknownSpecies(u32),

    #[error("Spectral transform backend is not available in this build: {0}")]
    BackendUnavailable(&'static str),

    #[error("Unable to map structures: {source}")]
    Matching {
        #[from]
        source: MatchError,
    },

    #[error("Frame loading failed: {source}")]
    Load {
        #[from]
        source: LoadError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Wraps the error with one more level of context, keeping it as the source.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, below every [`EngineError::Context`] layer.
    pub fn root_cause(&self) -> &EngineError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_layers_preserve_the_original_cause() {
        let err = EngineError::from(ModelError::VelocitiesUnavailable)
            .context("VACF calculation failed")
            .context("Unable to compute thermodynamic functions");

        assert_eq!(
            err.to_string(),
            "Unable to compute thermodynamic functions: VACF calculation failed: Trajectory has no velocities"
        );
        assert!(matches!(
            err.root_cause(),
            EngineError::Model(ModelError::VelocitiesUnavailable)
        ));
    }

    #[test]
    fn matching_failure_converts_with_message() {
        let err = EngineError::from(MatchError::NoMatch("atom 3".to_string()));
        assert_eq!(
            err.to_string(),
            "Unable to map structures: No structural match: atom 3"
        );
    }
}
