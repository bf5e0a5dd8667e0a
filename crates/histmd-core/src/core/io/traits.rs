use crate::core::models::error::ModelError;
use crate::core::models::frame::Frame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to start the loader thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("Loaded frame was rejected: {0}")]
    Frame(#[from] ModelError),

    #[error("Loader thread terminated abnormally")]
    Panicked,
}

/// A producer of frames, typically a trajectory file reader.
///
/// Implementations are moved to a dedicated thread by
/// [`Trajectory::spawn_loader`](crate::core::models::trajectory::Trajectory::spawn_loader),
/// hence the `Send + 'static` bound.
pub trait FrameSource: Send + 'static {
    /// Returns the next frame, or `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, LoadError>;
}

impl<I> FrameSource for I
where
    I: Iterator<Item = Frame> + Send + 'static,
{
    fn next_frame(&mut self) -> Result<Option<Frame>, LoadError> {
        Ok(self.next())
    }
}
