use super::traits::{FrameSource, LoadError};
use crate::core::models::frame::Frame;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;

type Message = Result<Frame, LoadError>;

/// Background thread pulling frames from a [`FrameSource`].
///
/// The stop flag is raised and the thread joined whenever the handle is dropped,
/// so no frame is produced once the owning trajectory starts tearing down.
pub(crate) struct LoaderHandle {
    stop: Arc<AtomicBool>,
    receiver: Option<Receiver<Message>>,
    thread: Option<JoinHandle<()>>,
    exhausted: bool,
}

impl LoaderHandle {
    pub(crate) fn spawn<S: FrameSource>(mut source: S) -> Result<Self, LoadError> {
        let stop = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::sync_channel::<Message>(CHANNEL_CAPACITY);
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("histmd-loader".to_string())
            .spawn(move || {
                let mut sent = 0usize;
                while !thread_stop.load(Ordering::Acquire) {
                    match source.next_frame() {
                        Ok(Some(frame)) => {
                            if sender.send(Ok(frame)).is_err() {
                                break;
                            }
                            sent += 1;
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = sender.send(Err(e));
                            break;
                        }
                    }
                }
                debug!("Loader thread finished after {} frame(s).", sent);
            })
            .map_err(LoadError::Spawn)?;

        Ok(Self {
            stop,
            receiver: Some(receiver),
            thread: Some(thread),
            exhausted: false,
        })
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next frame if one is already available.
    pub(crate) fn try_next(&mut self) -> Option<Message> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Blocks until a frame arrives or the source is exhausted.
    pub(crate) fn next_blocking(&mut self) -> Option<Message> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(msg) => Some(msg),
            Err(_) => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Signals the thread, releases the channel and joins.
    pub(crate) fn shutdown(&mut self) -> Result<(), LoadError> {
        self.stop.store(true, Ordering::Release);
        drop(self.receiver.take());
        self.exhausted = true;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Loader thread panicked.");
                return Err(LoadError::Panicked);
            }
        }
        Ok(())
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderHandle")
            .field("running", &self.thread.is_some())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
