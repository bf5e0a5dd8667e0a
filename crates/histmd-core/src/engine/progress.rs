/// Events emitted by long-running analyses.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Warning(String),
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a `PhaseStart` and a `PhaseFinish` event.
    ///
    /// `PhaseFinish` is only reported when `f` succeeds.
    pub fn phase<T, E>(
        &self,
        name: &'static str,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let out = f()?;
        self.report(Progress::PhaseFinish);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn phase_brackets_successful_work() {
        let events = Mutex::new(Vec::new());
        let reporter =
            ProgressReporter::with_callback(Box::new(|e: Progress| events.lock().unwrap().push(e)));

        let value: Result<u32, ()> = reporter.phase("VACF", || Ok(7));
        assert_eq!(value, Ok(7));

        let failed: Result<u32, &str> = reporter.phase("PDOS", || Err("boom"));
        assert!(failed.is_err());

        drop(reporter);
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::PhaseStart { name: "VACF" },
                Progress::PhaseFinish,
                Progress::PhaseStart { name: "PDOS" },
            ]
        );
    }
}
