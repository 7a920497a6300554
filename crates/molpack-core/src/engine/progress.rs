//! Lightweight progress events emitted by long-running workflows.
//!
//! Callers that want live feedback (a CLI spinner, a GUI) register a
//! callback; the engine stays silent otherwise. Phases are the coarse
//! stages of a packing run (resolving molecules, sizing, packing,
//! reconciling); tasks count steps within a phase.

#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    StatusUpdate { text: String },
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_reporter_forwards_events_to_callback() {
        let seen: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                seen.lock().unwrap().push(name.to_string());
            }
        }));

        reporter.report(Progress::PhaseStart { name: "Packing" });
        reporter.report(Progress::PhaseFinish);
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec!["Packing".to_string()]);
    }

    #[test]
    fn test_silent_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("no listener".to_string()));
    }
}
