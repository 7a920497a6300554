use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use molpack::engine::progress::{Progress, ProgressCallback};
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Renders engine progress events as spinners and bars on stderr.
///
/// One bar is live at a time: a phase opens a spinner, a task within the
/// phase upgrades it to a counting bar, and finishing the phase replaces
/// it with a printed check mark. Durable messages go through the
/// [`MultiProgress`] so they land above the live bar instead of tearing
/// it.
pub struct CliProgressHandler {
    mp: MultiProgress,
    state: Mutex<BarState>,
}

#[derive(Default)]
struct BarState {
    active_bar: Option<ProgressBar>,
    base_message: String,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        Self {
            mp,
            state: Mutex::new(BarState::default()),
        }
    }

    /// Borrows this handler as an engine progress callback.
    pub fn callback(&self) -> ProgressCallback<'_> {
        Box::new(move |progress: Progress| self.handle(progress))
    }

    /// Clears any bar left live by an aborted run.
    pub fn finish(&self) {
        let Ok(mut state) = self.state.lock() else {
            warn!("Progress state mutex was poisoned. Cannot clear the bar.");
            return;
        };
        if let Some(bar) = state.active_bar.take() {
            bar.finish_and_clear();
        }
        state.base_message.clear();
    }

    fn handle(&self, progress: Progress) {
        let Ok(mut state) = self.state.lock() else {
            warn!("Progress state mutex was poisoned. Cannot update progress.");
            return;
        };
        match progress {
            Progress::PhaseStart { name } => {
                if let Some(bar) = state.active_bar.take() {
                    bar.finish_and_clear();
                }

                let pb = self.mp.add(ProgressBar::new_spinner());
                pb.enable_steady_tick(Duration::from_millis(80));
                pb.set_style(Self::spinner_style());
                pb.set_message(name);

                state.active_bar = Some(pb);
                state.base_message = name.to_string();
            }
            Progress::PhaseFinish => {
                if let Some(bar) = state.active_bar.take() {
                    bar.finish_and_clear();
                }

                let final_message = format!("✓ {}", state.base_message);
                self.mp.println(final_message).ok();

                state.base_message.clear();
            }
            Progress::TaskStart { total_steps } => {
                if let Some(bar) = state.active_bar.as_ref() {
                    bar.set_style(Self::bar_style());
                    bar.set_length(total_steps);
                    bar.set_position(0);
                    bar.disable_steady_tick();
                }
            }
            Progress::TaskIncrement => {
                if let Some(bar) = state.active_bar.as_ref() {
                    bar.inc(1);
                }
            }
            Progress::TaskFinish => {
                if let Some(bar) = state.active_bar.as_ref() {
                    bar.finish();
                }
            }
            Progress::StatusUpdate { text } => {
                if let Some(bar) = state.active_bar.as_ref() {
                    bar.set_message(format!("{} ({})", state.base_message, text));
                }
            }
            Progress::Message(msg) => {
                self.mp.println(format!("  {}", msg)).ok();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<45} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Invalid template")
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    write!(w, "{:.1}s", state.eta().as_secs_f64()).unwrap();
                },
            )
            .progress_chars("━╸ ")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_handler() -> CliProgressHandler {
        let handler = CliProgressHandler::new();
        handler.mp.set_draw_target(ProgressDrawTarget::hidden());
        handler
    }

    fn active_bar(handler: &CliProgressHandler) -> ProgressBar {
        handler
            .state
            .lock()
            .unwrap()
            .active_bar
            .as_ref()
            .expect("expected a live bar")
            .clone()
    }

    #[test]
    fn phase_start_creates_new_spinner() {
        let handler = setup_handler();
        assert!(handler.state.lock().unwrap().active_bar.is_none());

        handler.handle(Progress::PhaseStart { name: "Sizing" });

        assert_eq!(active_bar(&handler).message(), "Sizing");
        assert_eq!(handler.state.lock().unwrap().base_message, "Sizing");
    }

    #[test]
    fn phase_start_replaces_existing_bar() {
        let handler = setup_handler();
        handler.handle(Progress::PhaseStart { name: "Sizing" });
        handler.handle(Progress::PhaseStart { name: "Packing" });

        assert_eq!(active_bar(&handler).message(), "Packing");
        assert_eq!(handler.state.lock().unwrap().base_message, "Packing");
    }

    #[test]
    fn phase_finish_clears_active_bar() {
        let handler = setup_handler();
        handler.handle(Progress::PhaseStart { name: "Sizing" });
        handler.handle(Progress::PhaseFinish);

        let state = handler.state.lock().unwrap();
        assert!(state.active_bar.is_none());
        assert!(state.base_message.is_empty());
    }

    #[test]
    fn task_events_drive_the_bar() {
        let handler = setup_handler();
        handler.handle(Progress::PhaseStart {
            name: "Resolving molecules",
        });
        handler.handle(Progress::TaskStart { total_steps: 4 });

        let bar = active_bar(&handler);
        assert_eq!(bar.length(), Some(4));
        assert_eq!(bar.position(), 0);

        handler.handle(Progress::TaskIncrement);
        handler.handle(Progress::TaskIncrement);
        assert_eq!(bar.position(), 2);

        handler.handle(Progress::TaskFinish);
        assert!(bar.is_finished());
    }

    #[test]
    fn status_update_decorates_the_phase_message() {
        let handler = setup_handler();
        handler.handle(Progress::PhaseStart { name: "Packing" });
        handler.handle(Progress::StatusUpdate {
            text: "running packmol".into(),
        });

        assert_eq!(active_bar(&handler).message(), "Packing (running packmol)");
    }

    #[test]
    fn finish_clears_a_leftover_bar() {
        let handler = setup_handler();
        handler.handle(Progress::PhaseStart { name: "Packing" });
        handler.finish();

        assert!(handler.state.lock().unwrap().active_bar.is_none());
    }

    #[test]
    fn message_prints_without_a_live_bar() {
        let handler = setup_handler();
        handler.handle(Progress::Message("built a cubic cell".to_string()));
    }
}
