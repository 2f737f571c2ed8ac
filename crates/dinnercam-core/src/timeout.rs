//! Progressive wait-time notifications for long-running requests.
//!
//! Some operations never emit `status` events of their own; the notifier
//! escalates a status message through staged wait times instead. Every
//! stage re-checks the cancellation flag right before firing, so stopping
//! the schedule deterministically silences stages that were already queued.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct TimeoutStage {
    pub offset: Duration,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct TimeoutPreset {
    pub stages: Vec<TimeoutStage>,
}

impl TimeoutPreset {
    /// Staged wait notices for an interactive chat turn.
    pub fn interactive() -> Self {
        Self {
            stages: vec![
                stage(15, "Still working on it... ⏳"),
                stage(30, "Almost there, thanks for waiting... 🕐"),
                stage(45, "The server seems busy right now... 🌐"),
                stage(60, "Sorry, this is taking too long. Please try again. 🙏"),
            ],
        }
    }

    /// Longer schedule for image-generation steps. `step_index` is 0-based.
    pub fn image_generation(step_index: usize) -> Self {
        let step = step_index + 1;
        Self {
            stages: vec![
                stage(20, &format!("Generating the image... 🎨 (step {step})")),
                stage(
                    40,
                    &format!("Image generation is taking a while... ⏳ (step {step})"),
                ),
                stage(
                    60,
                    &format!("The server seems busy right now... 🌐 (step {step})"),
                ),
                stage(
                    90,
                    "Image generation timed out. Moving on to the next step... ⏭️",
                ),
            ],
        }
    }
}

fn stage(offset_secs: u64, message: &str) -> TimeoutStage {
    TimeoutStage {
        offset: Duration::from_secs(offset_secs),
        message: message.to_string(),
    }
}

/// A running escalation schedule. Dropping the handle cancels it.
pub struct ProgressiveTimeout {
    cancel: CancellationToken,
}

impl ProgressiveTimeout {
    /// Start the schedule. Each stage fires `on_status` once its offset has
    /// elapsed, unless the schedule was stopped first.
    pub fn start(
        preset: TimeoutPreset,
        on_status: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        let cancel = CancellationToken::new();
        let on_status = Arc::new(on_status);

        for TimeoutStage { offset, message } in preset.stages {
            let cancel = cancel.clone();
            let on_status = on_status.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(offset) => {
                        // The timer may have completed concurrently with
                        // stop(); the flag check right before the call is
                        // what keeps cancellation deterministic.
                        if !cancel.is_cancelled() {
                            on_status(message);
                        }
                    }
                }
            });
        }

        Self { cancel }
    }

    /// Stop the schedule; no stage fires after the flag is set.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProgressiveTimeout {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
