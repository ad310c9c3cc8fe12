use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use super::{Interaction, ProgressInteraction, ProgressReporter};

/// Spinner frames, the last one is shown once the spinner is finished.
const TICK_STRINGS: &[&str] = &["|", "/", "-", "\\", " "];

impl ProgressInteraction for Interaction {
    fn start_progress(&self) -> Result<Box<dyn ProgressReporter + Send>> {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(ProgressStyle::default_spinner().tick_strings(TICK_STRINGS));

        Ok(Box::new(SpinnerProgressReporter::new(progress_bar)))
    }
}

pub struct SpinnerProgressReporter {
    progress_bar: ProgressBar,
    message: Option<String>,
}

impl SpinnerProgressReporter {
    pub fn new(progress_bar: ProgressBar) -> Self {
        Self {
            progress_bar,
            message: None,
        }
    }

    // Returns true when the message differs from the previous step
    fn update_message(&mut self, message: &str) -> bool {
        if self.message.as_deref() == Some(message) {
            return false;
        }

        self.message = Some(message.to_string());
        true
    }
}

impl ProgressReporter for SpinnerProgressReporter {
    fn step(&mut self, message: &str) {
        if self.update_message(message) {
            debug!(message, "operation progress");
            if self.progress_bar.is_hidden() {
                println!("{message}");
            } else {
                self.progress_bar.println(message);
            }
        }

        self.progress_bar.tick();
    }
}

impl Drop for SpinnerProgressReporter {
    fn drop(&mut self) {
        self.progress_bar.finish_and_clear();
    }
}
