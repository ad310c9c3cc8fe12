use anyhow::Result;

mod spinner;

#[derive(Debug, Default, Clone)]
pub struct Interaction;

impl Interaction {
    pub fn new() -> Self {
        Default::default()
    }
}

/// Reports the progress of a long running platform operation.
///
/// Every call to [`ProgressReporter::step`] advances the indicator by one frame.
/// The message is printed on its own line only when it differs from the previous one.
pub trait ProgressReporter {
    fn step(&mut self, message: &str);
}

pub trait ProgressInteraction {
    /// Start a new progress indicator. It is cleared when the returned reporter is dropped.
    fn start_progress(&self) -> Result<Box<dyn ProgressReporter + Send>>;
}
