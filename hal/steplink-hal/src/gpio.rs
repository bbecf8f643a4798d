//! Digital output lines
//!
//! Step, direction and enable lines are plain push-pull outputs. Board
//! crates implement [`OutputPin`] for their chip's GPIO type.

/// Push-pull output line
///
/// Called from the step tick: an implementation should be a single
/// register write.
pub trait OutputPin {
    /// Drive the line high (`true`) or low (`false`)
    fn set_level(&mut self, high: bool);

    /// Level last driven
    fn level(&self) -> bool;

    fn set_high(&mut self) {
        self.set_level(true);
    }

    fn set_low(&mut self) {
        self.set_level(false);
    }
}
