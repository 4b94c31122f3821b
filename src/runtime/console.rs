/// Logging sink handed to the protocol engine.
///
/// Every level emits a `tracing` event under the `cometd` target; `debug`
/// is an alias of `log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl Console {
    pub fn log(&self, message: &str) {
        tracing::debug!(target: "cometd", "{}", message);
    }

    pub fn debug(&self, message: &str) {
        self.log(message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: "cometd", "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(target: "cometd", "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: "cometd", "{}", message);
    }
}
