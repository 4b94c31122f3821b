use crate::base::neterror::NetError;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// A pending timeout created by [`set_timeout`]. Cancel it with
/// [`TimerHandle::cancel`] (or `Runtime::clear_timeout`).
///
/// Dropping the handle does not cancel the timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    /// Cancel the timer. No effect once it has fired.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// The callback ran, or the timer was cancelled.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Run `callback` once after `delay` on the current tokio reactor.
pub fn set_timeout<F>(delay: Duration, callback: F) -> Result<TimerHandle, NetError>
where
    F: FnOnce() + Send + 'static,
{
    let handle = Handle::try_current().map_err(|_| NetError::ReactorUnavailable)?;
    let task = handle.spawn(async move {
        tokio::time::sleep(delay).await;
        callback();
    });
    Ok(TimerHandle {
        abort: task.abort_handle(),
    })
}
