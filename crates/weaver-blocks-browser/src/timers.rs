use std::time::Duration;

use gloo_timers::callback::Timeout;
use weaver_blocks_core::Timers;

/// [`Timers`] backed by `setTimeout`. Scheduled tasks cannot be cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimers;

impl Timers for GlooTimers {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, task).forget();
    }
}
