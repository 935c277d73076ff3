//! Deferred task scheduling.
//!
//! Inline tools defer focus calls and tooltip hiding. [`Timers`] abstracts the
//! scheduler; [`ManualTimers`] runs tasks against a virtual clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Schedules a task to run after a delay on the same thread.
pub trait Timers {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

struct Scheduled {
    due: Duration,
    seq: u64,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: Vec<Scheduled>,
}

/// Virtual-clock scheduler. Tasks run only when the clock is advanced.
#[derive(Clone, Default)]
pub struct ManualTimers {
    state: Rc<RefCell<ManualState>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Run zero-delay tasks that are already due.
    pub fn run_pending(&self) {
        self.advance(Duration::ZERO);
    }

    /// Move the clock forward, running due tasks in deadline order.
    /// Tasks scheduled by running tasks are picked up if they fall due.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().now + by;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let earliest = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.due <= target)
                    .min_by_key(|(_, s)| (s.due, s.seq))
                    .map(|(i, _)| i);
                earliest.map(|i| {
                    let scheduled = state.queue.remove(i);
                    state.now = scheduled.due;
                    scheduled.task
                })
            };
            match next {
                Some(task) => task(),
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
    }
}

impl Timers for ManualTimers {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let mut state = self.state.borrow_mut();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(Scheduled { due, seq, task });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_runs_in_deadline_order() {
        let timers = ManualTimers::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("b", 20), ("a", 10), ("c", 10)] {
            let log = log.clone();
            timers.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || log.borrow_mut().push(name)),
            );
        }
        timers.advance(Duration::from_millis(15));
        assert_eq!(*log.borrow(), vec!["a", "c"]);
        timers.advance(Duration::from_millis(5));
        assert_eq!(*log.borrow(), vec!["a", "c", "b"]);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_nested_zero_delay() {
        let timers = ManualTimers::new();
        let hits = Rc::new(Cell::new(0));
        let inner_timers = timers.clone();
        let inner_hits = hits.clone();
        timers.set_timeout(
            Duration::ZERO,
            Box::new(move || {
                inner_hits.set(inner_hits.get() + 1);
                let hits = inner_hits.clone();
                inner_timers.set_timeout(
                    Duration::ZERO,
                    Box::new(move || hits.set(hits.get() + 1)),
                );
            }),
        );
        timers.run_pending();
        assert_eq!(hits.get(), 2);
    }
}
