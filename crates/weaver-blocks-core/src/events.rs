//! Editor-wide event bus.

use std::cell::RefCell;
use std::rc::Rc;

/// Events shared between the orchestrator, blocks and tunes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The block settings panel was closed.
    BlockSettingsClosed,
    /// A block is about to add (`true`) or remove (`false`) a fake cursor.
    FakeCursorAboutToBeToggled { state: bool },
    /// A block finished adding or removing a fake cursor.
    FakeCursorHaveBeenSet { state: bool },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<RefCell<dyn FnMut(&EditorEvent)>>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Synchronous publish/subscribe bus.
///
/// Listeners may subscribe or unsubscribe while an event is being emitted;
/// the change applies to the next emission.
#[derive(Clone, Default)]
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, Rc::new(RefCell::new(listener))));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(sid, _)| *sid != id);
        state.listeners.len() != before
    }

    pub fn emit(&self, event: EditorEvent) {
        let listeners: Vec<(SubscriptionId, Listener)> = self.state.borrow().listeners.clone();
        for (id, listener) in listeners {
            // Skip listeners removed by an earlier listener in this emission.
            if !self.is_subscribed(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut f) => f(&event),
                Err(_) => {
                    tracing::warn!(target: "weaver::events", ?event, "listener re-entered, skipping")
                }
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.state.borrow().listeners.iter().any(|(sid, _)| *sid == id)
    }
}
