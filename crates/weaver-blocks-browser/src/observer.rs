//! Change detection wiring for the selected block.
//!
//! While a block is selected its content element is watched with a
//! `MutationObserver` and its holder gets `focusin` and `input` listeners.
//! The block decides what counts as a change; this module only feeds it
//! events and fires its debounce deadline with a `gloo-timers` timeout.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use weaver_blocks_core::{Block, Dom, MutationKind, MutationRecord, PlatformError};
use web_time::Instant;

use crate::dom::BrowserDom;

pub type SharedBlock = Rc<RefCell<Block<BrowserDom>>>;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>;

/// Observes one block until dropped.
///
/// Creating a watcher calls `will_select` on the block, dropping it calls
/// `will_unselect` and disconnects everything.
pub struct BlockWatcher {
    block: SharedBlock,
    observer: web_sys::MutationObserver,
    _callback: ObserverCallback,
    _focus_in: EventListener,
    _input: EventListener,
    timer: Rc<RefCell<Option<Timeout>>>,
}

impl BlockWatcher {
    pub fn watch(block: SharedBlock) -> Result<Self, PlatformError> {
        let holder = block.borrow().holder().clone();
        let timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));

        let callback: ObserverCallback = {
            let weak = Rc::downgrade(&block);
            let timer = timer.clone();
            Closure::new(move |records: js_sys::Array, _: web_sys::MutationObserver| {
                let records: Vec<_> = records
                    .iter()
                    .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
                    .filter_map(|r| convert_record(&r))
                    .collect();
                with_block(&weak, |block| {
                    if block.handle_mutations(&records, Instant::now()) {
                        arm_timer(&weak, &timer, block);
                    }
                });
            })
        };

        let observer = web_sys::MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| PlatformError(format!("MutationObserver::new failed: {:?}", e)))?;
        // The holder only carries state classes; content lives in its first element.
        let observed: web_sys::Node = holder
            .dyn_ref::<web_sys::Element>()
            .and_then(|el| el.first_element_child())
            .map(Into::into)
            .ok_or("block holder has no content element")?;
        let options = web_sys::MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        options.set_character_data(true);
        options.set_attributes(true);
        observer
            .observe_with_options(&observed, &options)
            .map_err(|e| PlatformError(format!("observe failed: {:?}", e)))?;

        let focus_in = {
            let weak = Rc::downgrade(&block);
            EventListener::new(&holder, "focusin", move |event| {
                let Some(target) = event_target(event) else {
                    return;
                };
                if let Some(block) = weak.upgrade() {
                    if let Ok(block) = block.try_borrow() {
                        block.handle_focus_in(&target);
                    }
                }
            })
        };

        // Typing into <input>/<textarea> changes no DOM nodes.
        let input = {
            let weak = Rc::downgrade(&block);
            let timer = timer.clone();
            let dom = BrowserDom::from_document(
                holder
                    .owner_document()
                    .ok_or("holder has no owner document")?,
            );
            EventListener::new(&holder, "input", move |event| {
                let Some(target) = event_target(event) else {
                    return;
                };
                if !dom.is_native_input(&target) {
                    return;
                }
                with_block(&weak, |block| {
                    if block.handle_native_input(Instant::now()) {
                        arm_timer(&weak, &timer, block);
                    }
                });
            })
        };

        block.borrow_mut().will_select();
        tracing::debug!(target: "weaver::block", block_id = %block.borrow().id(), "watching block");

        Ok(Self {
            block,
            observer,
            _callback: callback,
            _focus_in: focus_in,
            _input: input,
            timer,
        })
    }

    pub fn block(&self) -> &SharedBlock {
        &self.block
    }
}

impl Drop for BlockWatcher {
    fn drop(&mut self) {
        self.observer.disconnect();
        self.timer.borrow_mut().take();
        match self.block.try_borrow_mut() {
            Ok(mut block) => block.will_unselect(),
            Err(_) => tracing::warn!(target: "weaver::block", "block busy while unwatching"),
        }
    }
}

fn event_target(event: &web_sys::Event) -> Option<web_sys::Node> {
    event.target()?.dyn_into::<web_sys::Node>().ok()
}

fn with_block(weak: &Weak<RefCell<Block<BrowserDom>>>, f: impl FnOnce(&mut Block<BrowserDom>)) {
    let Some(block) = weak.upgrade() else {
        return;
    };
    match block.try_borrow_mut() {
        Ok(mut block) => f(&mut block),
        Err(_) => tracing::warn!(target: "weaver::block", "block busy, dropping observed change"),
    }
}

/// Replace the pending timeout with one firing at the block's deadline.
fn arm_timer(
    weak: &Weak<RefCell<Block<BrowserDom>>>,
    timer: &Rc<RefCell<Option<Timeout>>>,
    block: &Block<BrowserDom>,
) {
    let Some(deadline) = block.pending_deadline() else {
        return;
    };
    // One extra millisecond so the timeout never lands just before the deadline.
    let delay = deadline.saturating_duration_since(Instant::now()).as_millis() as u32 + 1;
    let weak = weak.clone();
    let timeout = Timeout::new(delay, move || {
        with_block(&weak, |block| {
            block.tick(Instant::now());
        });
    });
    timer.borrow_mut().replace(timeout);
}

fn convert_record(record: &web_sys::MutationRecord) -> Option<MutationRecord<web_sys::Node>> {
    let target = record.target()?;
    let kind = match record.type_().as_str() {
        "childList" => MutationKind::ChildList,
        "characterData" => MutationKind::CharacterData,
        "attributes" => MutationKind::Attributes,
        _ => return None,
    };
    let nodes = |list: web_sys::NodeList| -> Vec<web_sys::Node> {
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    };
    Some(MutationRecord {
        kind,
        target,
        added: nodes(record.added_nodes()),
        removed: nodes(record.removed_nodes()),
    })
}
