use std::cell::Cell;
use std::rc::Rc;

use crate::api::EditorApi;
use crate::error::TuneError;
use crate::events::{EditorEvent, SubscriptionId};
use crate::platform::Dom;
use crate::tune::BlockTune;

use super::{BUTTON_CLASS, DELETE, settings_button};

#[derive(Default)]
struct Confirmation {
    armed: Cell<bool>,
    subscription: Cell<Option<SubscriptionId>>,
}

/// Deletes the current block after a second, confirming activation.
///
/// Closing the settings panel in between disarms the confirmation.
pub struct DeleteTune<D: Dom> {
    dom: D,
    api: EditorApi<D>,
    button: Option<D::Node>,
    confirmation: Rc<Confirmation>,
}

impl<D: Dom> DeleteTune<D> {
    pub fn new(dom: D, api: EditorApi<D>) -> Self {
        Self {
            dom,
            api,
            button: None,
            confirmation: Rc::new(Confirmation::default()),
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        self.confirmation.armed.get()
    }

    fn confirm_class() -> String {
        format!("{}--confirm", BUTTON_CLASS)
    }

    fn arm(&mut self) {
        self.confirmation.armed.set(true);
        if let Some(button) = &self.button {
            self.dom.add_class(button, &Self::confirm_class());
        }

        let dom = self.dom.clone();
        let button = self.button.clone();
        let confirmation = self.confirmation.clone();
        let events = self.api.events.clone();
        let id = self.api.events.subscribe(move |event| {
            if *event != EditorEvent::BlockSettingsClosed {
                return;
            }
            confirmation.armed.set(false);
            if let Some(button) = &button {
                dom.remove_class(button, &Self::confirm_class());
            }
            if let Some(id) = confirmation.subscription.take() {
                events.unsubscribe(id);
            }
        });
        self.confirmation.subscription.set(Some(id));
    }

    fn disarm(&self) {
        self.confirmation.armed.set(false);
        if let Some(id) = self.confirmation.subscription.take() {
            self.api.events.unsubscribe(id);
        }
    }
}

impl<D: Dom> BlockTune<D> for DeleteTune<D> {
    fn render(&mut self) -> Result<Option<D::Node>, TuneError> {
        let button = settings_button(&self.dom, &self.api, DELETE, "delete", "Delete")?;
        self.button = Some(button.clone());
        Ok(Some(button))
    }

    fn activate(&mut self) -> Result<(), TuneError> {
        if !self.needs_confirmation() {
            self.arm();
            return Ok(());
        }
        self.disarm();
        self.api.blocks.delete_block(None);
        self.api.toolbar.toggle_block_settings(false);
        Ok(())
    }

    fn destroy(&mut self) {
        self.disarm();
    }
}
