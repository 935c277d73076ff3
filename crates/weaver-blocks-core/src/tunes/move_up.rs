use crate::api::EditorApi;
use crate::error::TuneError;
use crate::platform::Dom;
use crate::tune::BlockTune;

use super::{MOVE_UP, settings_button, wobble};

/// Swaps the current block with the one above it.
pub struct MoveUpTune<D: Dom> {
    dom: D,
    api: EditorApi<D>,
    button: Option<D::Node>,
}

impl<D: Dom> MoveUpTune<D> {
    pub fn new(dom: D, api: EditorApi<D>) -> Self {
        Self {
            dom,
            api,
            button: None,
        }
    }
}

impl<D: Dom> BlockTune<D> for MoveUpTune<D> {
    fn render(&mut self) -> Result<Option<D::Node>, TuneError> {
        let button = settings_button(&self.dom, &self.api, MOVE_UP, "move-up", "Move up")?;
        self.button = Some(button.clone());
        Ok(Some(button))
    }

    fn activate(&mut self) -> Result<(), TuneError> {
        let index = self
            .api
            .blocks
            .current_block_index()
            .ok_or_else(|| TuneError::Rejected("no current block".into()))?;
        if index == 0 {
            if let Some(button) = &self.button {
                wobble(&self.dom, &self.api, button);
            }
            return Err(TuneError::Rejected(
                "unable to move block up since it is already the first".into(),
            ));
        }
        self.api.blocks.move_block(index - 1, None);
        self.api.toolbar.toggle_block_settings(true);
        Ok(())
    }
}
