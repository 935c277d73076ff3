use crate::api::EditorApi;
use crate::error::TuneError;
use crate::platform::Dom;
use crate::tune::BlockTune;

use super::{MOVE_DOWN, settings_button, wobble};

/// Swaps the current block with the one below it.
pub struct MoveDownTune<D: Dom> {
    dom: D,
    api: EditorApi<D>,
    button: Option<D::Node>,
}

impl<D: Dom> MoveDownTune<D> {
    pub fn new(dom: D, api: EditorApi<D>) -> Self {
        Self {
            dom,
            api,
            button: None,
        }
    }
}

impl<D: Dom> BlockTune<D> for MoveDownTune<D> {
    fn render(&mut self) -> Result<Option<D::Node>, TuneError> {
        let button = settings_button(&self.dom, &self.api, MOVE_DOWN, "move-down", "Move down")?;
        self.button = Some(button.clone());
        Ok(Some(button))
    }

    fn activate(&mut self) -> Result<(), TuneError> {
        let index = self
            .api
            .blocks
            .current_block_index()
            .ok_or_else(|| TuneError::Rejected("no current block".into()))?;
        if index + 1 >= self.api.blocks.blocks_count() {
            if let Some(button) = &self.button {
                wobble(&self.dom, &self.api, button);
            }
            return Err(TuneError::Rejected(
                "unable to move block down since it is already the last".into(),
            ));
        }
        self.api.blocks.move_block(index + 1, None);
        self.api.toolbar.toggle_block_settings(true);
        Ok(())
    }
}
