//! Built-in block tunes: move up, move down, delete.

mod delete;
mod move_down;
mod move_up;

use std::rc::Rc;
use std::time::Duration;

pub use delete::DeleteTune;
pub use move_down::MoveDownTune;
pub use move_up::MoveUpTune;

use crate::api::EditorApi;
use crate::platform::{Dom, PlatformError};
use crate::tune::TuneDefinition;

pub const MOVE_UP: &str = "moveUp";
pub const MOVE_DOWN: &str = "moveDown";
pub const DELETE: &str = "delete";

pub(crate) const BUTTON_CLASS: &str = "ce-settings__button";
pub(crate) const WOBBLE_CLASS: &str = "wobble";
const WOBBLE_DURATION: Duration = Duration::from_millis(500);

/// The internal tunes in the order the settings panel lists them.
pub fn default_tunes<D: Dom>() -> Vec<Rc<TuneDefinition<D>>> {
    vec![
        Rc::new(TuneDefinition::internal(MOVE_UP, |ctx| {
            Box::new(MoveUpTune::new(ctx.dom, ctx.api))
        })),
        Rc::new(TuneDefinition::internal(DELETE, |ctx| {
            Box::new(DeleteTune::new(ctx.dom, ctx.api))
        })),
        Rc::new(TuneDefinition::internal(MOVE_DOWN, |ctx| {
            Box::new(MoveDownTune::new(ctx.dom, ctx.api))
        })),
    ]
}

pub(crate) fn settings_button<D: Dom>(
    dom: &D,
    api: &EditorApi<D>,
    tune: &str,
    modifier: &str,
    title_key: &str,
) -> Result<D::Node, PlatformError> {
    let button = dom.create_element("div")?;
    dom.add_class(&button, BUTTON_CLASS);
    dom.add_class(&button, &format!("{}--{}", BUTTON_CLASS, modifier));
    dom.set_attribute(&button, "data-tune", tune)?;
    dom.set_attribute(&button, "title", &api.i18n.t(title_key))?;
    Ok(button)
}

/// Shake the button briefly to signal a refused action.
pub(crate) fn wobble<D: Dom>(dom: &D, api: &EditorApi<D>, button: &D::Node) {
    dom.add_class(button, WOBBLE_CLASS);
    let dom = dom.clone();
    let button = button.clone();
    api.timers.set_timeout(
        WOBBLE_DURATION,
        Box::new(move || dom.remove_class(&button, WOBBLE_CLASS)),
    );
}
