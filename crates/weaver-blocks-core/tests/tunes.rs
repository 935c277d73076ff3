mod common;

use std::time::Duration;

use weaver_blocks_core::tunes::{DeleteTune, MoveDownTune, MoveUpTune};
use weaver_blocks_core::{BlockTune, Dom, EditorEvent, TuneError};

use common::*;

#[test]
fn test_move_up_refuses_first_block() {
    let h = harness();
    let mut tune = MoveUpTune::new(h.dom.clone(), h.api.clone());
    let button = tune.render().unwrap().unwrap();
    h.blocks.current.set(Some(0));
    h.blocks.count.set(2);

    let err = tune.activate().unwrap_err();
    assert!(matches!(err, TuneError::Rejected(_)));
    assert!(h.dom.has_class(&button, "wobble"));
    assert!(h.blocks.moves.borrow().is_empty());

    h.timers.advance(Duration::from_millis(500));
    assert!(!h.dom.has_class(&button, "wobble"));
}

#[test]
fn test_move_up_swaps_with_previous() {
    let h = harness();
    let mut tune = MoveUpTune::new(h.dom.clone(), h.api.clone());
    tune.render().unwrap();
    h.blocks.current.set(Some(2));
    h.blocks.count.set(3);

    tune.activate().unwrap();
    assert_eq!(*h.blocks.moves.borrow(), vec![(1, None)]);
    assert_eq!(*h.toolbar.settings.borrow(), vec![true]);
}

#[test]
fn test_move_down_refuses_last_block() {
    let h = harness();
    let mut tune = MoveDownTune::new(h.dom.clone(), h.api.clone());
    tune.render().unwrap();
    h.blocks.current.set(Some(2));
    h.blocks.count.set(3);
    assert!(tune.activate().is_err());

    h.blocks.current.set(Some(1));
    tune.activate().unwrap();
    assert_eq!(*h.blocks.moves.borrow(), vec![(2, None)]);
}

#[test]
fn test_tunes_need_a_current_block() {
    let h = harness();
    let mut up = MoveUpTune::new(h.dom.clone(), h.api.clone());
    let mut down = MoveDownTune::new(h.dom.clone(), h.api.clone());
    assert!(up.activate().is_err());
    assert!(down.activate().is_err());
}

#[test]
fn test_delete_needs_confirmation() {
    let h = harness();
    let mut tune = DeleteTune::new(h.dom.clone(), h.api.clone());
    let button = tune.render().unwrap().unwrap();

    tune.activate().unwrap();
    assert!(tune.needs_confirmation());
    assert!(h.dom.has_class(&button, "ce-settings__button--confirm"));
    assert!(h.blocks.deleted.borrow().is_empty());

    tune.activate().unwrap();
    assert!(!tune.needs_confirmation());
    assert_eq!(*h.blocks.deleted.borrow(), vec![None]);
    assert_eq!(*h.toolbar.settings.borrow(), vec![false]);
    assert_eq!(h.api.events.listener_count(), 0);
}

#[test]
fn test_closing_settings_disarms_delete() {
    let h = harness();
    let mut tune = DeleteTune::new(h.dom.clone(), h.api.clone());
    let button = tune.render().unwrap().unwrap();

    tune.activate().unwrap();
    h.api.events.emit(EditorEvent::FakeCursorHaveBeenSet { state: true });
    assert!(tune.needs_confirmation());

    h.api.events.emit(EditorEvent::BlockSettingsClosed);
    assert!(!tune.needs_confirmation());
    assert!(!h.dom.has_class(&button, "ce-settings__button--confirm"));
    assert_eq!(h.api.events.listener_count(), 0);

    // Back to the first step.
    tune.activate().unwrap();
    assert!(h.blocks.deleted.borrow().is_empty());
}

#[test]
fn test_destroy_drops_subscription() {
    let h = harness();
    let mut tune = DeleteTune::new(h.dom.clone(), h.api.clone());
    tune.render().unwrap();
    tune.activate().unwrap();
    assert_eq!(h.api.events.listener_count(), 1);
    tune.destroy();
    assert_eq!(h.api.events.listener_count(), 0);
}
