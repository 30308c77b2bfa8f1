use albumgrid::filter::{FilterDefinition, FilterOperation, Predicate};
use albumgrid::preset::PresetStore;
use albumgrid::selection::{parse_index, Selection, SelectionChange, SelectionController};
use std::cell::RefCell;
use std::rc::Rc;

fn year_after(year: i32) -> FilterDefinition {
    vec![Predicate::new("year", FilterOperation::GreaterThan, year)].into()
}

fn recording(controller: &mut SelectionController) -> Rc<RefCell<Vec<SelectionChange>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    controller.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    seen
}

#[test]
fn test_select_matches_lookup_for_every_preset() {
    let mut controller = SelectionController::default();
    for i in 0..controller.presets().len() {
        let stored = controller.store().lookup(i).unwrap().clone();
        let selection = controller.select_preset(Some(i)).unwrap().clone();
        assert_eq!(selection.index, Some(i));
        assert_eq!(selection.filter, stored);
    }
}

#[test]
fn test_select_none_is_empty_and_detached() {
    let mut controller = SelectionController::default();
    controller.select_preset(Some(1)).unwrap();
    let selection = controller.select_preset(None).unwrap();
    assert_eq!(selection, &Selection::default());
    assert_eq!(selection.raw_index(), -1);

    let selection = controller.select_preset_raw(-1).unwrap();
    assert_eq!(selection, &Selection::default());
}

#[test]
fn test_select_is_idempotent() {
    let mut controller = SelectionController::default();
    let first = controller.select_preset(Some(2)).unwrap().clone();
    let second = controller.select_preset(Some(2)).unwrap().clone();
    assert_eq!(first, second);
}

#[test]
fn test_edit_always_detaches() {
    let mut controller = SelectionController::default();
    controller.select_preset(Some(1)).unwrap();

    // even an edit identical to the stored preset detaches
    let selection = controller.edit_filter(year_after(1990));
    assert_eq!(selection, &Selection::detached(year_after(1990)));

    let selection = controller.edit_filter(FilterDefinition::new());
    assert_eq!(selection.raw_index(), -1);
    assert!(selection.filter.is_empty());
}

#[test]
fn test_edits_never_reach_the_store() {
    let mut controller = SelectionController::default();
    controller.select_preset(Some(1)).unwrap();
    let edited = controller
        .selection()
        .filter
        .with(Predicate::new("artist", FilterOperation::Contains, "Rage"));
    controller.edit_filter(edited);
    assert_eq!(controller.store().lookup(1).unwrap(), &year_after(1990));
}

#[test]
fn test_overwrite_scenario() {
    let mut controller = SelectionController::default();
    assert_eq!(
        controller.presets().names(),
        vec![
            "Name contains \"um\"",
            "Released after 1990",
            "Released before 1990"
        ]
    );

    let selection = controller.select_preset(Some(1)).unwrap();
    assert_eq!(selection, &Selection { index: Some(1), filter: year_after(1990) });

    let selection = controller.edit_filter(year_after(1995));
    assert_eq!(selection, &Selection::detached(year_after(1995)));

    let selection = controller
        .save_current_as_preset("Released after 1990")
        .unwrap()
        .clone();
    assert_eq!(selection.index, Some(1));
    assert_eq!(selection.filter, year_after(1995));
    assert_eq!(controller.presets().len(), 3);
    assert_eq!(controller.store().lookup(1).unwrap(), &year_after(1995));
}

#[test]
fn test_save_new_name_scenario() {
    let mut controller = SelectionController::default();
    controller.edit_filter(year_after(2010));
    let selection = controller.save_current_as_preset("My Filter").unwrap().clone();
    assert_eq!(selection.index, Some(3));
    assert_eq!(controller.presets().len(), 4);
    assert_eq!(controller.presets()[3].name, "My Filter");
    assert_eq!(controller.store().lookup(3).unwrap(), &year_after(2010));
}

#[test]
fn test_save_blank_name_changes_nothing() {
    let mut controller = SelectionController::default();
    controller.edit_filter(year_after(1995));
    let seen = recording(&mut controller);
    let selection_before = controller.selection().clone();
    let presets_before = controller.presets();

    for name in ["", "  "] {
        let err = controller.save_current_as_preset(name).unwrap_err();
        assert!(err.is_validation());
    }

    assert_eq!(controller.selection(), &selection_before);
    assert_eq!(controller.presets(), presets_before);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_invalid_index_changes_nothing() {
    let mut controller = SelectionController::default();
    controller.select_preset(Some(0)).unwrap();
    let seen = recording(&mut controller);
    let before = controller.selection().clone();

    assert!(controller.select_preset(Some(3)).unwrap_err().is_index());
    assert!(controller.select_preset_raw(7).unwrap_err().is_index());
    assert!(controller.select_preset_raw(-2).unwrap_err().is_index());

    assert_eq!(controller.selection(), &before);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_empty_store() {
    let mut controller = SelectionController::new(PresetStore::new());
    assert!(controller.select_preset(Some(0)).is_err());
    assert_eq!(controller.select_preset(None).unwrap(), &Selection::default());
    assert!(parse_index(0, 0).unwrap_err().is_index());
}

#[test]
fn test_subscribers_receive_presets_with_each_change() {
    let mut controller = SelectionController::default();
    let seen = recording(&mut controller);

    controller.select_preset(Some(2)).unwrap();
    controller.edit_filter(year_after(1999));
    controller.save_current_as_preset("Late nineties").unwrap();
    controller.select_preset(None).unwrap();

    let seen = seen.borrow();
    let indices: Vec<i64> = seen.iter().map(|c| c.selection.raw_index()).collect();
    assert_eq!(indices, vec![2, -1, 3, -1]);
    assert_eq!(seen[1].presets.len(), 3);
    assert_eq!(seen[2].presets.len(), 4);
    assert_eq!(seen[2].presets[3].filter, year_after(1999));
    // the list delivered before the save is its own snapshot
    assert_eq!(seen[0].presets.len(), 3);
}

#[test]
fn test_multiple_subscribers_and_unsubscribe() {
    let mut controller = SelectionController::default();
    let first = recording(&mut controller);
    let second = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&second);
    let id = controller.subscribe(move |_| *counter.borrow_mut() += 1);

    controller.select_preset(Some(0)).unwrap();
    assert!(controller.unsubscribe(id));
    controller.select_preset(Some(1)).unwrap();

    assert_eq!(first.borrow().len(), 2);
    assert_eq!(*second.borrow(), 1);
}

#[test]
fn test_select_by_name() {
    let mut controller = SelectionController::default();
    let selection = controller.select_preset_by_name(" Released after 1990 ").unwrap();
    assert_eq!(selection.index, Some(1));
    assert!(controller.select_preset_by_name("missing").is_err());
    assert_eq!(controller.selection().index, Some(1));
}
