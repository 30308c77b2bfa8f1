//! The active filter and the preset it is attached to.
//!
//! [`SelectionController`] is the single owner of the current [`Selection`].
//! A selection is *attached* when its index names a preset whose filter it
//! mirrored when selected or saved, and *detached* (index -1) when the filter
//! is ad-hoc. Selecting or saving attaches; clearing or editing detaches.
//! Every accepted change is pushed to subscribers together with the preset
//! list it refers to. Refused changes leave everything as it was and push
//! nothing.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PresetError, Result};
use crate::filter::FilterDefinition;
use crate::preset::{PresetList, PresetStore};

/// Index value used at the UI boundary for "no preset selected".
pub const DETACHED_INDEX: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    /// `None` is the detached state (-1 at the boundary)
    #[serde(serialize_with = "serialize_index")]
    pub index: Option<usize>,
    pub filter: FilterDefinition,
}

fn serialize_index<S>(index: &Option<usize>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(index.map(|i| i as i64).unwrap_or(DETACHED_INDEX))
}

impl Selection {
    pub fn detached(filter: FilterDefinition) -> Self {
        Self {
            index: None,
            filter,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.index.is_some()
    }

    /// Index as the UI sees it: -1 when detached
    pub fn raw_index(&self) -> i64 {
        self.index.map(|i| i as i64).unwrap_or(DETACHED_INDEX)
    }
}

/// Convert a boundary index (-1 or `0..len`) into `Option<usize>`.
pub fn parse_index(raw: i64, len: usize) -> Result<Option<usize>> {
    if raw == DETACHED_INDEX {
        return Ok(None);
    }
    match usize::try_from(raw) {
        Ok(i) if i < len => Ok(Some(i)),
        _ => Err(PresetError::Index { index: raw, len }),
    }
}

/// What subscribers receive after every accepted change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionChange {
    pub selection: Selection,
    pub presets: PresetList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&SelectionChange)>;

pub struct SelectionController {
    store: PresetStore,
    current: Selection,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl SelectionController {
    /// Controller over `store`, starting detached with no filter.
    pub fn new(store: PresetStore) -> Self {
        Self {
            store,
            current: Selection::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.current
    }

    pub fn presets(&self) -> PresetList {
        self.store.presets()
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    /// Register `callback` for every future change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SelectionChange) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Attach to the preset at `index`, or detach with an empty filter for `None`.
    ///
    /// The active filter becomes an independent copy of the stored one, so
    /// later edits never reach the preset.
    pub fn select_preset(&mut self, index: Option<usize>) -> Result<&Selection> {
        let filter = match index {
            Some(i) => self.store.lookup(i).inspect_err(|e| warn!(%e, "select refused"))?.clone(),
            None => FilterDefinition::new(),
        };
        debug!(index = ?index, "select preset");
        self.current = Selection { index, filter };
        self.publish();
        Ok(&self.current)
    }

    /// [`select_preset`](Self::select_preset) taking the boundary form (-1 for none).
    pub fn select_preset_raw(&mut self, raw: i64) -> Result<&Selection> {
        let index = parse_index(raw, self.store.len())
            .inspect_err(|e| warn!(%e, "select refused"))?;
        self.select_preset(index)
    }

    /// Attach to the preset called `name`.
    pub fn select_preset_by_name(&mut self, name: &str) -> Result<&Selection> {
        match self.store.position(name) {
            Some(index) => self.select_preset(Some(index)),
            None => Err(PresetError::Validation(format!("no preset named {:?}", name))),
        }
    }

    /// Replace the active filter. Always detaches, even if `filter` happens
    /// to equal a stored preset.
    pub fn edit_filter(&mut self, filter: FilterDefinition) -> &Selection {
        debug!(predicates = filter.len(), "edit filter");
        self.current = Selection::detached(filter);
        self.publish();
        &self.current
    }

    /// Save the active filter under `name` and attach to that preset.
    ///
    /// Either the store and the selection both change or neither does.
    pub fn save_current_as_preset(&mut self, name: &str) -> Result<&Selection> {
        let filter = self.current.filter.clone();
        let (index, _) = self
            .store
            .upsert(name, filter.clone())
            .inspect_err(|e| warn!(%e, "save refused"))?;
        debug!(index, "saved current filter");
        self.current = Selection {
            index: Some(index),
            filter,
        };
        self.publish();
        Ok(&self.current)
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let change = SelectionChange {
            selection: self.current.clone(),
            presets: self.store.presets(),
        };
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&change);
        }
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(PresetStore::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterOperation, Predicate};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn year_after(year: i32) -> FilterDefinition {
        vec![Predicate::new("year", FilterOperation::GreaterThan, year)].into()
    }

    #[test]
    fn test_starts_detached() {
        let controller = SelectionController::default();
        assert_eq!(controller.selection(), &Selection::default());
        assert_eq!(controller.selection().raw_index(), -1);
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index(-1, 3), Ok(None));
        assert_eq!(parse_index(2, 3), Ok(Some(2)));
        assert!(parse_index(3, 3).unwrap_err().is_index());
        assert!(parse_index(-2, 3).unwrap_err().is_index());
    }

    #[test]
    fn test_selected_filter_is_a_copy() {
        let mut controller = SelectionController::default();
        controller.select_preset(Some(1)).unwrap();
        let edited = controller
            .selection()
            .filter
            .with_field(Predicate::new("year", FilterOperation::GreaterThan, 2000));
        controller.edit_filter(edited);

        assert_eq!(controller.store().lookup(1).unwrap(), &year_after(1990));
    }

    #[test]
    fn test_refused_select_keeps_state() {
        let mut controller = SelectionController::default();
        controller.select_preset(Some(0)).unwrap();
        let before = controller.selection().clone();

        assert!(controller.select_preset(Some(9)).is_err());
        assert!(controller.select_preset_raw(-5).is_err());
        assert_eq!(controller.selection(), &before);
    }

    #[test]
    fn test_select_by_name() {
        let mut controller = SelectionController::default();
        let selection = controller.select_preset_by_name("Released before 1990").unwrap();
        assert_eq!(selection.index, Some(2));
        assert!(controller
            .select_preset_by_name("Nope")
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let mut controller = SelectionController::default();
        let seen: Rc<RefCell<Vec<SelectionChange>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = controller.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        controller.select_preset(Some(1)).unwrap();
        controller.edit_filter(year_after(1995));
        let _ = controller.save_current_as_preset("");
        controller.save_current_as_preset("Mine").unwrap();

        {
            let seen = seen.borrow();
            // the refused save publishes nothing
            assert_eq!(seen.len(), 3);
            assert_eq!(seen[0].selection.index, Some(1));
            assert_eq!(seen[1].selection.index, None);
            assert_eq!(seen[2].selection.index, Some(3));
            assert_eq!(seen[2].presets.len(), 4);
            assert_eq!(seen[1].presets.len(), 3);
        }

        assert!(controller.unsubscribe(id));
        assert!(!controller.unsubscribe(id));
        controller.select_preset(None).unwrap();
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_selection_serializes_boundary_index() {
        let json = serde_json::to_string(&Selection::default()).unwrap();
        assert_eq!(json, r#"{"index":-1,"filter":[]}"#);
    }
}
