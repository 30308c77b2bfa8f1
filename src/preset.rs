use serde::{Deserialize, Serialize, Serializer};
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

use crate::error::{PresetError, Result};
use crate::filter::{FilterDefinition, FilterOperation, Predicate};

/// A named, saved filter the user can reselect later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub filter: FilterDefinition,
}

impl Preset {
    pub fn new(name: impl Into<String>, filter: impl Into<FilterDefinition>) -> Self {
        Self {
            name: name.into(),
            filter: filter.into(),
        }
    }
}

/// Immutable, cheaply clonable snapshot of the presets in insertion order.
///
/// The position of a preset is its external identity. A holder of an older
/// list never observes later saves: every change produces a fresh list.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetList(Arc<[Preset]>);

impl Default for PresetList {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl PresetList {
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|p| p.name == name)
    }

    /// Whether `a` and `b` are the same snapshot (not merely equal contents)
    pub fn ptr_eq(a: &PresetList, b: &PresetList) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for PresetList {
    type Target = [Preset];

    fn deref(&self) -> &[Preset] {
        &self.0
    }
}

impl From<Vec<Preset>> for PresetList {
    fn from(presets: Vec<Preset>) -> Self {
        Self(presets.into())
    }
}

impl Serialize for PresetList {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

/// The presets shipped with the program.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "Name contains \"um\"",
            vec![Predicate::new("name", FilterOperation::Contains, "um")],
        ),
        Preset::new(
            "Released after 1990",
            vec![Predicate::new("year", FilterOperation::GreaterThan, 1990)],
        ),
        Preset::new(
            "Released before 1990",
            vec![Predicate::new(
                "year",
                FilterOperation::LessThanOrEqual,
                1990,
            )],
        ),
    ]
}

/// Owns the session's presets. Append/update only: nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    presets: PresetList,
}

impl PresetStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with [`builtin_presets`].
    pub fn builtin() -> Self {
        Self {
            presets: builtin_presets().into(),
        }
    }

    /// Store seeded from `presets` in order. A repeated name overwrites the
    /// earlier entry, exactly as saving under that name would.
    pub fn seeded(presets: impl IntoIterator<Item = Preset>) -> Result<Self> {
        let mut store = Self::new();
        for preset in presets {
            store.upsert(&preset.name, preset.filter)?;
        }
        Ok(store)
    }

    /// Current snapshot
    pub fn presets(&self) -> PresetList {
        self.presets.clone()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.presets.position(name.trim())
    }

    /// Filter stored at `index`. Callers must handle the detached (-1) case
    /// themselves; any index outside `0..len` is an error.
    pub fn lookup(&self, index: usize) -> Result<&FilterDefinition> {
        self.presets
            .get(index)
            .map(|p| &p.filter)
            .ok_or(PresetError::Index {
                index: index as i64,
                len: self.presets.len(),
            })
    }

    /// Save `filter` under `name`.
    ///
    /// An existing preset with that name gets the new filter and keeps its
    /// position; otherwise the preset is appended. Returns the preset's index
    /// and the new list. Surrounding whitespace in `name` is ignored and a
    /// blank name is refused without touching the store.
    pub fn upsert(&mut self, name: &str, filter: FilterDefinition) -> Result<(usize, PresetList)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::Validation(
                "preset name must not be empty".to_string(),
            ));
        }

        let mut presets: Vec<Preset> = self.presets.to_vec();
        let index = match presets.iter().position(|p| p.name == name) {
            Some(existing) => {
                debug!(name, index = existing, "overwriting preset");
                presets[existing].filter = filter;
                existing
            }
            None => {
                presets.push(Preset::new(name, filter));
                debug!(name, index = presets.len() - 1, "appending preset");
                presets.len() - 1
            }
        };

        self.presets = presets.into();
        Ok((index, self.presets.clone()))
    }
}
