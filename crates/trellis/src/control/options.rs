//! Canonical option lists.
//!
//! The `options` property accepts either plain labels (`["red", "green"]`)
//! or `{title, name}` entries. The first read migrates plain labels to
//! entries once, translating each label into its title, and stores the
//! canonical form back so later reads skip the translation work.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_core::logging::targets;
use trellis_core::{PropertyStore, Result, TrellisError};

use crate::i18n::Translate;

/// Name of the option-list property.
pub const OPTIONS: &str = "options";

/// One selectable option: what is shown and what is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    /// Human-readable, translatable text.
    pub title: String,
    /// Logical value written to the store when selected.
    pub name: String,
}

impl OptionEntry {
    /// Create an entry.
    pub fn new(title: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            name: name.into(),
        }
    }
}

/// Outcome of [`canonicalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// The canonical entries.
    pub entries: Vec<OptionEntry>,
    /// Whether the input was plain labels and had to be rewritten.
    pub migrated: bool,
}

/// Convert a raw `options` value to canonical entries.
///
/// `null` yields an empty list. A list led by a string must consist of
/// strings only; each becomes `{title: translate(s), name: s}`. A list of
/// entries is returned as-is, without re-translating titles.
pub fn canonicalize(raw: &Value, translator: &dyn Translate) -> Result<Canonical> {
    let items = match raw {
        Value::Null => {
            return Ok(Canonical {
                entries: Vec::new(),
                migrated: false,
            });
        }
        Value::Array(items) => items,
        other => {
            return Err(TrellisError::invalid_value(
                OPTIONS,
                format!("expected a list of options, got {other}"),
            ));
        }
    };

    if !items.first().is_some_and(Value::is_string) {
        let entries = serde_json::from_value(raw.clone())
            .map_err(|err| TrellisError::invalid_value(OPTIONS, err.to_string()))?;
        return Ok(Canonical {
            entries,
            migrated: false,
        });
    }

    let entries = items
        .iter()
        .map(|item| match item {
            Value::String(label) => Ok(OptionEntry::new(translator.translate(label), label.as_str())),
            other => Err(TrellisError::invalid_value(
                OPTIONS,
                format!("expected a plain label, got {other}"),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Canonical {
        entries,
        migrated: true,
    })
}

/// Reads the `options` property of a store in canonical form.
#[derive(Clone)]
pub struct OptionsListNormalizer {
    store: Arc<PropertyStore>,
    translator: Arc<dyn Translate>,
}

impl OptionsListNormalizer {
    /// Create a normalizer over `store`.
    pub fn new(store: Arc<PropertyStore>, translator: Arc<dyn Translate>) -> Self {
        Self { store, translator }
    }

    /// The canonical option list, migrating the stored value on first use.
    ///
    /// The migrated list is written back silently: it is the same list in
    /// another shape, so no change is announced.
    pub fn options_property(&self) -> Result<Vec<OptionEntry>> {
        let raw = self.store.get(OPTIONS)?;
        let Canonical { entries, migrated } = canonicalize(&raw, self.translator.as_ref())?;

        if migrated {
            tracing::debug!(target: targets::CONTROL, count = entries.len(), "migrating plain option labels");
            let canonical = serde_json::to_value(&entries)
                .map_err(|err| TrellisError::invalid_value(OPTIONS, err.to_string()))?;
            self.store.set_silent(OPTIONS, canonical)?;
        }

        Ok(entries)
    }
}

impl std::fmt::Debug for OptionsListNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsListNormalizer")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
