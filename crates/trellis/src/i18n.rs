//! Text translation for control labels and option titles.
//!
//! Controls never format user-visible text themselves; every label and
//! option title passes through a [`Translate`] implementation. Any
//! `Fn(&str) -> String` closure works, [`Identity`] leaves text alone, and
//! [`Catalog`] is a small in-memory message table with switchable locales.
//!
//! # Example
//!
//! ```
//! use trellis::i18n::{Catalog, Translate};
//!
//! let catalog = Catalog::new("en");
//! catalog.insert("de", "Colour", "Farbe");
//!
//! assert_eq!(catalog.translate("Colour"), "Colour");
//! catalog.set_locale("de");
//! assert_eq!(catalog.translate("Colour"), "Farbe");
//! ```

use std::collections::HashMap;

use parking_lot::RwLock;

/// Translates a source string into display text.
pub trait Translate: Send + Sync {
    /// Translate `text`. Unknown text is returned unchanged.
    fn translate(&self, text: &str) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn translate(&self, text: &str) -> String {
        self(text)
    }
}

/// A translator that returns its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Translate for Identity {
    fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

/// An in-memory message catalog keyed by locale.
///
/// Lookups fall back to the source text when the active locale has no entry.
#[derive(Debug, Default)]
pub struct Catalog {
    locale: RwLock<String>,
    messages: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl Catalog {
    /// Create an empty catalog with `locale` active.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: RwLock::new(locale.into()),
            messages: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace one message.
    pub fn insert(&self, locale: &str, source: impl Into<String>, text: impl Into<String>) {
        self.messages
            .write()
            .entry(locale.to_string())
            .or_default()
            .insert(source.into(), text.into());
    }

    /// Add several messages for one locale.
    pub fn extend<I, S, T>(&self, locale: &str, messages: I)
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut table = self.messages.write();
        let entries = table.entry(locale.to_string()).or_default();
        for (source, text) in messages {
            entries.insert(source.into(), text.into());
        }
    }

    /// The active locale.
    pub fn locale(&self) -> String {
        self.locale.read().clone()
    }

    /// Switch the active locale.
    ///
    /// Already-rendered controls keep their text until they re-render or
    /// rebuild their option list.
    pub fn set_locale(&self, locale: impl Into<String>) {
        *self.locale.write() = locale.into();
    }
}

impl Translate for Catalog {
    fn translate(&self, text: &str) -> String {
        let locale = self.locale.read();
        self.messages
            .read()
            .get(locale.as_str())
            .and_then(|entries| entries.get(text))
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(Identity.translate("red"), "red");
        assert_eq!(Identity.translate(""), "");
    }

    #[test]
    fn test_closure_translator() {
        let upper = |text: &str| text.to_uppercase();
        assert_eq!(upper.translate("red"), "RED");
    }

    #[test]
    fn test_catalog_falls_back_to_source() {
        let catalog = Catalog::new("fr");
        catalog.extend("fr", [("red", "rouge"), ("green", "vert")]);

        assert_eq!(catalog.translate("red"), "rouge");
        assert_eq!(catalog.translate("blue"), "blue");
    }

    #[test]
    fn test_catalog_locale_switch() {
        let catalog = Catalog::new("en");
        catalog.insert("fr", "red", "rouge");

        assert_eq!(catalog.translate("red"), "red");
        catalog.set_locale("fr");
        assert_eq!(catalog.locale(), "fr");
        assert_eq!(catalog.translate("red"), "rouge");
    }
}
