use std::collections::BTreeMap;

use serde::Deserialize;

/// Keyword translations, `key -> {locale -> word}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    keys: BTreeMap<String, BTreeMap<String, String>>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        locale: impl Into<String>,
        word: impl Into<String>,
    ) -> &mut Self {
        self.keys
            .entry(key.into())
            .or_default()
            .insert(locale.into(), word.into());
        self
    }

    pub fn translate(&self, key: &str, locale: &str) -> Option<&str> {
        self.keys.get(key)?.get(locale).map(String::as_str)
    }

    /// Every known word for `key`, the key itself when it has no translation.
    pub fn words<'a>(&'a self, key: &'a str) -> Vec<&'a str> {
        match self.keys.get(key) {
            Some(m) if !m.is_empty() => m.values().map(String::as_str).collect(),
            _ => vec![key],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Available locale codes plus the keyword table. Fixed at boot.
#[derive(Debug, Clone, Default)]
pub struct Locales {
    available: Vec<String>,
    translations: TranslationTable,
}

impl Locales {
    pub fn new<I, S>(available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: available.into_iter().map(Into::into).collect(),
            translations: TranslationTable::new(),
        }
    }

    pub fn with_translations(mut self, translations: TranslationTable) -> Self {
        self.translations = translations;
        self
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn translations(&self) -> &TranslationTable {
        &self.translations
    }

    pub fn translations_mut(&mut self) -> &mut TranslationTable {
        &mut self.translations
    }

    /// The first available locale, used when no provider is configured.
    pub fn default_locale(&self) -> &str {
        self.available.first().map(String::as_str).unwrap_or("")
    }
}
