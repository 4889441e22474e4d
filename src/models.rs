//! Core data structures for translation data
//!
//! Translation data is nested three levels deep:
//! product → locale → component → `{key: translated string}`.
//!
//! The types are plain values. Shared state is never mutated in place; the
//! cache builds a new [`ProductData`] and swaps it in as a whole.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Messages of a single component in a single locale
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentData {
    /// Component name
    name: String,

    /// Message key → translated string
    messages: HashMap<String, String>,
}

impl ComponentData {
    /// Create a component with no messages
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: HashMap::new(),
        }
    }

    /// Create a component from a complete message map
    pub fn with_messages(name: impl Into<String>, messages: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            messages,
        }
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full message map
    pub fn messages(&self) -> &HashMap<String, String> {
        &self.messages
    }

    /// Look up one message
    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the component has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume and return the message map
    pub fn into_messages(self) -> HashMap<String, String> {
        self.messages
    }
}

/// All components of one locale
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocaleData {
    /// Locale tag (e.g. `fr`, `zh-Hans`)
    locale: String,

    /// Component name → component data
    components: HashMap<String, ComponentData>,
}

impl LocaleData {
    /// Create an empty locale
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            components: HashMap::new(),
        }
    }

    /// Locale tag
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Get a component by name
    pub fn component(&self, name: &str) -> Option<&ComponentData> {
        self.components.get(name)
    }

    /// Insert or replace a component
    pub fn insert(&mut self, component: ComponentData) {
        self.components
            .insert(component.name().to_string(), component);
    }

    /// Iterate over components
    pub fn components(&self) -> impl Iterator<Item = &ComponentData> {
        self.components.values()
    }

    /// Component names
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Whether the locale has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// All translation data of one product version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductData {
    product_name: String,
    version_name: String,

    /// Locale tag → locale data
    locales: HashMap<String, LocaleData>,
}

impl ProductData {
    /// Create empty product data
    pub fn new(product_name: impl Into<String>, version_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            version_name: version_name.into(),
            locales: HashMap::new(),
        }
    }

    /// Product name
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Version name
    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    /// Get the data of one locale
    pub fn locale(&self, locale: &str) -> Option<&LocaleData> {
        self.locales.get(locale)
    }

    /// Get one component of one locale
    pub fn component(&self, locale: &str, component: &str) -> Option<&ComponentData> {
        self.locales.get(locale)?.component(component)
    }

    /// Insert or replace a whole locale
    pub fn insert_locale(&mut self, data: LocaleData) {
        self.locales.insert(data.locale().to_string(), data);
    }

    /// Insert or replace one component, creating the locale when needed
    pub fn insert_component(&mut self, locale: &str, component: ComponentData) {
        self.locales
            .entry(locale.to_string())
            .or_insert_with(|| LocaleData::new(locale))
            .insert(component);
    }

    /// Iterate over locales
    pub fn locales(&self) -> impl Iterator<Item = &LocaleData> {
        self.locales.values()
    }

    /// Sorted locale tags
    pub fn locale_tags(&self) -> BTreeSet<String> {
        self.locales.keys().cloned().collect()
    }

    /// Sorted union of component names across all locales
    pub fn component_names(&self) -> BTreeSet<String> {
        self.locales
            .values()
            .flat_map(|l| l.component_names().map(str::to_string))
            .collect()
    }

    /// Iterate over every (locale, component) pair
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &ComponentData)> {
        self.locales
            .values()
            .flat_map(|l| l.components().map(move |c| (l.locale(), c)))
    }

    /// Number of (locale, component) pairs
    pub fn pair_count(&self) -> usize {
        self.locales.values().map(|l| l.components.len()).sum()
    }

    /// Whether there is no component data at all
    pub fn is_empty(&self) -> bool {
        self.pair_count() == 0
    }

    /// Upsert every (locale, component) pair of `other` into `self`
    ///
    /// Pairs present only in `self` are left untouched.
    pub fn merge(&mut self, other: &ProductData) {
        for (locale, component) in other.pairs() {
            self.insert_component(locale, component.clone());
        }
    }
}
