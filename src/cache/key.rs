//! Cache key composition
//!
//! Component keys look like `Acme_1.0.0_greeting_false_#fr`, with the locale
//! always the suffix after `_#`.

/// Component used when none is given
pub const DEFAULT_COMPONENT: &str = "default";

/// Locale used when none is given
pub const DEFAULT_LOCALE: &str = "en";

/// Separator between the key body and the locale
pub const LOCALE_SEPARATOR: &str = "_#";

/// Cache key helpers
#[derive(Debug, Clone, Copy)]
pub struct CacheKey;

impl CacheKey {
    /// Compose the key of a component message map
    pub fn compose(
        product: &str,
        version: &str,
        component: Option<&str>,
        pseudo: bool,
        locale: Option<&str>,
    ) -> String {
        format!(
            "{product}_{version}_{}_{pseudo}{LOCALE_SEPARATOR}{}",
            or_default(component, DEFAULT_COMPONENT),
            or_default(locale, DEFAULT_LOCALE),
        )
    }
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(default)
}
