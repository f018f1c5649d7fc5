//! Compact localisation key provider.
//!
//! The localisation YAML parser lives outside this crate; rules only need a
//! key → locale coverage index. Coverage is stored as a bitmask per key,
//! which keeps whole-project indexes small.

use std::collections::BTreeMap;

/// Key → locale coverage index using locale bitmasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalisationKeyProvider {
    locale_index_by_name: BTreeMap<String, u32>,
    key_mask_by_name: BTreeMap<String, u128>,
}

impl LocalisationKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from `(locale, keys)` pairs.
    ///
    /// A locale appearing with no keys still counts towards the known
    /// locale set (and therefore towards `all`-coverage requirements).
    pub fn from_locale_keys(
        entries: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        let mut keys_by_locale: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (locale, keys) in entries {
            keys_by_locale.entry(locale).or_default().extend(keys);
        }

        let locale_index_by_name: BTreeMap<String, u32> = keys_by_locale
            .keys()
            .enumerate()
            .map(|(index, locale)| (locale.clone(), index as u32))
            .collect();

        let mut key_mask_by_name: BTreeMap<String, u128> = BTreeMap::new();
        for (locale, keys) in &keys_by_locale {
            let Some(index) = locale_index_by_name.get(locale) else {
                continue;
            };
            let bit = 1u128 << index;
            for key in keys {
                *key_mask_by_name.entry(key.clone()).or_insert(0) |= bit;
            }
        }

        Self {
            locale_index_by_name,
            key_mask_by_name,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key_mask_by_name.is_empty()
    }

    /// Known locales, ordered by their index.
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<(&str, u32)> = self
            .locale_index_by_name
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
            .collect();
        locales.sort_by_key(|(_, index)| *index);
        locales.into_iter().map(|(name, _)| name).collect()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.key_mask_by_name.contains_key(key)
    }

    pub fn has_key_for_locale(&self, key: &str, locale: &str) -> bool {
        let Some(bit) = self.locale_bit(locale) else {
            return false;
        };
        self.key_mask_by_name
            .get(key)
            .is_some_and(|mask| mask & bit != 0)
    }

    pub fn locales_for_key(&self, key: &str) -> Vec<&str> {
        if !self.has_key(key) {
            return Vec::new();
        }
        self.locales()
            .into_iter()
            .filter(|locale| self.has_key_for_locale(key, locale))
            .collect()
    }

    /// Locales (from `required_locales`, or every known locale) that do not
    /// cover `key`.
    pub fn missing_locales_for_key(
        &self,
        key: &str,
        required_locales: Option<&[String]>,
    ) -> Vec<String> {
        let required: Vec<String> = match required_locales {
            Some(required) => required
                .iter()
                .filter(|locale| self.locale_index_by_name.contains_key(*locale))
                .cloned()
                .collect(),
            None => self.locales().into_iter().map(str::to_string).collect(),
        };

        let mask = self.key_mask_by_name.get(key).copied().unwrap_or(0);
        required
            .into_iter()
            .filter(|locale| {
                self.locale_bit(locale)
                    .is_none_or(|bit| mask & bit == 0)
            })
            .collect()
    }

    fn locale_bit(&self, locale: &str) -> Option<u128> {
        self.locale_index_by_name
            .get(locale)
            .map(|index| 1u128 << index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalisationKeyProvider {
        LocalisationKeyProvider::from_locale_keys([
            (
                "english".to_string(),
                vec!["known_key".to_string(), "english_only".to_string()],
            ),
            ("german".to_string(), vec!["known_key".to_string()]),
        ])
    }

    #[test]
    fn tracks_key_existence_and_coverage() {
        let provider = provider();
        assert!(provider.has_key("known_key"));
        assert!(provider.has_key("english_only"));
        assert!(!provider.has_key("missing"));
        assert!(provider.has_key_for_locale("known_key", "german"));
        assert!(!provider.has_key_for_locale("english_only", "german"));
    }

    #[test]
    fn reports_missing_locales() {
        let provider = provider();
        assert!(provider.missing_locales_for_key("known_key", None).is_empty());
        assert_eq!(
            provider.missing_locales_for_key("english_only", None),
            vec!["german".to_string()]
        );
        assert_eq!(
            provider.missing_locales_for_key("missing", None),
            vec!["english".to_string(), "german".to_string()]
        );
    }

    #[test]
    fn empty_locale_still_counts_toward_coverage() {
        let provider = LocalisationKeyProvider::from_locale_keys([
            ("english".to_string(), vec!["key".to_string()]),
            ("german".to_string(), Vec::new()),
        ]);
        assert_eq!(provider.locales().len(), 2);
        assert_eq!(
            provider.missing_locales_for_key("key", None),
            vec!["german".to_string()]
        );
    }
}
