//! The landing grid's city list, persisted under the `cities` cache key.

use citysky_core::StorageError;
use citysky_weather::{Cache, CacheKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityList {
    names: Vec<String>,
}

impl CityList {
    /// Build a list, trimming names and dropping blanks and duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !list.contains(name) {
                list.names.push(name.to_string());
            }
        }
        list
    }

    /// The persisted list, or `defaults` when nothing valid is stored.
    pub fn load(cache: &Cache, defaults: &[String]) -> Self {
        match cache.get::<Vec<String>>(&CacheKey::Cities) {
            Some(stored) => Self::new(stored),
            None => Self::new(defaults),
        }
    }

    pub fn save(&self, cache: &Cache) -> Result<(), StorageError> {
        cache.put(&CacheKey::Cities, &self.names)
    }

    /// Forget the persisted list.
    pub fn clear_saved(cache: &Cache) -> Result<(), StorageError> {
        cache.delete(&CacheKey::Cities)
    }

    /// Case-insensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a city (case-insensitive). Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.names.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }
}
