// Per-job at-most-once bookkeeping

use crate::model::Category;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// A set of keys where claiming is a single atomic check-and-insert.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    keys: Mutex<HashSet<String>>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `key` is seen, false forever after.
    pub fn try_claim(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One registry per category, owned by a single job.
#[derive(Debug)]
pub struct Registries {
    by_category: HashMap<Category, DedupRegistry>,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            by_category: Category::ALL
                .iter()
                .map(|category| (*category, DedupRegistry::new()))
                .collect(),
        }
    }

    pub fn get(&self, category: Category) -> &DedupRegistry {
        // every category is inserted in new()
        &self.by_category[&category]
    }

    pub fn try_claim(&self, category: Category, key: &str) -> bool {
        self.get(category).try_claim(key)
    }

    /// Number of claimed keys per category, skipping empty ones.
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.by_category
            .iter()
            .map(|(category, registry)| (*category, registry.len()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
