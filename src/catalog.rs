//! The dataset catalog: a name → descriptor mapping.
//!
//! [`Catalog`] is a plain value. Every mutation returns a new catalog and the
//! caller decides when to persist it through a [`CatalogStore`]. Names are
//! unique and case-sensitive; iteration is always in name order.

pub mod store;

pub use store::{CATALOG_DIR, CATALOG_FILE, CatalogStore, FsCatalogStore, MemoryCatalogStore};

use crate::dataset::DatasetDescriptor;
use crate::error::{DataPulseError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    datasets: BTreeMap<String, DatasetDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `descriptor`, replacing any dataset with the same name.
    #[must_use]
    pub fn upsert(&self, descriptor: DatasetDescriptor) -> Self {
        let mut datasets = self.datasets.clone();
        datasets.insert(descriptor.name.clone(), descriptor);
        Self { datasets }
    }

    /// Insert `descriptor`, rejecting names that are already cataloged.
    pub fn insert_new(&self, descriptor: DatasetDescriptor) -> Result<Self> {
        if self.contains(&descriptor.name) {
            return Err(DataPulseError::DatasetExists(descriptor.name));
        }
        Ok(self.upsert(descriptor))
    }

    pub fn remove(&self, name: &str) -> Result<Self> {
        if !self.contains(name) {
            return Err(DataPulseError::UnknownDataset(name.to_owned()));
        }
        let mut datasets = self.datasets.clone();
        datasets.remove(name);
        Ok(Self { datasets })
    }

    pub fn get(&self, name: &str) -> Option<&DatasetDescriptor> {
        self.datasets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Descriptors in name order.
    pub fn list(&self) -> Vec<&DatasetDescriptor> {
        self.datasets.values().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.datasets.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl FromIterator<DatasetDescriptor> for Catalog {
    fn from_iter<I: IntoIterator<Item = DatasetDescriptor>>(iter: I) -> Self {
        Self {
            datasets: iter.into_iter().map(|d| (d.name.clone(), d)).collect(),
        }
    }
}
