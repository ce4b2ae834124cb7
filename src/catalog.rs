//! Part catalog collaborator. The queue only asks whether a part exists; the
//! catalog itself is managed elsewhere and is read-only here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub trait PartCatalog: Send + Sync {
    fn part_exists(&self, part_id: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub units_in_inventory: u32,
}

impl Part {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            material: String::new(),
            status: String::new(),
            version: String::new(),
            units_in_inventory: 0,
        }
    }
}

/// Catalog snapshot held in memory, keyed by part id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPartCatalog {
    parts: BTreeMap<String, Part>,
}

impl InMemoryPartCatalog {
    pub fn new(parts: impl IntoIterator<Item = Part>) -> Self {
        Self {
            parts: parts.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, part_id: &str) -> Option<&Part> {
        self.parts.get(part_id)
    }

    /// All parts, ordered by id.
    pub fn list(&self) -> Vec<Part> {
        self.parts.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartCatalog for InMemoryPartCatalog {
    fn part_exists(&self, part_id: &str) -> bool {
        self.parts.contains_key(part_id)
    }
}
