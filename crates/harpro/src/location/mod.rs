//! Three-level island → province → city taxonomy backing the location selects.
//!
//! Selection is label based: the form stores display labels and every lookup
//! resolves a label back to its node by scanning only the siblings at that
//! level. An unmatched label is never an error; callers simply receive an
//! empty option list.

mod loader;

use serde::Serialize;

pub use loader::{HierarchyError, HierarchyLoader};

/// Depth of a node inside the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationLevel {
    Island,
    Province,
    City,
}

impl LocationLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::Island, Self::Province, Self::City]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Island => "Pulau",
            Self::Province => "Provinsi",
            Self::City => "Kota/Kabupaten",
        }
    }

    /// Name of the form field holding this level's selection.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Island => "pulau",
            Self::Province => "provinsi",
            Self::City => "kota",
        }
    }

    pub fn from_field_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pulau" | "island" => Some(Self::Island),
            "provinsi" | "province" => Some(Self::Province),
            "kota" | "city" => Some(Self::City),
            _ => None,
        }
    }
}

/// One entry at any level of the hierarchy. Cities carry no children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationNode {
    pub key: String,
    pub label: String,
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<LocationNode>) -> Self {
        self.children = children;
        self
    }

    /// Resolve a child by its display label.
    pub fn child(&self, label: &str) -> Option<&LocationNode> {
        find_by_label(&self.children, label)
    }

    pub fn child_labels(&self) -> Vec<&str> {
        self.children.iter().map(|node| node.label.as_str()).collect()
    }
}

/// Immutable island → province → city tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationHierarchy {
    islands: Vec<LocationNode>,
}

impl LocationHierarchy {
    pub(crate) fn from_islands(islands: Vec<LocationNode>) -> Self {
        Self { islands }
    }

    /// The data set shipped with the crate.
    pub fn bundled() -> Self {
        HierarchyLoader::bundled()
    }

    pub fn island_nodes(&self) -> &[LocationNode] {
        &self.islands
    }

    pub fn islands(&self) -> Vec<&str> {
        self.islands.iter().map(|node| node.label.as_str()).collect()
    }

    pub fn island(&self, label: &str) -> Option<&LocationNode> {
        find_by_label(&self.islands, label)
    }

    pub fn province(&self, island: &str, province: &str) -> Option<&LocationNode> {
        self.island(island)?.child(province)
    }

    pub fn city(&self, island: &str, province: &str, city: &str) -> Option<&LocationNode> {
        self.province(island, province)?.child(city)
    }

    /// Province labels under `island`, in insertion order. Empty when unresolved.
    pub fn provinces(&self, island: &str) -> Vec<&str> {
        self.island(island)
            .map(LocationNode::child_labels)
            .unwrap_or_default()
    }

    /// City labels under `island`/`province`. Empty when either is unresolved.
    pub fn cities(&self, island: &str, province: &str) -> Vec<&str> {
        self.province(island, province)
            .map(LocationNode::child_labels)
            .unwrap_or_default()
    }

    /// Whether the full triple names a city present in the hierarchy.
    pub fn resolve(&self, island: &str, province: &str, city: &str) -> bool {
        self.city(island, province, city).is_some()
    }

    /// Stable keys for a label triple, resolved level by level.
    pub fn keys(&self, island: &str, province: &str, city: &str) -> Option<[&str; 3]> {
        let island = self.island(island)?;
        let province = island.child(province)?;
        let city = province.child(city)?;
        Some([
            island.key.as_str(),
            province.key.as_str(),
            city.key.as_str(),
        ])
    }

    pub fn city_count(&self) -> usize {
        self.islands
            .iter()
            .flat_map(|island| island.children.iter())
            .map(|province| province.children.len())
            .sum()
    }
}

fn find_by_label<'a>(nodes: &'a [LocationNode], label: &str) -> Option<&'a LocationNode> {
    if label.is_empty() {
        return None;
    }
    nodes.iter().find(|node| node.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LocationHierarchy {
        LocationHierarchy::from_islands(vec![
            LocationNode::new("jawa", "Jawa").with_children(vec![
                LocationNode::new("yogyakarta", "Yogyakarta").with_children(vec![
                    LocationNode::new("sleman", "Sleman"),
                    LocationNode::new("bantul", "Bantul"),
                ]),
                LocationNode::new("jawa_tengah", "Jawa Tengah")
                    .with_children(vec![LocationNode::new("semarang", "Semarang")]),
            ]),
            LocationNode::new("bali", "Bali").with_children(vec![LocationNode::new(
                "bali",
                "Bali",
            )
            .with_children(vec![LocationNode::new("denpasar", "Denpasar")])]),
        ])
    }

    #[test]
    fn provinces_follow_insertion_order() {
        let hierarchy = sample();
        assert_eq!(hierarchy.provinces("Jawa"), vec!["Yogyakarta", "Jawa Tengah"]);
        assert_eq!(hierarchy.cities("Jawa", "Yogyakarta"), vec!["Sleman", "Bantul"]);
    }

    #[test]
    fn unmatched_labels_yield_empty_lists() {
        let hierarchy = sample();
        assert!(hierarchy.provinces("").is_empty());
        assert!(hierarchy.provinces("Sumatera").is_empty());
        assert!(hierarchy.cities("Jawa", "").is_empty());
        assert!(hierarchy.cities("Bali", "Yogyakarta").is_empty());
    }

    #[test]
    fn labels_are_scoped_to_their_parent() {
        let hierarchy = sample();
        assert_eq!(hierarchy.provinces("Bali"), vec!["Bali"]);
        assert!(hierarchy.resolve("Bali", "Bali", "Denpasar"));
        assert!(!hierarchy.resolve("Jawa", "Yogyakarta", "Denpasar"));
    }

    #[test]
    fn keys_resolve_from_labels() {
        let hierarchy = sample();
        assert_eq!(
            hierarchy.keys("Jawa", "Jawa Tengah", "Semarang"),
            Some(["jawa", "jawa_tengah", "semarang"])
        );
        assert_eq!(hierarchy.keys("Jawa", "Jawa Tengah", "Sleman"), None);
        assert_eq!(hierarchy.city_count(), 4);
    }

    #[test]
    fn level_field_names_round_trip() {
        for level in LocationLevel::ordered() {
            assert_eq!(LocationLevel::from_field_name(level.field_name()), Some(level));
        }
        assert_eq!(LocationLevel::from_field_name("kecamatan"), None);
    }
}
