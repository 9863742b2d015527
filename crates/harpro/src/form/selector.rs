use serde::Serialize;

use super::record::PropertyFormRecord;
use crate::location::{LocationHierarchy, LocationLevel};

/// Option lists for the three location selects, derived from one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationOptions {
    #[serde(rename = "pulau")]
    pub islands: Vec<String>,
    #[serde(rename = "provinsi")]
    pub provinces: Vec<String>,
    #[serde(rename = "kota")]
    pub cities: Vec<String>,
}

impl LocationOptions {
    pub fn for_level(&self, level: LocationLevel) -> &[String] {
        match level {
            LocationLevel::Island => &self.islands,
            LocationLevel::Province => &self.provinces,
            LocationLevel::City => &self.cities,
        }
    }

    /// A select is enabled once its parent has a value and there is something to pick.
    pub fn is_selectable(&self, level: LocationLevel) -> bool {
        !self.for_level(level).is_empty()
    }
}

/// Applies location choices to a record and recomputes downstream options.
///
/// Options are never cached: every call re-derives them from the record it is
/// given, so a select can never show children of a stale parent.
#[derive(Debug, Clone, Copy)]
pub struct CascadingSelector<'h> {
    hierarchy: &'h LocationHierarchy,
}

impl<'h> CascadingSelector<'h> {
    pub fn new(hierarchy: &'h LocationHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &'h LocationHierarchy {
        self.hierarchy
    }

    pub fn select_island(&self, label: &str, record: &PropertyFormRecord) -> PropertyFormRecord {
        self.apply_selection(LocationLevel::Island, label, record)
    }

    pub fn select_province(
        &self,
        label: &str,
        record: &PropertyFormRecord,
    ) -> PropertyFormRecord {
        self.apply_selection(LocationLevel::Province, label, record)
    }

    pub fn select_city(&self, label: &str, record: &PropertyFormRecord) -> PropertyFormRecord {
        self.apply_selection(LocationLevel::City, label, record)
    }

    /// Labels that do not exist in the hierarchy are still stored; the
    /// downstream option lists simply come back empty.
    pub fn apply_selection(
        &self,
        level: LocationLevel,
        label: &str,
        record: &PropertyFormRecord,
    ) -> PropertyFormRecord {
        record.with_selection(level, label)
    }

    pub fn options(&self, record: &PropertyFormRecord) -> LocationOptions {
        LocationOptions {
            islands: owned(self.hierarchy.islands()),
            provinces: owned(self.hierarchy.provinces(&record.island)),
            cities: owned(self.hierarchy.cities(&record.island, &record.province)),
        }
    }

    /// Whether the record's triple names a real city.
    pub fn is_resolved(&self, record: &PropertyFormRecord) -> bool {
        self.hierarchy
            .resolve(&record.island, &record.province, &record.city)
    }
}

fn owned(labels: Vec<&str>) -> Vec<String> {
    labels.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bundled() -> LocationHierarchy {
        LocationHierarchy::bundled()
    }

    #[test]
    fn options_narrow_as_selections_are_made() {
        let hierarchy = bundled();
        let selector = CascadingSelector::new(&hierarchy);
        let record = PropertyFormRecord::default();

        let options = selector.options(&record);
        assert!(options.islands.contains(&"Jawa".to_string()));
        assert!(options.provinces.is_empty());
        assert!(options.cities.is_empty());
        assert!(!options.is_selectable(LocationLevel::Province));

        let record = selector.select_island("Jawa", &record);
        let options = selector.options(&record);
        assert!(options.provinces.contains(&"Yogyakarta".to_string()));
        assert!(options.cities.is_empty());

        let record = selector.select_province("Yogyakarta", &record);
        let options = selector.options(&record);
        assert_eq!(options.cities[0], "Sleman");

        let record = selector.select_city("Sleman", &record);
        assert!(selector.is_resolved(&record));
    }

    #[test]
    fn switching_island_resets_province_and_city() {
        let hierarchy = bundled();
        let selector = CascadingSelector::new(&hierarchy);
        let record = PropertyFormRecord::default();
        let record = selector.select_island("Sumatera", &record);
        let record = selector.select_province("Sumatera Barat", &record);
        let record = selector.select_city("Padang", &record);

        let record = selector.select_island("Jawa", &record);
        assert_eq!(record.island, "Jawa");
        assert!(record.province.is_empty());
        assert!(record.city.is_empty());
        assert!(selector.options(&record).cities.is_empty());
    }

    #[test]
    fn unknown_label_is_kept_with_empty_downstream_options() {
        let hierarchy = bundled();
        let selector = CascadingSelector::new(&hierarchy);
        let record = selector.select_island("Atlantis", &PropertyFormRecord::default());
        assert_eq!(record.island, "Atlantis");
        let options = selector.options(&record);
        assert!(options.provinces.is_empty());
        assert!(options.cities.is_empty());
        assert!(!selector.is_resolved(&record));
    }

    #[test]
    fn select_city_leaves_ancestors_alone() {
        let hierarchy = bundled();
        let selector = CascadingSelector::new(&hierarchy);
        let record = PropertyFormRecord::default();
        let record = selector.select_island("Jawa", &record);
        let record = selector.select_province("Yogyakarta", &record);
        let record = selector.select_city("Bantul", &record);
        let record = selector.select_city("Sleman", &record);
        assert_eq!(
            (record.island.as_str(), record.province.as_str(), record.city.as_str()),
            ("Jawa", "Yogyakarta", "Sleman")
        );
    }

    proptest! {
        #[test]
        fn province_options_match_hierarchy_for_every_island(
            island_index in 0usize..5,
            previous_index in 0usize..5,
        ) {
            let hierarchy = bundled();
            let selector = CascadingSelector::new(&hierarchy);
            let islands = hierarchy.island_nodes();
            let island = &islands[island_index % islands.len()];
            let previous = &islands[previous_index % islands.len()];

            let mut record = selector.select_island(&previous.label, &PropertyFormRecord::default());
            if let Some(province) = previous.children.first() {
                record = selector.select_province(&province.label, &record);
                if let Some(city) = province.children.first() {
                    record = selector.select_city(&city.label, &record);
                }
            }

            let record = selector.select_island(&island.label, &record);
            let options = selector.options(&record);
            let expected: Vec<String> =
                island.children.iter().map(|node| node.label.clone()).collect();
            prop_assert_eq!(options.provinces, expected);
            prop_assert!(record.province.is_empty());
            prop_assert!(record.city.is_empty());
        }
    }
}
