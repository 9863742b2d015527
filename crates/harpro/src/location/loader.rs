use std::fmt;
use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{LocationHierarchy, LocationLevel, LocationNode};

/// Island → provinces → cities shipped with the crate.
const BUNDLED: &[(&str, &[(&str, &[&str])])] = &[
    (
        "Jawa",
        &[
            (
                "DKI Jakarta",
                &[
                    "Jakarta Pusat",
                    "Jakarta Selatan",
                    "Jakarta Barat",
                    "Jakarta Timur",
                    "Jakarta Utara",
                ],
            ),
            ("Jawa Barat", &["Bandung", "Bekasi", "Bogor", "Depok"]),
            ("Banten", &["Tangerang", "Tangerang Selatan", "Serang"]),
            ("Jawa Tengah", &["Semarang", "Surakarta", "Magelang"]),
            (
                "Yogyakarta",
                &[
                    "Sleman",
                    "Bantul",
                    "Kota Yogyakarta",
                    "Kulon Progo",
                    "Gunung Kidul",
                ],
            ),
            ("Jawa Timur", &["Surabaya", "Malang", "Sidoarjo"]),
        ],
    ),
    (
        "Sumatera",
        &[
            ("Sumatera Utara", &["Medan", "Binjai"]),
            ("Sumatera Barat", &["Padang", "Bukittinggi"]),
            ("Riau", &["Pekanbaru"]),
            ("Sumatera Selatan", &["Palembang"]),
            ("Lampung", &["Bandar Lampung"]),
        ],
    ),
    (
        "Kalimantan",
        &[
            ("Kalimantan Timur", &["Balikpapan", "Samarinda"]),
            ("Kalimantan Barat", &["Pontianak"]),
            ("Kalimantan Selatan", &["Banjarmasin"]),
        ],
    ),
    (
        "Sulawesi",
        &[
            ("Sulawesi Selatan", &["Makassar"]),
            ("Sulawesi Utara", &["Manado"]),
        ],
    ),
    (
        "Bali & Nusa Tenggara",
        &[
            ("Bali", &["Denpasar", "Badung", "Gianyar"]),
            ("Nusa Tenggara Barat", &["Mataram"]),
        ],
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("unable to read location data from {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed location JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed location CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("duplicate {level} label '{label}' under '{parent}'")]
    DuplicateLabel {
        level: &'static str,
        label: String,
        parent: String,
    },
    #[error("empty {level} label under '{parent}'")]
    EmptyLabel { level: &'static str, parent: String },
    #[error("location data contains no islands")]
    Empty,
    #[error("unsupported location data file {}; expected .json or .csv", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Builds a [`LocationHierarchy`] from the bundled table, a `lokasi` JSON
/// document, or a flat `pulau,provinsi,kota` CSV export.
pub struct HierarchyLoader;

impl HierarchyLoader {
    pub fn bundled() -> LocationHierarchy {
        let islands = BUNDLED
            .iter()
            .map(|(island, provinces)| {
                let provinces = provinces
                    .iter()
                    .map(|(province, cities)| {
                        let cities = cities
                            .iter()
                            .map(|city| LocationNode::new(slugify(city), *city))
                            .collect();
                        LocationNode::new(slugify(province), *province).with_children(cities)
                    })
                    .collect();
                LocationNode::new(slugify(island), *island).with_children(provinces)
            })
            .collect();
        LocationHierarchy::from_islands(islands)
    }

    /// Load from disk, choosing the parser from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<LocationHierarchy, HierarchyError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let file = File::open(path).map_err(|source| HierarchyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let hierarchy = match extension.as_deref() {
            Some("json") => Self::from_json_reader(file)?,
            Some("csv") => Self::from_csv_reader(file)?,
            _ => return Err(HierarchyError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(
            path = %path.display(),
            islands = hierarchy.island_nodes().len(),
            cities = hierarchy.city_count(),
            "location hierarchy loaded"
        );
        Ok(hierarchy)
    }

    /// Parse the `{ key: { label, provinsi: { key: { label, kota: [{ label }] } } } }` shape.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<LocationHierarchy, HierarchyError> {
        let raw: OrderedEntries<RawIsland> = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(document: &str) -> Result<LocationHierarchy, HierarchyError> {
        let raw: OrderedEntries<RawIsland> = serde_json::from_str(document)?;
        Self::from_raw(raw)
    }

    /// Parse a headered `pulau,provinsi,kota` export; rows group by first appearance.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<LocationHierarchy, HierarchyError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut islands: Vec<LocationNode> = Vec::new();

        for row in csv_reader.deserialize::<CsvRow>() {
            let row = row?;
            require_label(LocationLevel::Island, &row.pulau, "root")?;
            require_label(LocationLevel::Province, &row.provinsi, &row.pulau)?;
            require_label(LocationLevel::City, &row.kota, &row.provinsi)?;

            let island = match islands.iter().position(|node| node.label == row.pulau) {
                Some(index) => &mut islands[index],
                None => {
                    islands.push(LocationNode::new(slugify(&row.pulau), row.pulau.clone()));
                    let last = islands.len() - 1;
                    &mut islands[last]
                }
            };

            let province = match island
                .children
                .iter()
                .position(|node| node.label == row.provinsi)
            {
                Some(index) => &mut island.children[index],
                None => {
                    island
                        .children
                        .push(LocationNode::new(slugify(&row.provinsi), row.provinsi.clone()));
                    let last = island.children.len() - 1;
                    &mut island.children[last]
                }
            };

            if province.child(&row.kota).is_some() {
                return Err(HierarchyError::DuplicateLabel {
                    level: LocationLevel::City.label(),
                    label: row.kota,
                    parent: row.provinsi,
                });
            }
            province
                .children
                .push(LocationNode::new(slugify(&row.kota), row.kota));
        }

        if islands.is_empty() {
            return Err(HierarchyError::Empty);
        }
        Ok(LocationHierarchy::from_islands(islands))
    }

    fn from_raw(raw: OrderedEntries<RawIsland>) -> Result<LocationHierarchy, HierarchyError> {
        if raw.0.is_empty() {
            return Err(HierarchyError::Empty);
        }

        let mut islands = Vec::with_capacity(raw.0.len());
        for (island_key, island) in raw.0 {
            let label = island.label.trim().to_string();
            require_label(LocationLevel::Island, &label, "root")?;
            require_unique(LocationLevel::Island, &islands, &label, "root")?;

            let mut provinces = Vec::with_capacity(island.provinsi.0.len());
            for (province_key, province) in island.provinsi.0 {
                let province_label = province.label.trim().to_string();
                require_label(LocationLevel::Province, &province_label, &label)?;
                require_unique(LocationLevel::Province, &provinces, &province_label, &label)?;

                let mut cities = Vec::with_capacity(province.kota.len());
                for city in province.kota {
                    let city_label = city.label.trim().to_string();
                    require_label(LocationLevel::City, &city_label, &province_label)?;
                    require_unique(LocationLevel::City, &cities, &city_label, &province_label)?;
                    cities.push(LocationNode::new(slugify(&city_label), city_label));
                }

                provinces.push(
                    LocationNode::new(province_key, province_label).with_children(cities),
                );
            }

            islands.push(LocationNode::new(island_key, label).with_children(provinces));
        }

        Ok(LocationHierarchy::from_islands(islands))
    }
}

fn require_label(level: LocationLevel, label: &str, parent: &str) -> Result<(), HierarchyError> {
    if label.trim().is_empty() {
        return Err(HierarchyError::EmptyLabel {
            level: level.label(),
            parent: parent.to_string(),
        });
    }
    Ok(())
}

fn require_unique(
    level: LocationLevel,
    siblings: &[LocationNode],
    label: &str,
    parent: &str,
) -> Result<(), HierarchyError> {
    if siblings.iter().any(|node| node.label == label) {
        return Err(HierarchyError::DuplicateLabel {
            level: level.label(),
            label: label.to_string(),
            parent: parent.to_string(),
        });
    }
    Ok(())
}

fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Deserialize)]
struct RawIsland {
    label: String,
    #[serde(default)]
    provinsi: OrderedEntries<RawProvince>,
}

#[derive(Debug, Deserialize)]
struct RawProvince {
    label: String,
    #[serde(default)]
    kota: Vec<RawCity>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    label: String,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    pulau: String,
    provinsi: String,
    kota: String,
}

/// JSON object kept as key/value pairs in document order.
#[derive(Debug)]
struct OrderedEntries<T>(Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of location keys to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LOKASI_JSON: &str = r#"{
        "jawa": {
            "label": "Jawa",
            "provinsi": {
                "yogyakarta": {
                    "label": "Yogyakarta",
                    "kota": [{ "label": "Sleman" }, { "label": "Bantul" }]
                },
                "jateng": {
                    "label": "Jawa Tengah",
                    "kota": [{ "label": "Semarang" }]
                }
            }
        },
        "bali": {
            "label": "Bali",
            "provinsi": {
                "bali": { "label": "Bali", "kota": [{ "label": "Denpasar" }] }
            }
        }
    }"#;

    #[test]
    fn json_keeps_document_order_and_keys() {
        let hierarchy = HierarchyLoader::from_json_str(LOKASI_JSON).expect("valid json");
        assert_eq!(hierarchy.islands(), vec!["Jawa", "Bali"]);
        assert_eq!(hierarchy.provinces("Jawa"), vec!["Yogyakarta", "Jawa Tengah"]);
        assert_eq!(
            hierarchy.keys("Jawa", "Jawa Tengah", "Semarang"),
            Some(["jawa", "jateng", "semarang"])
        );
    }

    #[test]
    fn json_rejects_duplicate_sibling_labels() {
        let document = r#"{
            "jawa": { "label": "Jawa", "provinsi": {
                "a": { "label": "Yogyakarta", "kota": [{ "label": "Sleman" }, { "label": "Sleman" }] }
            } }
        }"#;
        let err = HierarchyLoader::from_json_str(document).expect_err("duplicate city");
        assert!(matches!(
            err,
            HierarchyError::DuplicateLabel { level: "Kota/Kabupaten", .. }
        ));
    }

    #[test]
    fn json_rejects_empty_documents_and_labels() {
        assert!(matches!(
            HierarchyLoader::from_json_str("{}"),
            Err(HierarchyError::Empty)
        ));
        let blank = r#"{ "x": { "label": "  ", "provinsi": {} } }"#;
        assert!(matches!(
            HierarchyLoader::from_json_str(blank),
            Err(HierarchyError::EmptyLabel { .. })
        ));
        assert!(matches!(
            HierarchyLoader::from_json_str("[1, 2]"),
            Err(HierarchyError::Json(_))
        ));
    }

    #[test]
    fn csv_groups_rows_by_first_appearance() {
        let export = "pulau,provinsi,kota\n\
                      Jawa,Yogyakarta,Sleman\n\
                      Bali,Bali,Denpasar\n\
                      Jawa,Yogyakarta,Bantul\n\
                      Jawa,Jawa Tengah,Semarang\n";
        let hierarchy =
            HierarchyLoader::from_csv_reader(Cursor::new(export)).expect("valid csv");
        assert_eq!(hierarchy.islands(), vec!["Jawa", "Bali"]);
        assert_eq!(hierarchy.cities("Jawa", "Yogyakarta"), vec!["Sleman", "Bantul"]);
        assert_eq!(hierarchy.provinces("Jawa"), vec!["Yogyakarta", "Jawa Tengah"]);
    }

    #[test]
    fn csv_rejects_repeated_cities() {
        let export = "pulau,provinsi,kota\nJawa,Yogyakarta,Sleman\nJawa,Yogyakarta,Sleman\n";
        let err = HierarchyLoader::from_csv_reader(Cursor::new(export)).expect_err("dup");
        assert!(matches!(err, HierarchyError::DuplicateLabel { .. }));
    }

    #[test]
    fn csv_without_rows_is_empty() {
        let err = HierarchyLoader::from_csv_reader(Cursor::new("pulau,provinsi,kota\n"))
            .expect_err("no rows");
        assert!(matches!(err, HierarchyError::Empty));
    }

    #[test]
    fn bundled_data_has_unique_labels_per_parent() {
        let hierarchy = HierarchyLoader::bundled();
        assert!(hierarchy.resolve("Jawa", "Yogyakarta", "Sleman"));
        for island in hierarchy.island_nodes() {
            let mut provinces = island.child_labels();
            provinces.sort_unstable();
            provinces.dedup();
            assert_eq!(provinces.len(), island.children.len());
            for province in &island.children {
                let mut cities = province.child_labels();
                cities.sort_unstable();
                cities.dedup();
                assert_eq!(cities.len(), province.children.len());
            }
        }
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Bali & Nusa Tenggara"), "bali_nusa_tenggara");
        assert_eq!(slugify(" DKI Jakarta "), "dki_jakarta");
    }

    #[test]
    fn from_path_rejects_unknown_extensions() {
        let err = HierarchyLoader::from_path("Cargo.toml").expect_err("toml unsupported");
        assert!(matches!(err, HierarchyError::UnsupportedFormat(_)));
    }
}
