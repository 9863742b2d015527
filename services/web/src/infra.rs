use harpro::config::LocationConfig;
use harpro::location::{HierarchyError, HierarchyLoader, LocationHierarchy};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// `LOCATION_DATA_PATH` when set, otherwise the bundled table.
pub(crate) fn load_hierarchy(config: &LocationConfig) -> Result<LocationHierarchy, HierarchyError> {
    let hierarchy = match &config.data_path {
        Some(path) => HierarchyLoader::from_path(path)?,
        None => HierarchyLoader::bundled(),
    };
    info!(
        source = config
            .data_path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "bundled".to_string()),
        islands = hierarchy.island_nodes().len(),
        cities = hierarchy.city_count(),
        "location hierarchy loaded"
    );
    Ok(hierarchy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn falls_back_to_bundled_data() {
        let hierarchy = load_hierarchy(&LocationConfig::default()).expect("bundled loads");
        assert_eq!(hierarchy, LocationHierarchy::bundled());
    }

    #[test]
    fn missing_file_is_reported() {
        let config = LocationConfig {
            data_path: Some(PathBuf::from("/nonexistent/harpro/locations.json")),
        };
        assert!(matches!(
            load_hierarchy(&config),
            Err(HierarchyError::Io { .. })
        ));
    }
}
