use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Keys that make up a distinct search and therefore live in the location
    pub static ref DEFAULT_QUERY_KEYS: Vec<String> = [
        "q",
        "sort",
        "extent",
        "filter{resource_type.in}",
        "filter{category.identifier.in}",
        "filter{keywords.slug.in}",
        "filter{regions.name.in}",
        "filter{owner.username.in}",
        "filter{group.name.in}",
    ]
    .iter()
    .map(|e| e.to_string())
    .collect();
}

const DEFAULT_PAGE_SIZE: u32 = 24;
const DEFAULT_SUGGESTION_DEBOUNCE_MS: u64 = 300;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub resources: String,
    pub autocomplete: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            resources: "/api/v2/resources".to_string(),
            autocomplete: "/base/autocomplete_response/".to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub page_size: u32,
    pub query_keys: Vec<String>,
    pub suggestion_debounce_ms: u64,
    pub endpoints: Endpoints,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            query_keys: DEFAULT_QUERY_KEYS.clone(),
            suggestion_debounce_ms: DEFAULT_SUGGESTION_DEBOUNCE_MS,
            endpoints: Endpoints::default(),
        }
    }
}

impl SearchConfig {
    /// Read a JSON config. A missing file is not an error.
    pub fn read(path: &Path) -> Result<Option<Self>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(path)
            .map_err(|e| format!("Could not read {}: {e:?}", path.display()))?;
        let config: SearchConfig = serde_json::from_slice(&data)
            .map_err(|e| format!("Could not parse {}: {e:?}", path.display()))?;
        config.validated().map(Some)
    }

    /// A zero page size would make every page count meaningless
    fn validated(mut self) -> Result<Self, String> {
        if self.page_size == 0 {
            return Err("page_size must be at least 1".to_string());
        }
        self.query_keys.dedup();
        Ok(self)
    }

    pub fn suggestion_debounce(&self) -> Duration {
        Duration::from_millis(self.suggestion_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "gnsearch-config-{}-{}.json",
            std::process::id(),
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_is_none() {
        let path = Path::new("/definitely/not/here.json");
        assert_eq!(SearchConfig::read(path), Ok(None));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let path = write_config(r#"{"base_url": "https://demo.geonode.org", "page_size": 10}"#);
        let config = SearchConfig::read(&path).unwrap().unwrap();
        assert_eq!(config.base_url, "https://demo.geonode.org");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.query_keys, *DEFAULT_QUERY_KEYS);
        assert_eq!(config.suggestion_debounce(), Duration::from_millis(300));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let path = write_config(r#"{"page_size": 0}"#);
        assert!(SearchConfig::read(&path).is_err());
        let _ = std::fs::remove_file(path);
    }
}
