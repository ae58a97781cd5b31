/// JSON configuration: scan tunables and user category rules.
///
/// Every field is optional; a missing section falls back to its default.
///
/// ```json
/// {
///   "scan": { "threads": 8, "max_children": 50 },
///   "categories": [
///     { "name": "Models", "extensions": ["obj", "fbx"] }
///   ]
/// }
/// ```
use crate::analysis::CategoryRules;
use crate::error::ConfigError;
use crate::scanner::ScanOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanOptions,
    pub categories: CategoryRules,
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn parses_scan_and_categories() {
        let config = Config::from_json_str(
            r#"{
                "scan": { "max_children": 10 },
                "categories": [{ "name": "Models", "extensions": ["OBJ"] }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.scan.max_children, 10);
        assert_eq!(config.scan.threads, None);
        assert_eq!(config.categories.classify("a.obj"), "Models");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Config::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
