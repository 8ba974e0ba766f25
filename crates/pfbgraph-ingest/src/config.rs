//! Loader configuration.
//!
//! A JSON object naming the input file plus a few optional knobs:
//!
//! ```json
//! {"path": "export.avro", "source": "pfb", "format": "avro",
//!  "union_tags": ["double", "long"], "descend_sequences": false}
//! ```

use crate::error::{IngestError, Result};
use crate::export::DEFAULT_SOURCE;
use crate::normalize::{Normalizer, UnionTags};
use crate::source::InputFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Input export file.
    pub path: PathBuf,
    /// Source name written into the graph-config document.
    #[serde(default = "default_source")]
    pub source: String,
    /// Input format; inferred from the file extension when absent.
    #[serde(default)]
    pub format: Option<InputFormat>,
    /// Union tags unwrapped in addition to `string` and `float`.
    #[serde(default)]
    pub union_tags: Vec<String>,
    /// Also normalize array elements.
    #[serde(default)]
    pub descend_sequences: bool,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl LoaderConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: default_source(),
            format: None,
            union_tags: Vec::new(),
            descend_sequences: false,
        }
    }

    pub fn from_path(config_path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(config_path).map_err(|source| IngestError::ConfigRead {
            path: config_path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, config_path)
    }

    /// Parses config text; `origin` only labels errors.
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self> {
        let parse_error = |source| IngestError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        };
        let entries: Map<String, Value> = serde_json::from_str(text).map_err(parse_error)?;
        if !entries.contains_key("path") {
            return Err(IngestError::MissingConfigEntry {
                path: origin.to_path_buf(),
                key: "path",
            });
        }
        serde_json::from_value(Value::Object(entries)).map_err(parse_error)
    }

    pub fn input_format(&self) -> Result<InputFormat> {
        self.format
            .or_else(|| InputFormat::from_path(&self.path))
            .ok_or_else(|| IngestError::UnknownFormat {
                path: self.path.clone(),
            })
    }

    pub fn normalizer(&self) -> Normalizer {
        let tags = self
            .union_tags
            .iter()
            .fold(UnionTags::default(), |tags, tag| tags.with_tag(tag.as_str()));
        Normalizer::new(tags).descend_sequences(self.descend_sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn origin() -> &'static Path {
        Path::new("config.json")
    }

    #[test]
    fn path_only_config_uses_defaults() {
        let config = LoaderConfig::from_json_str(r#"{"path": "data/export.avro"}"#, origin()).unwrap();
        assert_eq!(config, LoaderConfig::new("data/export.avro"));
        assert_eq!(config.source, "pfb");
        assert_eq!(config.input_format().unwrap(), InputFormat::Avro);
    }

    #[test]
    fn missing_path_is_reported_by_name() {
        let err = LoaderConfig::from_json_str(r#"{"source": "x"}"#, origin()).unwrap_err();
        assert!(matches!(err, IngestError::MissingConfigEntry { key: "path", .. }));
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let err = LoaderConfig::from_json_str("{not json", origin()).unwrap_err();
        assert!(matches!(err, IngestError::ConfigParse { .. }));

        let err = LoaderConfig::from_json_str(r#"{"path": 3}"#, origin()).unwrap_err();
        assert!(matches!(err, IngestError::ConfigParse { .. }));
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        let config =
            LoaderConfig::from_json_str(r#"{"path": "dump.bin", "format": "json"}"#, origin())
                .unwrap();
        assert_eq!(config.input_format().unwrap(), InputFormat::Json);

        let config = LoaderConfig::new("dump.bin");
        assert!(matches!(
            config.input_format(),
            Err(IngestError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn extra_union_tags_reach_the_normalizer() {
        let config = LoaderConfig::from_json_str(
            r#"{"path": "x.json", "union_tags": ["long"], "descend_sequences": true}"#,
            origin(),
        )
        .unwrap();
        let normalizer = config.normalizer();
        assert_eq!(
            normalizer.normalize(json!({"n": {"long": 3}, "l": [{"string": "a"}]})),
            json!({"n": 3, "l": ["a"]})
        );
    }

    #[test]
    fn unreadable_config_file() {
        let err = LoaderConfig::from_path(Path::new("/nonexistent/pfbgraph.json")).unwrap_err();
        assert!(matches!(err, IngestError::ConfigRead { .. }));
    }
}
