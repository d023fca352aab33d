//! Layered config: built-in defaults, then keys set by the overlay file, then keys set by flags.

use crate::config::types::GenerationConfig;
use crate::config::validate;
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Overlay file read when no `--config` is passed. Skipped silently when absent.
pub const DEFAULT_CONFIG_PATH: &str = "configs/gen.yml";

/// One layer of settings. `None` means "this layer does not set the key".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub dsn: Option<String>,
    #[serde(default, alias = "db")]
    pub driver: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub tables: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list")]
    pub exclude: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list")]
    pub association: Option<Vec<String>>,
    #[serde(default, alias = "fieldWithStringTag", deserialize_with = "list")]
    pub field_with_string_tag: Option<Vec<String>>,
    #[serde(default, alias = "modelPath")]
    pub model_path: Option<PathBuf>,
    #[serde(default, alias = "queryPath")]
    pub query_path: Option<PathBuf>,
    #[serde(default, alias = "queryFile")]
    pub query_file: Option<String>,
    #[serde(default, alias = "modelPkg", alias = "modelPkgName")]
    pub model_pkg: Option<String>,
    #[serde(default, alias = "onlyModel")]
    pub only_model: Option<bool>,
    #[serde(default, alias = "withUnitTest")]
    pub with_unit_test: Option<bool>,
    #[serde(default, alias = "fieldNullable")]
    pub field_nullable: Option<bool>,
    #[serde(default, alias = "fieldWithIndexTag")]
    pub field_with_index_tag: Option<bool>,
    #[serde(default, alias = "fieldWithTypeTag")]
    pub field_with_type_tag: Option<bool>,
    #[serde(default, alias = "fieldSignable")]
    pub field_signable: Option<bool>,
}

impl ConfigLayer {
    /// Built-in defaults. Every key except `model_pkg` is set; an unset package is derived from the model path.
    pub fn defaults() -> Self {
        ConfigLayer {
            dsn: Some(String::new()),
            driver: Some("mysql".into()),
            tables: Some(Vec::new()),
            exclude: Some(vec!["schema_migrations".into()]),
            association: Some(Vec::new()),
            field_with_string_tag: Some(Vec::new()),
            model_path: Some(PathBuf::from("src/data/model")),
            query_path: Some(PathBuf::from("src/data/query")),
            query_file: Some("query.rs".into()),
            model_pkg: None,
            only_model: Some(false),
            with_unit_test: Some(false),
            field_nullable: Some(false),
            field_with_index_tag: Some(false),
            field_with_type_tag: Some(false),
            field_signable: Some(true),
        }
    }

    /// Apply every key that `upper` sets on top of `self`.
    pub fn merge(mut self, upper: ConfigLayer) -> Self {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.dsn, upper.dsn);
        take(&mut self.driver, upper.driver);
        take(&mut self.tables, upper.tables);
        take(&mut self.exclude, upper.exclude);
        take(&mut self.association, upper.association);
        take(&mut self.field_with_string_tag, upper.field_with_string_tag);
        take(&mut self.model_path, upper.model_path);
        take(&mut self.query_path, upper.query_path);
        take(&mut self.query_file, upper.query_file);
        take(&mut self.model_pkg, upper.model_pkg);
        take(&mut self.only_model, upper.only_model);
        take(&mut self.with_unit_test, upper.with_unit_test);
        take(&mut self.field_nullable, upper.field_nullable);
        take(&mut self.field_with_index_tag, upper.field_with_index_tag);
        take(&mut self.field_with_type_tag, upper.field_with_type_tag);
        take(&mut self.field_signable, upper.field_signable);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListValue {
    Seq(Vec<String>),
    Csv(String),
}

/// Accept either a YAML sequence or a comma-separated string.
fn list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<ListValue>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        ListValue::Seq(items) => items,
        ListValue::Csv(s) => s.split(',').map(str::to_string).collect(),
    }))
}

#[derive(Deserialize)]
struct OverlayFile {
    #[serde(default)]
    gen: Option<ConfigLayer>,
}

/// Where the overlay layer comes from.
#[derive(Clone, Debug)]
pub enum Overlay {
    /// No overlay file.
    None,
    /// Conventional location; a missing file is not an error.
    Default(PathBuf),
    /// Caller-chosen file; it must exist.
    Explicit(PathBuf),
}

/// Parse an overlay document. Keys live under a top-level `gen:` mapping.
pub fn parse_overlay(path: &Path, content: &str) -> Result<ConfigLayer, ConfigError> {
    let file: OverlayFile = serde_yaml::from_str(content).map_err(|e| ConfigError::Overlay {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(file.gen.unwrap_or_default())
}

fn load_overlay(overlay: &Overlay) -> Result<ConfigLayer, ConfigError> {
    let (path, required) = match overlay {
        Overlay::None => return Ok(ConfigLayer::default()),
        Overlay::Default(p) => (p, false),
        Overlay::Explicit(p) => (p, true),
    };
    match std::fs::read_to_string(path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "overlay config loaded");
            parse_overlay(path, &content)
        }
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no overlay config, using defaults");
            Ok(ConfigLayer::default())
        }
        Err(e) => Err(ConfigError::Overlay {
            path: path.clone(),
            message: e.to_string(),
        }),
    }
}

/// Merge defaults < overlay file < flags and validate the result.
pub fn resolve(flags: ConfigLayer, overlay: &Overlay) -> Result<GenerationConfig, ConfigError> {
    let file_layer = load_overlay(overlay)?;
    let merged = ConfigLayer::defaults().merge(file_layer).merge(flags);
    validate(merged)
}
