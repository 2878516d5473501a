//! Configuration loader implementation
//!
//! The document is decoded into a [`serde_yaml::Value`] tree first and then
//! walked section by section. Values are shape-checked before they are
//! converted: a value of the wrong type under a known key is a hard error,
//! while unknown keys are reported as warnings and skipped.

use crate::schema::{
    Configuration, DefaultBootPolicy, GlobalSettings, ImageDefinition, NodeEntry, DEFAULT_URL,
};
use crate::validation::{ConfigValidator, ValidationReport};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use types::{ConfigError, ConfigResult};

/// Configuration loader for the boot document
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(config_path: P) -> ConfigResult<Configuration> {
        Self::load_with_report(config_path).map(|(config, _)| config)
    }

    /// Load configuration from a file, returning the warnings found on the way
    pub fn load_with_report<P: AsRef<Path>>(
        config_path: P,
    ) -> ConfigResult<(Configuration, ValidationReport)> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            });
        }

        let raw = std::fs::read(config_path).map_err(|e| ConfigError::ReadFailed {
            path: config_path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(config_file = %config_path.display(), bytes = raw.len(), "Read configuration file");

        Self::parse(&raw)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> ConfigResult<Configuration> {
        Self::parse(yaml_content.as_bytes()).map(|(config, _)| config)
    }

    /// Parse raw document bytes into a configuration
    pub fn parse(raw: &[u8]) -> ConfigResult<(Configuration, ValidationReport)> {
        let document: Value = if raw.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_yaml::from_slice(raw).map_err(|e| ConfigError::ParseError(e.to_string()))?
        };

        let mut parser = DocumentParser::default();
        let config = parser.parse_document(&document)?;

        let findings = ConfigValidator::validate(&config);
        for issue in &findings.warnings {
            warn!(field = %issue.field, "{}", issue.message);
        }

        let mut report = parser.report;
        report.merge(findings);

        Ok((config, report))
    }
}

/// Walks a decoded document and collects unknown-key warnings
#[derive(Default)]
struct DocumentParser {
    report: ValidationReport,
}

/// Sections of the document, each optional
#[derive(Default)]
struct Sections<'a> {
    global: Option<&'a Value>,
    default: Option<&'a Value>,
    images: Option<&'a Value>,
    nodes: Option<&'a Value>,
}

impl DocumentParser {
    fn parse_document(&mut self, document: &Value) -> ConfigResult<Configuration> {
        let root = match document {
            Value::Null => return Ok(Configuration::default()),
            Value::Mapping(root) => root,
            other => {
                return Err(ConfigError::InvalidDocument {
                    found: shape(other).to_string(),
                })
            }
        };

        let mut sections = Sections::default();
        for (key, value) in entries(root, "document")? {
            match key {
                "global" => sections.global = Some(value),
                "default" => sections.default = Some(value),
                "images" => sections.images = Some(value),
                "nodes" => sections.nodes = Some(value),
                other => self.ignore_key(
                    "document",
                    other,
                    format!("Ignoring unsupported top-level configuration key {}", other),
                ),
            }
        }

        let mut url = DEFAULT_URL.to_string();
        let mut policy = DefaultBootPolicy::default();

        if let Some(global) = optional_mapping(sections.global, "global")? {
            self.parse_global(global, &mut url, &mut policy)?;
        }
        if let Some(default) = optional_mapping(sections.default, "default")? {
            self.parse_default(default, &mut policy)?;
        }

        let images = match optional_mapping(sections.images, "images")? {
            Some(images) => self.parse_images(images)?,
            None => BTreeMap::new(),
        };
        let nodes = match optional_mapping(sections.nodes, "nodes")? {
            Some(nodes) => self.parse_nodes(nodes)?,
            None => Vec::new(),
        };

        let global = GlobalSettings::from_url(&url)?;

        Ok(Configuration::new(global, policy, images, nodes))
    }

    fn parse_global(
        &mut self,
        global: &Mapping,
        url: &mut String,
        policy: &mut DefaultBootPolicy,
    ) -> ConfigResult<()> {
        for (key, value) in entries(global, "global")? {
            match key {
                "url" => *url = string(value, "global.url")?,
                "ipxe_prepend" => policy
                    .prepend
                    .extend(string_list(value, "global.ipxe_prepend")?),
                "ipxe_append" => policy
                    .append
                    .extend(string_list(value, "global.ipxe_append")?),
                other => self.ignore_key(
                    "global",
                    other,
                    format!("Ignoring unsupported configuration key {} for global", other),
                ),
            }
        }
        Ok(())
    }

    fn parse_default(
        &mut self,
        default: &Mapping,
        policy: &mut DefaultBootPolicy,
    ) -> ConfigResult<()> {
        let mut prepend = Vec::new();
        let mut append = Vec::new();

        for (key, value) in entries(default, "default")? {
            match key {
                "default_image" => {
                    policy.default_image = string_list(value, "default.default_image")?
                }
                "ipxe_prepend" => prepend = string_list(value, "default.ipxe_prepend")?,
                "ipxe_append" => append = string_list(value, "default.ipxe_append")?,
                other => self.ignore_key(
                    "default",
                    other,
                    format!("Ignoring unsupported configuration key {} for default", other),
                ),
            }
        }

        // global lines always come first, whichever section the document lists first
        policy.prepend.extend(prepend);
        policy.append.extend(append);
        Ok(())
    }

    fn parse_images(
        &mut self,
        images: &Mapping,
    ) -> ConfigResult<BTreeMap<String, ImageDefinition>> {
        let mut parsed = BTreeMap::new();

        for (name, value) in entries(images, "images")? {
            let path = format!("images.{}", name);
            let image = mapping(value, &path)?;

            let mut action = None;
            for (key, value) in entries(image, &path)? {
                match key {
                    "action" => {
                        action = Some(string_list(value, &format!("{}.action", path))?)
                    }
                    other => {
                        warn!(
                            key = other,
                            image = name,
                            "Ignoring unsupported configuration key for image"
                        );
                        self.report.add_warning(
                            &format!("{}.{}", path, other),
                            &format!(
                                "Ignoring unsupported configuration key {} for image {}",
                                other, name
                            ),
                        );
                    }
                }
            }

            let action = action.ok_or_else(|| ConfigError::MissingField {
                field: format!("{}.action", path),
            })?;
            parsed.insert(name.to_string(), ImageDefinition { action });
        }

        Ok(parsed)
    }

    fn parse_nodes(&mut self, nodes: &Mapping) -> ConfigResult<Vec<(String, NodeEntry)>> {
        let mut parsed = Vec::with_capacity(nodes.len());

        for (label, value) in entries(nodes, "nodes")? {
            let path = format!("nodes.{}", label);
            let node = mapping(value, &path)?;

            let mut entry = NodeEntry::default();
            for (key, value) in entries(node, &path)? {
                let field = format!("{}.{}", path, key);
                match key {
                    "image" => entry.image = Some(string(value, &field)?),
                    "serial" => entry.serial = Some(string(value, &field)?),
                    "group" => entry.group = Some(string(value, &field)?),
                    "mac" => entry.mac = Some(string(value, &field)?),
                    other => {
                        warn!(
                            key = other,
                            node = label,
                            "Ignoring unsupported configuration key for node"
                        );
                        self.report.add_warning(
                            &field,
                            &format!(
                                "Ignoring unsupported configuration key {} for node {}",
                                other, label
                            ),
                        );
                    }
                }
            }

            parsed.push((label.to_string(), entry));
        }

        Ok(parsed)
    }

    fn ignore_key(&mut self, section: &str, key: &str, message: String) {
        warn!(key = key, section = section, "{}", message);
        self.report.add_warning(&format!("{}.{}", section, key), &message);
    }
}

/// Human readable name of a value's shape
fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn invalid_type(path: &str, expected: &str, found: &Value) -> ConfigError {
    ConfigError::InvalidType {
        path: path.to_string(),
        expected: expected.to_string(),
        found: shape(found).to_string(),
    }
}

/// Entries of a mapping, rejecting keys that aren't strings
fn entries<'a>(map: &'a Mapping, section: &str) -> ConfigResult<Vec<(&'a str, &'a Value)>> {
    map.iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key.as_str(), value)),
            other => Err(ConfigError::InvalidKey {
                section: section.to_string(),
                found: shape(other).to_string(),
            }),
        })
        .collect()
}

fn mapping<'a>(value: &'a Value, path: &str) -> ConfigResult<&'a Mapping> {
    match value {
        Value::Mapping(map) => Ok(map),
        other => Err(invalid_type(path, "mapping", other)),
    }
}

/// A top-level section; absent and `null` both mean "not configured"
fn optional_mapping<'a>(value: Option<&'a Value>, path: &str) -> ConfigResult<Option<&'a Mapping>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => mapping(value, path).map(Some),
    }
}

fn string(value: &Value, path: &str) -> ConfigResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid_type(path, "string", other)),
    }
}

fn string_list(value: &Value, path: &str) -> ConfigResult<Vec<String>> {
    let items = match value {
        Value::Sequence(items) => items,
        other => return Err(invalid_type(path, "sequence of strings", other)),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| string(item, &format!("{}[{}]", path, i)))
        .collect()
}
