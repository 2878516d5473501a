//! Configuration schema definitions

use std::collections::{BTreeMap, HashMap};
use types::utils::{normalize_mac, normalize_path_prefix};
use types::{ConfigError, ConfigResult};
use url::Url;

/// Base URL used when the document has no `global.url`
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Configuration file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "/etc/ipxe-distributor/config.yaml";

/// Image name that selects the default boot policy instead of a named image
pub const DEFAULT_IMAGE_SENTINEL: &str = "default";

/// Main configuration structure
///
/// Built once by the loader and shared read-only afterwards. The three
/// indexes are derived from `nodes` by [`Configuration::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Where the service is reachable
    pub global: GlobalSettings,
    /// Script fragments shared by every response
    pub defaults: DefaultBootPolicy,
    /// Image name -> image definition
    pub images: BTreeMap<String, ImageDefinition>,
    /// Node label -> node entry
    pub nodes: BTreeMap<String, NodeEntry>,
    /// Normalized MAC -> node label
    pub mac_index: HashMap<String, String>,
    /// Serial number -> node label
    pub serial_index: HashMap<String, String>,
    /// Group name -> node labels in document order
    pub group_index: HashMap<String, Vec<String>>,
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Base URL as written by the operator
    pub url: String,
    /// `host:port` the HTTP server binds to
    pub bind_address: String,
    /// Route prefix derived from the URL path, empty or starting with `/`
    pub path_prefix: String,
}

/// Script fragments used to build every boot script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultBootPolicy {
    /// Lines placed right after the header
    pub prepend: Vec<String>,
    /// Lines placed at the very end
    pub append: Vec<String>,
    /// Body served for default requests and `image: default` nodes
    pub default_image: Vec<String>,
}

/// A named boot image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDefinition {
    /// iPXE commands making up the image body
    pub action: Vec<String>,
}

/// A node entry, every attribute is optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeEntry {
    pub mac: Option<String>,
    pub serial: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl GlobalSettings {
    /// Validate a base URL and derive the bind address and route prefix
    pub fn from_url(url: &str) -> ConfigResult<Self> {
        let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "http" {
            return Err(ConfigError::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
            });
        }

        let host = parsed.host_str().ok_or_else(|| ConfigError::InvalidUrl {
            url: url.to_string(),
            message: "URL has no host".to_string(),
        })?;
        let port = parsed.port_or_known_default().unwrap_or(80);

        // routes are nested under the prefix, which must not carry route captures
        let path_prefix = normalize_path_prefix(parsed.path());
        if path_prefix.contains(['*', ':']) {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                message: format!("path {} may not contain '*' or ':'", path_prefix),
            });
        }

        Ok(Self {
            url: url.to_string(),
            bind_address: format!("{}:{}", host, port),
            path_prefix,
        })
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            bind_address: "localhost:8080".to_string(),
            path_prefix: String::new(),
        }
    }
}

impl NodeEntry {
    /// Configured image name, treating an empty string as unset
    pub fn image_name(&self) -> Option<&str> {
        non_empty(&self.image)
    }

    pub fn mac(&self) -> Option<&str> {
        non_empty(&self.mac)
    }

    pub fn serial(&self) -> Option<&str> {
        non_empty(&self.serial)
    }

    pub fn group(&self) -> Option<&str> {
        non_empty(&self.group)
    }

    /// Whether any query kind can reach this node
    pub fn is_addressable(&self) -> bool {
        self.mac().is_some() || self.serial().is_some() || self.group().is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Configuration {
    /// Assemble a configuration and derive its lookup indexes
    ///
    /// `nodes` must be given in document order: duplicate MACs and serials
    /// resolve to the last node declaring them and group members keep this
    /// order.
    pub fn new(
        global: GlobalSettings,
        defaults: DefaultBootPolicy,
        images: BTreeMap<String, ImageDefinition>,
        nodes: Vec<(String, NodeEntry)>,
    ) -> Self {
        let mut mac_index = HashMap::new();
        let mut serial_index = HashMap::new();
        let mut group_index: HashMap<String, Vec<String>> = HashMap::new();

        for (label, node) in &nodes {
            if let Some(mac) = node.mac() {
                mac_index.insert(normalize_mac(mac), label.clone());
            }
            if let Some(serial) = node.serial() {
                serial_index.insert(serial.to_string(), label.clone());
            }
            if let Some(group) = node.group() {
                group_index
                    .entry(group.to_string())
                    .or_default()
                    .push(label.clone());
            }
        }

        Self {
            global,
            defaults,
            images,
            nodes: nodes.into_iter().collect(),
            mac_index,
            serial_index,
            group_index,
        }
    }

    /// Node label registered for an already normalized MAC
    pub fn label_for_mac(&self, normalized_mac: &str) -> Option<&str> {
        self.mac_index.get(normalized_mac).map(String::as_str)
    }

    pub fn label_for_serial(&self, serial: &str) -> Option<&str> {
        self.serial_index.get(serial).map(String::as_str)
    }

    /// All node labels sharing a group, in document order
    pub fn labels_for_group(&self, group: &str) -> &[String] {
        self.group_index
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(
            GlobalSettings::default(),
            DefaultBootPolicy::default(),
            BTreeMap::new(),
            Vec::new(),
        )
    }
}
