//! Resolution engine
//!
//! Turns an identity (MAC, serial number or group) into a boot script:
//! identity -> node label -> node entry -> image -> script. Every stage has
//! its own [`LookupError`] variant.

use crate::script::assemble;
use config::{Configuration, NodeEntry, DEFAULT_IMAGE_SENTINEL};
use std::sync::Arc;
use tracing::debug;
use types::utils::normalize_mac;
use types::{LookupError, LookupResult, QueryKind};

/// Boot script resolver over an immutable configuration
#[derive(Debug, Clone)]
pub struct Resolver {
    config: Arc<Configuration>,
}

impl Resolver {
    /// Create a resolver for a loaded configuration
    pub fn new(config: Arc<Configuration>) -> Self {
        Self { config }
    }

    /// The configuration this resolver answers from
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Resolve a boot script for `identity` of the given kind
    ///
    /// `identity` is ignored for [`QueryKind::Default`].
    pub fn resolve(&self, kind: QueryKind, identity: &str) -> LookupResult<String> {
        let label = match kind {
            QueryKind::Default => return Ok(self.resolve_default()),
            QueryKind::Mac => self.config.label_for_mac(&normalize_mac(identity)),
            QueryKind::Serial => self.config.label_for_serial(identity),
            // first member in document order answers for the whole group
            QueryKind::Group => self
                .config
                .labels_for_group(identity)
                .first()
                .map(String::as_str),
        };

        let label = label.ok_or_else(|| LookupError::NoLabel {
            kind,
            identity: identity.to_string(),
        })?;

        debug!(kind = %kind, identity = identity, label = label, "Resolved node label");

        self.resolve_label(label)
    }

    pub fn resolve_mac(&self, mac: &str) -> LookupResult<String> {
        self.resolve(QueryKind::Mac, mac)
    }

    pub fn resolve_serial(&self, serial: &str) -> LookupResult<String> {
        self.resolve(QueryKind::Serial, serial)
    }

    pub fn resolve_group(&self, group: &str) -> LookupResult<String> {
        self.resolve(QueryKind::Group, group)
    }

    /// Script for requests without a usable identity, never fails
    pub fn resolve_default(&self) -> String {
        let policy = &self.config.defaults;
        assemble(policy, &policy.default_image)
    }

    /// Build the script for a node label
    pub fn resolve_label(&self, label: &str) -> LookupResult<String> {
        let node = self
            .config
            .nodes
            .get(label)
            .ok_or_else(|| LookupError::NoNodeData {
                label: label.to_string(),
            })?;

        let body = self.image_body(label, node)?;
        Ok(assemble(&self.config.defaults, body))
    }

    fn image_body<'a>(&'a self, label: &str, node: &'a NodeEntry) -> LookupResult<&'a [String]> {
        let image = node.image_name().ok_or_else(|| LookupError::NoImage {
            label: label.to_string(),
        })?;

        // checked before the image map, an image named "default" is never used
        if image == DEFAULT_IMAGE_SENTINEL {
            return Ok(self.config.defaults.default_image.as_slice());
        }

        self.config
            .images
            .get(image)
            .map(|definition| definition.action.as_slice())
            .ok_or_else(|| LookupError::MissingImage {
                image: image.to_string(),
                label: label.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ConfigLoader;

    const ROUND_TRIP: &str = r##"
global:
  ipxe_prepend: ["#start"]
  ipxe_append: ["#end"]
images:
  webinstall:
    action: ["a", "b"]
nodes:
  n1:
    mac: "aa:bb:cc:dd:ee:ff"
    image: webinstall
"##;

    fn resolver(yaml: &str) -> Resolver {
        Resolver::new(Arc::new(ConfigLoader::load_from_str(yaml).unwrap()))
    }

    #[test]
    fn test_round_trip() {
        let resolver = resolver(ROUND_TRIP);
        assert_eq!(
            resolver.resolve(QueryKind::Mac, "aabbccddeeff").unwrap(),
            "#!ipxe\n#start\na\nb\n#end"
        );
    }

    #[test]
    fn test_mac_normalization() {
        let resolver = resolver(ROUND_TRIP);
        let expected = resolver.resolve_mac("aabbccddeeff").unwrap();

        for mac in [
            "AA:BB:CC:DD:EE:FF",
            "aa-bb-cc-dd-ee-ff",
            "AABBCCDDEEFF",
            "Aa:bB-cC:Dd-eE:fF",
        ] {
            assert_eq!(resolver.resolve_mac(mac).unwrap(), expected, "mac {}", mac);
        }
    }

    #[test]
    fn test_default_query_on_empty_document() {
        let resolver = resolver("");
        assert_eq!(resolver.resolve(QueryKind::Default, "").unwrap(), "#!ipxe");
        assert_eq!(resolver.resolve(QueryKind::Default, "ignored").unwrap(), "#!ipxe");
    }

    #[test]
    fn test_default_query_uses_policy() {
        let resolver = resolver(concat!(
            "global:\n  ipxe_prepend: [p]\n  ipxe_append: [z]\n",
            "default:\n  default_image: [d1, d2]\n",
        ));
        assert_eq!(resolver.resolve_default(), "#!ipxe\np\nd1\nd2\nz");
    }

    #[test]
    fn test_default_sentinel() {
        let resolver = resolver(
            r#"
default:
  default_image: ["chain menu.ipxe"]
images:
  default:
    action: ["never served"]
nodes:
  n1:
    serial: "SN1"
    image: default
"#,
        );
        assert_eq!(resolver.resolve_serial("SN1").unwrap(), "#!ipxe\nchain menu.ipxe");
    }

    #[test]
    fn test_unknown_mac_differs_from_missing_image() {
        let resolver = resolver(
            "nodes:\n  n1:\n    mac: \"00:11:22:33:44:55\"\n",
        );

        let unknown = resolver.resolve_mac("66:77:88:99:aa:bb").unwrap_err();
        assert_eq!(
            unknown,
            LookupError::NoLabel {
                kind: QueryKind::Mac,
                identity: "66:77:88:99:aa:bb".to_string(),
            }
        );

        let no_image = resolver.resolve_mac("00:11:22:33:44:55").unwrap_err();
        assert_eq!(
            no_image,
            LookupError::NoImage {
                label: "n1".to_string()
            }
        );
        assert_ne!(unknown.to_string(), no_image.to_string());
    }

    #[test]
    fn test_dangling_image_reference() {
        let resolver = resolver("nodes:\n  n1:\n    group: rack\n    image: centos\n");
        assert_eq!(
            resolver.resolve_group("rack").unwrap_err(),
            LookupError::MissingImage {
                image: "centos".to_string(),
                label: "n1".to_string(),
            }
        );
    }

    #[test]
    fn test_serial_is_verbatim() {
        let resolver = resolver(
            "images:\n  i:\n    action: [x]\nnodes:\n  n1:\n    serial: \"AbC-1\"\n    image: i\n",
        );
        assert!(resolver.resolve_serial("AbC-1").is_ok());
        assert!(matches!(
            resolver.resolve_serial("abc-1"),
            Err(LookupError::NoLabel { .. })
        ));
    }

    #[test]
    fn test_group_uses_first_member() {
        let resolver = resolver(
            r#"
images:
  one:
    action: ["one"]
  two:
    action: ["two"]
nodes:
  b-node:
    group: compute
    image: two
  a-node:
    group: compute
    image: one
"#,
        );
        assert_eq!(resolver.resolve_group("compute").unwrap(), "#!ipxe\ntwo");
        assert!(resolver.resolve_group("storage").is_err());
    }

    #[test]
    fn test_indexed_labels_always_have_node_data() {
        let resolver = resolver(
            r#"
nodes:
  a:
    mac: "00:00:00:00:00:0a"
    serial: "A"
    group: g
  b:
    mac: "00:00:00:00:00:0b"
    serial: "B"
    group: g
"#,
        );
        let config = resolver.config();
        let lookups = config
            .mac_index
            .keys()
            .map(|k| (QueryKind::Mac, k))
            .chain(config.serial_index.keys().map(|k| (QueryKind::Serial, k)))
            .chain(config.group_index.keys().map(|k| (QueryKind::Group, k)));

        for (kind, key) in lookups {
            let err = resolver.resolve(kind, key).unwrap_err();
            assert!(
                !matches!(err, LookupError::NoNodeData { .. }),
                "{} {} gave {}",
                kind,
                key,
                err
            );
        }
    }

    #[test]
    fn test_missing_node_data() {
        let mut config = ConfigLoader::load_from_str(ROUND_TRIP).unwrap();
        config.nodes.remove("n1");

        let resolver = Resolver::new(Arc::new(config));
        assert_eq!(
            resolver.resolve_mac("aa:bb:cc:dd:ee:ff").unwrap_err(),
            LookupError::NoNodeData {
                label: "n1".to_string()
            }
        );
    }
}
