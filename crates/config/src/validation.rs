//! Configuration validation utilities
//!
//! Nothing in here is fatal. Type errors are rejected by the loader; this
//! module only reports things an operator probably wants to know about, such
//! as nodes pointing at images that don't exist.

use crate::schema::{Configuration, DEFAULT_IMAGE_SENTINEL};
use std::collections::BTreeMap;
use types::utils::normalize_mac;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a loaded configuration
    pub fn validate(config: &Configuration) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_nodes(config, &mut report);
        Self::validate_macs(config, &mut report);
        Self::validate_serials(config, &mut report);
        Self::validate_groups(config, &mut report);

        report
    }

    fn validate_nodes(config: &Configuration, report: &mut ValidationReport) {
        for (label, node) in &config.nodes {
            let field = format!("nodes.{}", label);

            match node.image_name() {
                None => {
                    report.add_warning(&field, &format!("Node {} has no image configured", label));
                }
                Some(DEFAULT_IMAGE_SENTINEL) => {}
                Some(image) if !config.images.contains_key(image) => {
                    report.add_warning(
                        &format!("{}.image", field),
                        &format!("Node {} references undefined image {}", label, image),
                    );
                }
                Some(_) => {}
            }

            if !node.is_addressable() {
                report.add_warning(
                    &field,
                    &format!("Node {} has no mac, serial or group and can't be looked up", label),
                );
            }
        }
    }

    fn validate_macs(config: &Configuration, report: &mut ValidationReport) {
        let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for (label, node) in &config.nodes {
            if let Some(mac) = node.mac() {
                owners.entry(normalize_mac(mac)).or_default().push(label.as_str());
            }
        }

        for (mac, labels) in owners.iter().filter(|(_, labels)| labels.len() > 1) {
            let served = config.label_for_mac(mac).unwrap_or_default();
            report.add_warning(
                "nodes.mac",
                &format!(
                    "MAC {} is shared by nodes {}, only {} will be served",
                    mac,
                    labels.join(", "),
                    served
                ),
            );
        }
    }

    fn validate_serials(config: &Configuration, report: &mut ValidationReport) {
        let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (label, node) in &config.nodes {
            if let Some(serial) = node.serial() {
                owners.entry(serial).or_default().push(label.as_str());
            }
        }

        for (serial, labels) in owners.iter().filter(|(_, labels)| labels.len() > 1) {
            let served = config.label_for_serial(serial).unwrap_or_default();
            report.add_warning(
                "nodes.serial",
                &format!(
                    "Serial number {} is shared by nodes {}, only {} will be served",
                    serial,
                    labels.join(", "),
                    served
                ),
            );
        }
    }

    fn validate_groups(config: &Configuration, report: &mut ValidationReport) {
        let mut groups: Vec<_> = config
            .group_index
            .iter()
            .filter(|(_, labels)| labels.len() > 1)
            .collect();
        groups.sort();

        for (group, labels) in groups {
            report.add_warning(
                "nodes.group",
                &format!(
                    "Group {} has {} nodes ({}), requests for it are answered with {}",
                    group,
                    labels.len(),
                    labels.join(", "),
                    labels[0]
                ),
            );
        }
    }
}

/// Validation report collecting non-fatal findings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationIssue>,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Append all findings of another report
    pub fn merge(&mut self, other: ValidationReport) {
        self.warnings.extend(other.warnings);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} warnings", self.warnings.len())
    }
}
