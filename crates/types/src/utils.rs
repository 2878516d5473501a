//! Utility functions and helpers

/// Normalize a MAC address for index lookups
///
/// Lowercases and strips `:` and `-` separators. No validation of length or
/// hex digits is done; unknown shapes simply miss in the index.
pub fn normalize_mac(mac: &str) -> String {
    mac.chars()
        .filter(|c| *c != ':' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize a URL path into a route prefix
///
/// Leading and trailing slashes are trimmed and a single leading slash is
/// added back, so `"/boot/"` becomes `"/boot"`. An empty or root path gives
/// an empty prefix.
pub fn normalize_path_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
