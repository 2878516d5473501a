//! Boot script assembly

use config::DefaultBootPolicy;

/// First line of every script, tells iPXE what it is reading
pub const SCRIPT_HEADER: &str = "#!ipxe";

/// Join the header, the policy's prepend lines, `body` and the append lines
///
/// Lines are separated by a single newline; nothing is added after the last
/// line.
pub fn assemble(policy: &DefaultBootPolicy, body: &[String]) -> String {
    std::iter::once(SCRIPT_HEADER)
        .chain(policy.prepend.iter().map(String::as_str))
        .chain(body.iter().map(String::as_str))
        .chain(policy.append.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
