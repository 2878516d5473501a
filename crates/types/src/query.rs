//! Query kinds accepted by the resolver

use std::fmt;
use std::str::FromStr;

/// The kind of identity a boot request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Hardware (MAC) address
    Mac,
    /// System serial number
    Serial,
    /// Group label
    Group,
    /// No identity, serve the default policy
    Default,
}

impl QueryKind {
    /// All kinds, in routing order
    pub const ALL: [QueryKind; 4] = [
        QueryKind::Mac,
        QueryKind::Serial,
        QueryKind::Group,
        QueryKind::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Mac => "mac",
            QueryKind::Serial => "serial",
            QueryKind::Group => "group",
            QueryKind::Default => "default",
        }
    }

    /// Whether queries of this kind carry an identity string
    pub fn takes_identity(&self) -> bool {
        !matches!(self, QueryKind::Default)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mac" => Ok(QueryKind::Mac),
            "serial" => Ok(QueryKind::Serial),
            "group" => Ok(QueryKind::Group),
            "default" => Ok(QueryKind::Default),
            other => Err(format!("Unknown query kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for kind in QueryKind::ALL {
            assert_eq!(kind.as_str().parse::<QueryKind>().unwrap(), kind);
        }
        assert_eq!("MAC".parse::<QueryKind>().unwrap(), QueryKind::Mac);
        assert!("uuid".parse::<QueryKind>().is_err());
        assert_eq!(QueryKind::Serial.to_string(), "serial");
    }

    #[test]
    fn test_takes_identity() {
        assert!(QueryKind::Group.takes_identity());
        assert!(!QueryKind::Default.takes_identity());
    }
}
