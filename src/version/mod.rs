//! API version parsing
//!
//! Native libraries report their version as a string of the form
//! `[PREFIX] MAJOR.MINOR[.REVISION] [IMPL]`, e.g. `"1.4 DRI3"` or
//! `"GLX 1.4"`. This module parses those strings into an immutable
//! [`ApiVersion`] value.

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// A parsed API version
///
/// Equality compares all four fields pairwise; ordering compares
/// major, then minor, then the optional fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    /// Revision component, without the separating dot. May be absent.
    pub revision: Option<String>,
    /// Implementation-specific trailer (e.g. a vendor tag). May be absent.
    pub implementation: Option<String>,
}

impl ApiVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        ApiVersion {
            major,
            minor,
            revision: None,
            implementation: None,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(revision) = &self.revision {
            write!(f, ".{}", revision)?;
        }
        if let Some(implementation) = &self.implementation {
            write!(f, " ({})", implementation)?;
        }
        Ok(())
    }
}

/// Parse a version string of the form `MAJOR.MINOR[.REVISION] [IMPL]`.
pub fn parse(version: &str) -> Result<ApiVersion> {
    parse_prefixed(version, None)
}

/// Parse a version string with an optional leading prefix.
///
/// The prefix (e.g. `"GLX"`) may appear before the numeric part, separated
/// by whitespace, and is discarded. Anything that does not match the fixed
/// pattern is reported as [`Error::MalformedVersion`] carrying the
/// original string.
pub fn parse_prefixed(version: &str, prefix: Option<&str>) -> Result<ApiVersion> {
    let mut pattern = String::from("^");
    if let Some(prefix) = prefix {
        pattern.push_str(&format!("(?:{}\\s+)?", regex::escape(prefix)));
    }
    pattern.push_str(r"([0-9]+)\.([0-9]+)(\.\S+)?\s*(.+)?$");

    // The pattern is fixed apart from the escaped prefix, so it always compiles.
    let re = Regex::new(&pattern).expect("version pattern is valid");

    let captures = re
        .captures(version)
        .ok_or_else(|| Error::MalformedVersion(version.to_string()))?;

    let major = captures[1]
        .parse::<u32>()
        .map_err(|_| Error::MalformedVersion(version.to_string()))?;
    let minor = captures[2]
        .parse::<u32>()
        .map_err(|_| Error::MalformedVersion(version.to_string()))?;

    Ok(ApiVersion {
        major,
        minor,
        revision: captures
            .get(3)
            .map(|m| m.as_str().trim_start_matches('.').to_string()),
        implementation: captures.get(4).map(|m| m.as_str().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_major_minor() {
        let version = parse("3.0").unwrap();
        assert_eq!(version, ApiVersion::new(3, 0));
    }

    #[test]
    fn test_parse_with_implementation() {
        let version = parse("1.4 DRI3").unwrap();
        assert_eq!(version.major, 1);
        assert_eq!(version.minor, 4);
        assert_eq!(version.revision, None);
        assert_eq!(version.implementation.as_deref(), Some("DRI3"));
    }

    #[test]
    fn test_parse_with_revision() {
        let version = parse("4.6.0").unwrap();
        assert_eq!(version.major, 4);
        assert_eq!(version.minor, 6);
        assert_eq!(version.revision.as_deref(), Some("0"));
        assert_eq!(version.implementation, None);
    }

    #[test]
    fn test_parse_full() {
        let version = parse("4.6.0 NVIDIA 535.86.05").unwrap();
        assert_eq!(version.revision.as_deref(), Some("0"));
        assert_eq!(version.implementation.as_deref(), Some("NVIDIA 535.86.05"));
    }

    #[test]
    fn test_parse_prefixed() {
        let version = parse_prefixed("GLX 1.4", Some("GLX")).unwrap();
        assert_eq!(version.major, 1);
        assert_eq!(version.minor, 4);

        // The prefix is optional even when specified
        let version = parse_prefixed("1.4", Some("GLX")).unwrap();
        assert_eq!(version.major, 1);
        assert_eq!(version.minor, 4);
    }

    #[test]
    fn test_parse_malformed() {
        for input in ["abc", "1", "", "1.", ".4"] {
            match parse(input) {
                Err(Error::MalformedVersion(s)) => assert_eq!(s, input),
                other => panic!("expected malformed error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_equality_compares_minor_to_minor() {
        // 2.0 and 2.2 share a major version but must not compare equal
        assert_ne!(ApiVersion::new(2, 0), ApiVersion::new(2, 2));
        assert_eq!(ApiVersion::new(2, 1), ApiVersion::new(2, 1));
    }

    #[test]
    fn test_ordering() {
        assert!(ApiVersion::new(1, 4) < ApiVersion::new(2, 0));
        assert!(ApiVersion::new(2, 0) < ApiVersion::new(2, 1));
    }

    #[test]
    fn test_display() {
        let mut version = ApiVersion::new(1, 4);
        assert_eq!(version.to_string(), "1.4");
        version.revision = Some("2".to_string());
        version.implementation = Some("DRI3".to_string());
        assert_eq!(version.to_string(), "1.4.2 (DRI3)");
    }
}
