//! Host variant detection.
//!
//! Reference screenshots differ between Windows Server and desktop editions
//! (window chrome, fonts), so the suite picks `test/ref/server/` or
//! `test/ref/desktop/` based on the registry `ProductName`.

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use crate::harness::types::{HarnessError, HarnessResult};

const REGISTRY_KEY: &str = r"HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion";
const PRODUCT_NAME_FIELD: &str = "ProductName";
const SERVER_MARKER: &str = "Server";

/// Which reference-image set applies to this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Server,
    Desktop,
}

impl Variant {
    /// Subdirectory name under the reference root
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Server => "server",
            Variant::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" => Ok(Variant::Server),
            "desktop" => Ok(Variant::Desktop),
            other => Err(format!("unknown variant '{}' (expected server or desktop)", other)),
        }
    }
}

/// Classify registry query output by the presence of the server marker
pub fn classify(product_name: &str) -> Variant {
    if product_name.contains(SERVER_MARKER) {
        Variant::Server
    } else {
        Variant::Desktop
    }
}

/// Classify query output, rejecting output that carries no `ProductName` field
pub fn parse_query_output(output: &str) -> HarnessResult<Variant> {
    if !output.contains(PRODUCT_NAME_FIELD) {
        return Err(HarnessError::Probe(format!(
            "registry output has no {} field",
            PRODUCT_NAME_FIELD
        )));
    }
    Ok(classify(output))
}

/// Query the registry and classify the host. Blocks until `reg` exits.
pub fn detect() -> HarnessResult<Variant> {
    detect_with("reg")
}

fn detect_with(program: &str) -> HarnessResult<Variant> {
    let output = Command::new(program)
        .args(["query", REGISTRY_KEY, "/v", PRODUCT_NAME_FIELD])
        .output()
        .map_err(|e| HarnessError::Probe(format!("failed to run {} query: {}", program, e)))?;

    if !output.status.success() {
        return Err(HarnessError::Probe(format!(
            "{} query exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let variant = parse_query_output(&stdout)?;
    tracing::debug!(%variant, "detected host variant");
    Ok(variant)
}

/// Use the pinned variant when configured, otherwise probe the host
pub fn resolve(pinned: Option<Variant>) -> HarnessResult<Variant> {
    match pinned {
        Some(variant) => Ok(variant),
        None => detect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_OUTPUT: &str = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\r\n    ProductName    REG_SZ    Windows Server 2019 Datacenter\r\n";
    const DESKTOP_OUTPUT: &str = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\r\n    ProductName    REG_SZ    Windows 10 Pro\r\n";

    #[test]
    fn test_classify_server_and_desktop() {
        assert_eq!(classify(SERVER_OUTPUT), Variant::Server);
        assert_eq!(classify(DESKTOP_OUTPUT), Variant::Desktop);
    }

    #[test]
    fn test_classify_marker_is_case_sensitive() {
        assert_eq!(classify("ProductName REG_SZ windows server"), Variant::Desktop);
    }

    #[test]
    fn test_parse_query_output_requires_field() {
        assert_eq!(parse_query_output(DESKTOP_OUTPUT).unwrap(), Variant::Desktop);
        let err = parse_query_output("ERROR: The system was unable to find the specified registry key").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("server".parse::<Variant>(), Ok(Variant::Server));
        assert_eq!(" Desktop ".parse::<Variant>(), Ok(Variant::Desktop));
        assert!("laptop".parse::<Variant>().is_err());
    }

    #[test]
    fn test_missing_query_tool_is_fatal() {
        let err = detect_with("/nonexistent/reg").unwrap_err();
        assert!(matches!(err, HarnessError::Probe(_)));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_query_is_fatal() {
        let err = detect_with("false").unwrap_err();
        match &err {
            HarnessError::Probe(message) => assert!(message.contains("exited with")),
            other => panic!("expected probe error, got {:?}", other),
        }
        assert!(err.is_fatal());
    }

    #[test]
    fn test_resolve_prefers_pinned_variant() {
        assert_eq!(resolve(Some(Variant::Server)).unwrap(), Variant::Server);
    }
}
