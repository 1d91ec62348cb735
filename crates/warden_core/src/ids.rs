//! Validated fingerprint identifier for vulnerabilities.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};

fn cve_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^CVE-\d{4}-\d{4,}$").expect("static pattern is valid"))
}

/// `CVE-YYYY-NNNN+`, the unique fingerprint under which scores are cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CveId(String);

impl CveId {
    pub fn parse(raw: &str) -> WardenResult<Self> {
        if cve_pattern().is_match(raw) {
            Ok(CveId(raw.to_string()))
        } else {
            Err(WardenError::bad_detection(format!(
                "'{raw}' is not a well-formed CVE id"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CveId {
    type Error = WardenError;

    fn try_from(raw: String) -> WardenResult<Self> {
        CveId::parse(&raw)
    }
}

impl From<CveId> for String {
    fn from(id: CveId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_ids() {
        assert!(CveId::parse("CVE-2021-44228").is_ok());
        assert!(CveId::parse("CVE-2024-123456789").is_ok());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(CveId::parse("CVE-21-44228").is_err());
        assert!(CveId::parse("not-a-cve").is_err());
        assert!(CveId::parse("").is_err());
    }

    #[test]
    fn display_round_trips_the_original_string() {
        let id = CveId::parse("CVE-2021-44228").unwrap();
        assert_eq!(id.to_string(), "CVE-2021-44228");
        assert_eq!(id.as_str(), "CVE-2021-44228");
    }
}
