/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which organizations a read covers.
/// Super admins may look across every tenant with `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "organization_id")]
pub enum OrgScope {
    All,
    Organization(Uuid),
}

impl OrgScope {
    pub fn includes(&self, organization_id: Uuid) -> bool {
        match self {
            OrgScope::All => true,
            OrgScope::Organization(id) => *id == organization_id,
        }
    }

    /// The concrete organization, if this scope names one
    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            OrgScope::All => None,
            OrgScope::Organization(id) => Some(*id),
        }
    }
}

impl fmt::Display for OrgScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrgScope::All => write!(f, "all"),
            OrgScope::Organization(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for OrgScope {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(OrgScope::All);
        }
        Uuid::parse_str(trimmed).map(OrgScope::Organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_and_uuid() {
        assert_eq!("ALL".parse::<OrgScope>().unwrap(), OrgScope::All);
        let id = Uuid::new_v4();
        assert_eq!(id.to_string().parse::<OrgScope>().unwrap(), OrgScope::Organization(id));
        assert!("tenant-1".parse::<OrgScope>().is_err());
    }

    #[test]
    fn all_includes_every_organization() {
        let id = Uuid::new_v4();
        assert!(OrgScope::All.includes(id));
        assert!(OrgScope::Organization(id).includes(id));
        assert!(!OrgScope::Organization(Uuid::new_v4()).includes(id));
    }
}
