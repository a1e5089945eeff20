//! Profile role values.

use core::convert::Infallible;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Role stored on an account's profile.
///
/// The profile table keeps the role as free text. The values the blog
/// assigns are modelled as variants; anything else read back from the store
/// is kept verbatim in [`ProfileRole::Other`] so it can be reported and
/// overwritten without failing the read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProfileRole {
    /// Full access to the blog administration pages.
    Admin,
    /// Can write and publish posts.
    Author,
    /// Regular signed-in reader.
    #[default]
    Member,
    /// A role value not known to this tool.
    Other(String),
}

impl ProfileRole {
    /// Returns the stored string form of the role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Author => "author",
            Self::Member => "member",
            Self::Other(value) => value,
        }
    }

    /// Whether this is the administrative role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProfileRole {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "admin" => Self::Admin,
            "author" => Self::Author,
            "member" => Self::Member,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl From<String> for ProfileRole {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl From<ProfileRole> for String {
    fn from(role: ProfileRole) -> Self {
        match role {
            ProfileRole::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_roles() {
        assert_eq!("admin".parse::<ProfileRole>().unwrap(), ProfileRole::Admin);
        assert_eq!("author".parse::<ProfileRole>().unwrap(), ProfileRole::Author);
        assert_eq!("member".parse::<ProfileRole>().unwrap(), ProfileRole::Member);
    }

    #[test]
    fn test_unknown_role_is_kept() {
        let role: ProfileRole = "moderator".parse().unwrap();
        assert_eq!(role, ProfileRole::Other("moderator".to_owned()));
        assert_eq!(role.to_string(), "moderator");
        assert!(!role.is_admin());
    }

    #[test]
    fn test_role_matching_is_case_sensitive() {
        let role: ProfileRole = "Admin".parse().unwrap();
        assert!(!role.is_admin());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&ProfileRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let parsed: ProfileRole = serde_json::from_str("\"reader\"").unwrap();
        assert_eq!(parsed, ProfileRole::Other("reader".to_owned()));
    }
}
