//! Post visibility and the listing filter over it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use kernel::error::app_error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Visibility::Public),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(AppError::bad_request(format!("Unknown visibility: {other}"))),
        }
    }
}

/// `ALL` means no visibility restriction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisibilityFilter {
    Public,
    Private,
    #[default]
    All,
}

impl VisibilityFilter {
    pub fn matches(&self, visibility: Visibility) -> bool {
        self.as_visibility().is_none_or(|v| v == visibility)
    }

    /// The single visibility selected, `None` for `ALL`
    pub const fn as_visibility(&self) -> Option<Visibility> {
        match self {
            VisibilityFilter::Public => Some(Visibility::Public),
            VisibilityFilter::Private => Some(Visibility::Private),
            VisibilityFilter::All => None,
        }
    }
}

impl From<Visibility> for VisibilityFilter {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Public => VisibilityFilter::Public,
            Visibility::Private => VisibilityFilter::Private,
        }
    }
}

impl FromStr for VisibilityFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            return Ok(VisibilityFilter::All);
        }
        s.parse::<Visibility>().map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        assert!(VisibilityFilter::All.matches(Visibility::Private));
        assert!(VisibilityFilter::Public.matches(Visibility::Public));
        assert!(!VisibilityFilter::Public.matches(Visibility::Private));
    }

    #[test]
    fn test_parse() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!("ALL".parse::<VisibilityFilter>().unwrap(), VisibilityFilter::All);
        assert_eq!(
            "private".parse::<VisibilityFilter>().unwrap(),
            VisibilityFilter::Private
        );
        assert!("draft".parse::<VisibilityFilter>().is_err());
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Visibility::Private).unwrap(), "\"PRIVATE\"");
        let f: VisibilityFilter = serde_json::from_str("\"ALL\"").unwrap();
        assert_eq!(f, VisibilityFilter::All);
    }
}
