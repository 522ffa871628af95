//! Authentication Assurance Level
//!
//! `aal1` = password only, `aal2` = password + verified second factor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use kernel::error::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aal {
    Aal1,
    Aal2,
}

impl Aal {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Aal::Aal1 => "aal1",
            Aal::Aal2 => "aal2",
        }
    }
}

impl fmt::Display for Aal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aal {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aal1" => Ok(Aal::Aal1),
            "aal2" => Ok(Aal::Aal2),
            other => Err(AppError::bad_request(format!(
                "Unknown assurance level: {other}"
            ))),
        }
    }
}

/// Result of the assurance-level query
///
/// `current_level` is what the session has reached; `next_level` is what
/// the user could reach (`aal2` as soon as a verified factor exists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssuranceLevels {
    pub current_level: Option<Aal>,
    pub next_level: Option<Aal>,
}

impl AssuranceLevels {
    pub fn new(current: Aal, has_verified_factor: bool) -> Self {
        Self {
            current_level: Some(current),
            next_level: Some(if has_verified_factor {
                Aal::Aal2
            } else {
                current
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&Aal::Aal2).unwrap(), "\"aal2\"");
        assert_eq!("aal1".parse::<Aal>().unwrap(), Aal::Aal1);
        assert!("aal3".parse::<Aal>().is_err());
    }

    #[test]
    fn test_next_level() {
        let levels = AssuranceLevels::new(Aal::Aal1, true);
        assert_eq!(levels.current_level, Some(Aal::Aal1));
        assert_eq!(levels.next_level, Some(Aal::Aal2));

        let levels = AssuranceLevels::new(Aal::Aal1, false);
        assert_eq!(levels.next_level, Some(Aal::Aal1));

        let json = serde_json::to_value(levels).unwrap();
        assert_eq!(json["currentLevel"], "aal1");
    }
}
