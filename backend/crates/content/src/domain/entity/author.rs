//! Author entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::AuthorId;
use crate::error::{ContentError, ContentResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub profile_picture_url: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAuthor {
    pub name: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub profile_picture_url: Option<String>,
    pub email: Option<String>,
}

/// `Some(None)` clears an optional field
#[derive(Debug, Clone, Default)]
pub struct AuthorPatch {
    pub name: Option<String>,
    pub role: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub profile_picture_url: Option<Option<String>>,
    pub email: Option<Option<String>>,
}

impl Author {
    pub fn create(input: NewAuthor) -> ContentResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: AuthorId::new(),
            name: validate_name(&input.name)?,
            role: trimmed(input.role),
            description: trimmed(input.description),
            profile_picture_url: trimmed(input.profile_picture_url),
            email: validate_email(input.email)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns whether the name changed
    pub fn apply(&mut self, patch: AuthorPatch) -> ContentResult<bool> {
        let mut renamed = false;
        if let Some(name) = patch.name {
            let name = validate_name(&name)?;
            renamed = name != self.name;
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = trimmed(role);
        }
        if let Some(description) = patch.description {
            self.description = trimmed(description);
        }
        if let Some(url) = patch.profile_picture_url {
            self.profile_picture_url = trimmed(url);
        }
        if let Some(email) = patch.email {
            self.email = validate_email(email)?;
        }
        self.updated_at = Utc::now();
        Ok(renamed)
    }
}

fn validate_name(name: &str) -> ContentResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ContentError::Validation("Author name is required".to_string()));
    }
    Ok(name.to_string())
}

fn validate_email(email: Option<String>) -> ContentResult<Option<String>> {
    let email = trimmed(email);
    if let Some(email) = &email {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(ContentError::Validation(format!("Invalid email: {email}")));
        }
    }
    Ok(email)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_rename() {
        let mut author = Author::create(NewAuthor {
            name: "Lucía Fernández".to_string(),
            email: Some(" lucia@despacho.example ".to_string()),
            role: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(author.email.as_deref(), Some("lucia@despacho.example"));
        assert!(author.role.is_none());

        let renamed = author
            .apply(AuthorPatch {
                name: Some("Lucía Fernández Ruiz".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(renamed);

        let renamed = author
            .apply(AuthorPatch {
                role: Some(Some("Socia".to_string())),
                ..Default::default()
            })
            .unwrap();
        assert!(!renamed);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Author::create(NewAuthor::default()).is_err());
        assert!(
            Author::create(NewAuthor {
                name: "X".to_string(),
                email: Some("not-an-email".to_string()),
                ..Default::default()
            })
            .is_err()
        );
    }
}
