//! User Entity
//!
//! Admin account profile. Credentials live in `Credentials`.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{email::Email, user_id::UserId};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Sign-in identifier (unique)
    pub email: Email,
    pub display_name: Option<String>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            display_name: display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            last_sign_in_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_sign_in(&mut self) {
        let now = Utc::now();
        self.last_sign_in_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_trims_display_name() {
        let email = Email::new("admin@despacho.es").unwrap();
        let user = User::new(email.clone(), Some("  ".to_string()));
        assert!(user.display_name.is_none());

        let mut user = User::new(email, Some(" Lucía ".to_string()));
        assert_eq!(user.display_name.as_deref(), Some("Lucía"));
        assert!(user.last_sign_in_at.is_none());

        user.record_sign_in();
        assert!(user.last_sign_in_at.is_some());
    }
}
