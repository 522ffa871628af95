//! AAL Gate
//!
//! One decision function shared by the request-level middleware and the
//! client-side `ProtectedArea`. Both feed it the same two facts (is there a
//! verified factor, what level did the store report) and so reach the same
//! verdict for the same session.
//!
//! ```text
//! unauthenticated ──sign-in──▶ checking ──0 verified factors──▶ none      (render)
//!                                  │
//!                                  └──≥1 verified──▶ aal2?  yes ▶ verified (render)
//!                                                           no  ▶ required (redirect)
//! ```

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::domain::entity::mfa_factor::MfaFactor;
use crate::domain::value_object::{aal::Aal, mfa::FactorStatus};

/// Outcome of the AAL decision for an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No verified factor enrolled; pass through
    None,
    /// Verified factor exists but the session is not aal2
    Required,
    /// Session reached aal2
    Verified,
}

/// Decide whether an authenticated session satisfies MFA.
///
/// A missing level (query failed or returned nothing) never counts as aal2.
pub fn decide(has_verified_factor: bool, level: Option<Aal>) -> Verdict {
    if !has_verified_factor {
        return Verdict::None;
    }
    match level {
        Some(Aal::Aal2) => Verdict::Verified,
        Some(Aal::Aal1) | None => Verdict::Required,
    }
}

/// A factor as seen by the gate: a stored factor or its wire form
pub trait GateFactor {
    fn factor_status(&self) -> FactorStatus;
}

impl GateFactor for MfaFactor {
    fn factor_status(&self) -> FactorStatus {
        self.status
    }
}

/// Unverified (in-progress) enrollments never gate access
pub fn has_verified_factor<F: GateFactor>(factors: &[F]) -> bool {
    factors.iter().any(|f| f.factor_status().is_verified())
}

/// Full gate state, including the states before a verdict exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Unauthenticated,
    Checking,
    None,
    Required,
    Verified,
}

impl From<Verdict> for GateState {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::None => GateState::None,
            Verdict::Required => GateState::Required,
            Verdict::Verified => GateState::Verified,
        }
    }
}

impl GateState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GateState::Unauthenticated => "unauthenticated",
            GateState::Checking => "checking",
            GateState::None => "none",
            GateState::Required => "required",
            GateState::Verified => "verified",
        }
    }

    /// Whether protected content may be produced
    pub const fn allows_access(&self) -> bool {
        matches!(self, GateState::None | GateState::Verified)
    }
}

/// What the caller should do for a given state and route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    ShowLogin,
    /// Still resolving; render nothing protected yet
    Pending,
    Render,
    Redirect(String),
}

/// Route rules around the admin namespace
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub admin_root: String,
    pub challenge_route: String,
    /// Routes that never redirect to the challenge (the challenge itself, diagnostics)
    pub exempt_prefixes: Vec<String>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            admin_root: "/admin".to_string(),
            challenge_route: "/admin/mfa-challenge".to_string(),
            exempt_prefixes: vec![
                "/admin/mfa-challenge".to_string(),
                "/admin/diagnostics".to_string(),
                "/api/admin/diagnostics".to_string(),
            ],
        }
    }
}

impl GatePolicy {
    pub fn is_exempt(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.exempt_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn outcome(&self, state: GateState, path: &str) -> GateOutcome {
        match state {
            GateState::Unauthenticated => GateOutcome::ShowLogin,
            GateState::Checking => GateOutcome::Pending,
            GateState::None | GateState::Verified => GateOutcome::Render,
            GateState::Required if self.is_exempt(path) => GateOutcome::Render,
            GateState::Required => GateOutcome::Redirect(self.challenge_redirect(path)),
        }
    }

    /// `/admin/mfa-challenge?returnTo=<sanitised path>`
    pub fn challenge_redirect(&self, return_to: &str) -> String {
        let target = self.sanitize_return_path(Some(return_to));
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("returnTo", &target)
            .finish();
        format!("{}?{}", self.challenge_route, query)
    }

    /// Same-site absolute paths only; anything else lands on the admin root
    pub fn sanitize_return_path(&self, path: Option<&str>) -> String {
        let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
            return self.admin_root.clone();
        };

        let same_site = path.starts_with('/')
            && !path.starts_with("//")
            && !path.contains('\\')
            && !path.chars().any(char::is_control);
        if !same_site {
            return self.admin_root.clone();
        }

        // API paths are not pages; returning to the challenge would loop
        let bare = strip_query(path);
        if bare.starts_with("/api/") || bare == self.challenge_route {
            return self.admin_root.clone();
        }

        path.to_string()
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_id::UserId;

    #[test]
    fn test_decide_without_verified_factor_passes() {
        assert_eq!(decide(false, None), Verdict::None);
        assert_eq!(decide(false, Some(Aal::Aal1)), Verdict::None);
        assert_eq!(decide(false, Some(Aal::Aal2)), Verdict::None);
    }

    #[test]
    fn test_decide_fails_closed() {
        assert_eq!(decide(true, None), Verdict::Required);
        assert_eq!(decide(true, Some(Aal::Aal1)), Verdict::Required);
        assert_eq!(decide(true, Some(Aal::Aal2)), Verdict::Verified);
    }

    #[test]
    fn test_unverified_factors_do_not_count() {
        let user_id = UserId::new();
        let pending = vec![
            MfaFactor::enroll_totp(user_id, None),
            MfaFactor::enroll_totp(user_id, None),
        ];
        assert!(!has_verified_factor(&pending));
        assert_eq!(decide(has_verified_factor(&pending), Some(Aal::Aal1)), Verdict::None);

        let mut verified = MfaFactor::enroll_totp(user_id, None);
        verified.mark_verified();
        let mixed = [pending, vec![verified]].concat();
        assert!(has_verified_factor(&mixed));
    }

    #[test]
    fn test_wire_factors_agree_with_stored_ones() {
        use crate::presentation::dto::FactorDto;

        let user_id = UserId::new();
        let mut verified = MfaFactor::enroll_totp(user_id, None);
        verified.mark_verified();

        for stored in [
            vec![MfaFactor::enroll_totp(user_id, None)],
            vec![MfaFactor::enroll_totp(user_id, None), verified],
            vec![],
        ] {
            let wire: Vec<FactorDto> = stored.iter().map(FactorDto::from).collect();
            assert_eq!(has_verified_factor(&wire), has_verified_factor(&stored));
        }
    }

    #[test]
    fn test_outcomes() {
        let policy = GatePolicy::default();
        assert_eq!(
            policy.outcome(GateState::Unauthenticated, "/admin/posts"),
            GateOutcome::ShowLogin
        );
        assert_eq!(policy.outcome(GateState::Checking, "/admin"), GateOutcome::Pending);
        assert_eq!(policy.outcome(GateState::None, "/admin/posts"), GateOutcome::Render);
        assert_eq!(policy.outcome(GateState::Verified, "/admin/posts"), GateOutcome::Render);
        assert_eq!(
            policy.outcome(GateState::Required, "/admin/posts"),
            GateOutcome::Redirect("/admin/mfa-challenge?returnTo=%2Fadmin%2Fposts".to_string())
        );
    }

    #[test]
    fn test_exempt_routes_never_redirect() {
        let policy = GatePolicy::default();
        for path in [
            "/admin/mfa-challenge",
            "/admin/mfa-challenge?returnTo=%2Fadmin",
            "/admin/diagnostics/auth",
            "/api/admin/diagnostics/auth",
        ] {
            assert!(policy.is_exempt(path), "{path}");
            assert_eq!(policy.outcome(GateState::Required, path), GateOutcome::Render);
        }
        assert!(!policy.is_exempt("/admin/mfa-challenge-other"));
        assert!(!policy.is_exempt("/admin"));
    }

    #[test]
    fn test_sanitize_return_path() {
        let policy = GatePolicy::default();
        assert_eq!(policy.sanitize_return_path(None), "/admin");
        assert_eq!(policy.sanitize_return_path(Some("")), "/admin");
        assert_eq!(policy.sanitize_return_path(Some("/admin/posts?page=2")), "/admin/posts?page=2");
        assert_eq!(policy.sanitize_return_path(Some("//evil.example")), "/admin");
        assert_eq!(policy.sanitize_return_path(Some("https://evil.example")), "/admin");
        assert_eq!(policy.sanitize_return_path(Some("/\\evil.example")), "/admin");
        assert_eq!(policy.sanitize_return_path(Some("/api/admin/posts")), "/admin");
        assert_eq!(policy.sanitize_return_path(Some("/admin/mfa-challenge")), "/admin");
    }

    #[test]
    fn test_state_wire_format() {
        assert_eq!(serde_json::to_string(&GateState::Required).unwrap(), "\"required\"");
        assert_eq!(GateState::from(Verdict::None), GateState::None);
        assert!(GateState::None.allows_access());
        assert!(!GateState::Required.allows_access());
    }
}
