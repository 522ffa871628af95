//! Component-level gate around the protected admin area
//!
//! Runs the same `decide` as the request middleware, but against the
//! reactive `AuthContext` and the live assurance-level query.

use std::sync::Arc;

use crate::client::backend::BackendClient;
use crate::client::context::AuthContext;
use crate::domain::gate::{GateOutcome, GatePolicy, GateState, decide, has_verified_factor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEvaluation {
    pub state: GateState,
    pub outcome: GateOutcome,
}

pub struct ProtectedArea<C> {
    context: Arc<AuthContext<C>>,
    policy: GatePolicy,
}

impl<C> ProtectedArea<C>
where
    C: BackendClient + Sync + 'static,
{
    pub fn new(context: Arc<AuthContext<C>>, policy: GatePolicy) -> Self {
        Self { context, policy }
    }

    /// Gate state for the current auth state
    ///
    /// A failure to list factors keeps the gate in `checking`; a failure to
    /// read the assurance level counts as "not aal2".
    pub async fn state(&self) -> GateState {
        let auth = self.context.state();
        if auth.loading {
            return GateState::Checking;
        }
        if !auth.is_authenticated() {
            return GateState::Unauthenticated;
        }

        let factors = match self.context.get_mfa_factors().await {
            Ok(factors) => factors,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list MFA factors");
                return GateState::Checking;
            }
        };
        if !has_verified_factor(&factors.all) {
            return decide(false, None).into();
        }

        let level = match self.context.get_aal_level().await {
            Ok(levels) => levels.current_level,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read assurance level");
                None
            }
        };
        decide(true, level).into()
    }

    /// What to show for `path`
    pub async fn evaluate(&self, path: &str) -> GateEvaluation {
        let state = self.state().await;
        GateEvaluation {
            state,
            outcome: self.policy.outcome(state, path),
        }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::noop::NoopClient;

    #[tokio::test]
    async fn test_signed_out_shows_login() {
        let context = Arc::new(AuthContext::init(Arc::new(NoopClient::new())).await);
        let area = ProtectedArea::new(context, GatePolicy::default());

        let evaluation = area.evaluate("/admin/posts").await;
        assert_eq!(evaluation.state, GateState::Unauthenticated);
        assert_eq!(evaluation.outcome, GateOutcome::ShowLogin);
    }
}
