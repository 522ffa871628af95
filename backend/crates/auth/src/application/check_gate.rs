//! Check Gate Use Case
//!
//! Request-side half of the AAL gate. Re-derives everything from the store:
//! token → session → verified factors → `decide`.

use std::sync::Arc;

use crate::application::check_session::{CheckSessionUseCase, SessionView};
use crate::application::config::AuthConfig;
use crate::domain::gate::{GateState, decide, has_verified_factor};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct GateCheck {
    pub state: GateState,
    /// Present for every state except `Unauthenticated`
    pub view: Option<SessionView>,
}

impl GateCheck {
    fn unauthenticated() -> Self {
        Self {
            state: GateState::Unauthenticated,
            view: None,
        }
    }
}

pub struct CheckGateUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> CheckGateUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Store failures propagate; callers must not treat them as access
    pub async fn execute(&self, access_token: Option<&str>) -> AuthResult<GateCheck> {
        let Some(token) = access_token else {
            return Ok(GateCheck::unauthenticated());
        };

        let check = CheckSessionUseCase::new(self.repo.clone(), self.config.clone());
        let view = match check.execute(token).await {
            Ok(view) => view,
            Err(AuthError::SessionInvalid | AuthError::UserNotFound) => {
                return Ok(GateCheck::unauthenticated());
            }
            Err(e) => return Err(e),
        };

        let factors = self.repo.list_factors(&view.user.user_id).await?;
        let verdict = decide(has_verified_factor(&factors), Some(view.session.aal));

        Ok(GateCheck {
            state: verdict.into(),
            view: Some(view),
        })
    }
}
