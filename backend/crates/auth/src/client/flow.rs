//! MFA challenge page flow
//!
//! `start` picks the first verified factor and opens a challenge for it;
//! `submit` verifies a code and tells the caller where to go next.

use std::sync::Arc;
use std::time::Duration;

use crate::client::backend::BackendClient;
use crate::client::context::AuthContext;
use crate::client::error::{ClientError, ClientResult};
use crate::domain::gate::GatePolicy;
use crate::domain::value_object::{aal::Aal, mfa::FactorId};
use crate::presentation::dto::ChallengeResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Wrong code; the same challenge stays open
    InvalidCode,
    /// The challenge was gone; a fresh one has been created
    ChallengeExpired,
    /// Too many wrong codes; the service refuses attempts for a while
    TooManyAttempts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Verification succeeded. `confirmed` is false when the service had
    /// not reported aal2 yet and the flow waited out the propagation delay.
    Redirect { to: String, confirmed: bool },
    Retry(RetryReason),
}

pub struct MfaChallengeFlow<C> {
    context: Arc<AuthContext<C>>,
    propagation_delay: Duration,
    return_to: String,
    factor_id: Option<FactorId>,
    challenge: Option<ChallengeResponse>,
}

impl<C> MfaChallengeFlow<C>
where
    C: BackendClient + Sync + 'static,
{
    pub fn new(
        context: Arc<AuthContext<C>>,
        policy: &GatePolicy,
        propagation_delay: Duration,
        return_to: Option<&str>,
    ) -> Self {
        Self {
            context,
            propagation_delay,
            return_to: policy.sanitize_return_path(return_to),
            factor_id: None,
            challenge: None,
        }
    }

    pub fn return_to(&self) -> &str {
        &self.return_to
    }

    pub fn factor_id(&self) -> Option<FactorId> {
        self.factor_id
    }

    pub fn challenge(&self) -> Option<&ChallengeResponse> {
        self.challenge.as_ref()
    }

    /// Pick the first verified factor and open a challenge
    pub async fn start(&mut self) -> ClientResult<&ChallengeResponse> {
        let factors = self.context.get_mfa_factors().await?;
        let factor = factors
            .all
            .iter()
            .find(|f| f.status.is_verified())
            .ok_or(ClientError::NoVerifiedFactor)?;

        let challenge = self.context.challenge_mfa(&factor.id).await?;
        self.factor_id = Some(factor.id);
        Ok(self.challenge.insert(challenge))
    }

    pub async fn submit(&mut self, code: &str) -> ClientResult<SubmitOutcome> {
        let (Some(factor_id), Some(challenge_id)) =
            (self.factor_id, self.challenge.as_ref().map(|c| c.id))
        else {
            return Err(ClientError::NoChallenge);
        };

        match self
            .context
            .verify_mfa(&factor_id, &challenge_id, code.trim())
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_invalid_code() => {
                return Ok(SubmitOutcome::Retry(RetryReason::InvalidCode));
            }
            Err(e) if e.is_rate_limited() => {
                return Ok(SubmitOutcome::Retry(RetryReason::TooManyAttempts));
            }
            Err(e) if e.is_challenge_expired() => {
                tracing::debug!(error = %e, "Challenge no longer usable, opening a new one");
                self.challenge = Some(self.context.challenge_mfa(&factor_id).await?);
                return Ok(SubmitOutcome::Retry(RetryReason::ChallengeExpired));
            }
            Err(e) => return Err(e),
        }
        self.challenge = None;

        let confirmed = matches!(
            self.context.get_aal_level().await,
            Ok(levels) if levels.current_level == Some(Aal::Aal2)
        );
        if !confirmed {
            tracing::info!(
                delay_ms = self.propagation_delay.as_millis() as u64,
                "aal2 not visible yet, redirecting after delay"
            );
            tokio::time::sleep(self.propagation_delay).await;
        }

        Ok(SubmitOutcome::Redirect {
            to: self.return_to.clone(),
            confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::noop::NoopClient;

    #[tokio::test]
    async fn test_submit_before_start() {
        let context = Arc::new(AuthContext::init(Arc::new(NoopClient::new())).await);
        let mut flow = MfaChallengeFlow::new(
            context,
            &GatePolicy::default(),
            Duration::from_millis(1),
            Some("//evil.example"),
        );

        assert_eq!(flow.return_to(), "/admin");
        assert!(matches!(
            flow.submit("123456").await,
            Err(ClientError::NoChallenge)
        ));
        assert!(matches!(flow.start().await, Err(ClientError::NotConfigured)));
    }
}
