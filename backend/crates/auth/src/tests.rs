//! Scenario tests for the auth crate
//! Use cases run against the in-memory store; the client suite talks to a
//! real axum server on a loopback port.

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use crate::application::{
        AuthConfig, IssuedSession, MfaUseCase, SeedAdminInput, SeedAdminUseCase, SignInInput,
        SignInUseCase, VerifyInput,
    };
    use crate::domain::entity::mfa_factor::MfaFactor;
    use crate::infra::memory::MemoryAuthRepository;
    use platform::rate_limit::MemoryRateLimitStore;

    pub const EMAIL: &str = "admin@despacho.example";
    pub const PASSWORD: &str = "Correct-Horse-42";

    pub async fn seeded() -> (Arc<MemoryAuthRepository>, Arc<AuthConfig>) {
        let repo = Arc::new(MemoryAuthRepository::new());
        let config = Arc::new(AuthConfig::development());
        SeedAdminUseCase::new(repo.clone(), config.clone())
            .execute(SeedAdminInput {
                email: EMAIL.to_string(),
                password: PASSWORD.to_string(),
                display_name: Some("Admin".to_string()),
            })
            .await
            .unwrap();
        (repo, config)
    }

    pub async fn sign_in(
        repo: &Arc<MemoryAuthRepository>,
        config: &Arc<AuthConfig>,
        password: &str,
    ) -> crate::AuthResult<IssuedSession> {
        SignInUseCase::new(repo.clone(), config.clone())
            .execute(SignInInput {
                email: EMAIL.to_string(),
                password: password.to_string(),
            })
            .await
    }

    /// Fresh use case with its own attempt counters
    pub fn mfa_use_case(
        repo: &Arc<MemoryAuthRepository>,
        config: &Arc<AuthConfig>,
    ) -> MfaUseCase<MemoryAuthRepository> {
        MfaUseCase::new(
            repo.clone(),
            config.clone(),
            Arc::new(MemoryRateLimitStore::new()),
        )
    }

    pub fn current_code(config: &AuthConfig, factor: &MfaFactor) -> String {
        factor
            .secret
            .generate_current(&config.totp_issuer, EMAIL)
            .unwrap()
    }

    pub fn wrong_code(correct: &str) -> String {
        if correct == "000000" {
            "111111".to_string()
        } else {
            "000000".to_string()
        }
    }

    /// Enroll a factor and verify it; returns the aal2 session
    pub async fn enroll_verified(
        repo: &Arc<MemoryAuthRepository>,
        config: &Arc<AuthConfig>,
        issued: &IssuedSession,
    ) -> (MfaFactor, IssuedSession) {
        let mfa = mfa_use_case(repo, config);
        let enrolled = mfa
            .enroll(&issued.session, Some("Phone".to_string()))
            .await
            .unwrap();
        let challenge = mfa
            .challenge(&issued.session, &enrolled.factor.factor_id)
            .await
            .unwrap();
        let elevated = mfa
            .verify(
                &issued.session,
                VerifyInput {
                    factor_id: enrolled.factor.factor_id,
                    challenge_id: challenge.challenge_id,
                    code: current_code(config, &enrolled.factor),
                },
            )
            .await
            .unwrap();
        (enrolled.factor, elevated)
    }
}

#[cfg(test)]
mod sign_in_tests {
    use super::support::*;
    use crate::application::{CheckSessionUseCase, RefreshSessionUseCase, SignOutUseCase};
    use crate::domain::entity::credentials::Credentials;
    use crate::domain::repository::{CredentialsRepository, UserRepository};
    use crate::domain::value_object::{aal::Aal, email::Email};
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_sign_in_issues_aal1_session() {
        let (repo, config) = seeded().await;

        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        assert_eq!(issued.session.aal, Aal::Aal1);
        assert!(issued.user.last_sign_in_at.is_some());

        let view = CheckSessionUseCase::new(repo.clone(), config.clone())
            .execute(&issued.access_token)
            .await
            .unwrap();
        assert_eq!(view.user.user_id, issued.user.user_id);
    }

    #[tokio::test]
    async fn test_unknown_email_looks_like_wrong_password() {
        let (repo, config) = seeded().await;

        let result = crate::application::SignInUseCase::new(repo.clone(), config.clone())
            .execute(crate::application::SignInInput {
                email: "nobody@despacho.example".to_string(),
                password: PASSWORD.to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_lockout_after_repeated_failures() {
        let (repo, config) = seeded().await;

        for _ in 0..Credentials::MAX_FAILURES {
            let result = sign_in(&repo, &config, "wrong-password").await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }

        // Even the right password is refused while locked
        let result = sign_in(&repo, &config, PASSWORD).await;
        assert!(matches!(result, Err(AuthError::AccountLocked)));

        let email = Email::new(EMAIL).unwrap();
        let user = repo.find_user_by_email(&email).await.unwrap().unwrap();
        let credentials = repo.find_credentials(&user.user_id).await.unwrap().unwrap();
        assert!(credentials.is_locked());
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());
        let rotated = refresh.execute(&issued.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, issued.refresh_token);
        assert_eq!(rotated.session.session_id, issued.session.session_id);

        let reused = refresh.execute(&issued.refresh_token).await;
        assert!(matches!(reused, Err(AuthError::RefreshTokenInvalid)));
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        SignOutUseCase::new(repo.clone(), config.clone())
            .execute(&issued.access_token)
            .await
            .unwrap();

        let check = CheckSessionUseCase::new(repo.clone(), config.clone());
        assert!(!check.is_valid(&issued.access_token).await);
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        let mut tampered = issued.access_token.clone();
        tampered.push('x');
        let result = CheckSessionUseCase::new(repo.clone(), config.clone())
            .execute(&tampered)
            .await;
        assert!(matches!(result, Err(AuthError::SessionInvalid)));
    }
}

#[cfg(test)]
mod mfa_tests {
    use std::sync::Arc;

    use platform::rate_limit::MemoryRateLimitStore;

    use super::support::*;
    use crate::application::{MfaUseCase, VerifyInput};
    use crate::domain::entity::mfa_challenge::MfaChallenge;
    use crate::domain::repository::{MfaChallengeRepository, MfaFactorRepository};
    use crate::domain::value_object::aal::Aal;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_enroll_then_verify_elevates_session() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        let (factor, elevated) = enroll_verified(&repo, &config, &issued).await;
        assert_eq!(elevated.session.aal, Aal::Aal2);
        assert_ne!(elevated.refresh_token, issued.refresh_token);

        let stored = repo.find_factor(&factor.factor_id).await.unwrap().unwrap();
        assert!(stored.is_verified());

        let levels = mfa_use_case(&repo, &config)
            .assurance_level(&elevated.session)
            .await
            .unwrap();
        assert_eq!(levels.current_level, Some(Aal::Aal2));
        assert_eq!(levels.next_level, Some(Aal::Aal2));
    }

    #[tokio::test]
    async fn test_new_enrollment_drops_unverified_ones() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let mfa = mfa_use_case(&repo, &config);

        mfa.enroll(&issued.session, None).await.unwrap();
        mfa.enroll(&issued.session, None).await.unwrap();

        let factors = mfa.list_factors(&issued.session).await.unwrap();
        assert_eq!(factors.len(), 1);
        assert!(!factors[0].is_verified());
    }

    #[tokio::test]
    async fn test_friendly_name_too_long() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        let result = mfa_use_case(&repo, &config)
            .enroll(&issued.session, Some("x".repeat(65)))
            .await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_challenge() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let mfa = mfa_use_case(&repo, &config);

        let enrolled = mfa.enroll(&issued.session, None).await.unwrap();
        let challenge = mfa
            .challenge(&issued.session, &enrolled.factor.factor_id)
            .await
            .unwrap();
        let correct = current_code(&config, &enrolled.factor);

        let result = mfa
            .verify(
                &issued.session,
                VerifyInput {
                    factor_id: enrolled.factor.factor_id,
                    challenge_id: challenge.challenge_id,
                    code: wrong_code(&correct),
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCode)));

        // Same challenge, right code
        let elevated = mfa
            .verify(
                &issued.session,
                VerifyInput {
                    factor_id: enrolled.factor.factor_id,
                    challenge_id: challenge.challenge_id,
                    code: correct.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(elevated.session.aal, Aal::Aal2);

        // A verified challenge cannot be replayed
        let replay = mfa
            .verify(
                &elevated.session,
                VerifyInput {
                    factor_id: enrolled.factor.factor_id,
                    challenge_id: challenge.challenge_id,
                    code: correct,
                },
            )
            .await;
        assert!(matches!(replay, Err(AuthError::ChallengeAlreadyUsed)));
    }

    #[tokio::test]
    async fn test_wrong_codes_are_cut_off_across_challenges() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let (factor, _) = enroll_verified(&repo, &config, &issued).await;

        // Two requests sharing the same counters
        let limiter = Arc::new(MemoryRateLimitStore::new());
        let first = MfaUseCase::new(repo.clone(), config.clone(), limiter.clone());
        let second = MfaUseCase::new(repo.clone(), config.clone(), limiter);

        let aal1 = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let correct = current_code(&config, &factor);
        let max = config.mfa_verify_limit.max_attempts;

        for attempt in 0..max {
            let mfa = if attempt % 2 == 0 { &first } else { &second };
            let challenge = mfa.challenge(&aal1.session, &factor.factor_id).await.unwrap();
            let result = mfa
                .verify(
                    &aal1.session,
                    VerifyInput {
                        factor_id: factor.factor_id,
                        challenge_id: challenge.challenge_id,
                        code: wrong_code(&correct),
                    },
                )
                .await;
            assert!(matches!(result, Err(AuthError::InvalidCode)), "attempt {attempt}");
        }

        // A fresh challenge and the right code no longer help
        let challenge = first
            .challenge(&aal1.session, &factor.factor_id)
            .await
            .unwrap();
        let result = second
            .verify(
                &aal1.session,
                VerifyInput {
                    factor_id: factor.factor_id,
                    challenge_id: challenge.challenge_id,
                    code: correct,
                },
            )
            .await;
        let err = result.err().unwrap();
        let AuthError::TooManyAttempts { retry_after_secs } = err else {
            panic!("expected TooManyAttempts, got {err:?}");
        };
        assert!(retry_after_secs > 0 && retry_after_secs <= 300);
        assert_eq!(err.status_code().as_u16(), 429);

        let response = axum::response::IntoResponse::into_response(err);
        assert!(response.headers().contains_key(axum::http::header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_successful_verify_resets_attempts() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let (factor, _) = enroll_verified(&repo, &config, &issued).await;
        let mfa = mfa_use_case(&repo, &config);
        let correct = current_code(&config, &factor);
        let max = config.mfa_verify_limit.max_attempts;

        // Alternate almost-exhausted runs with a success, twice over
        for _ in 0..2 {
            let aal1 = sign_in(&repo, &config, PASSWORD).await.unwrap();
            let challenge = mfa.challenge(&aal1.session, &factor.factor_id).await.unwrap();
            for _ in 1..max {
                let result = mfa
                    .verify(
                        &aal1.session,
                        VerifyInput {
                            factor_id: factor.factor_id,
                            challenge_id: challenge.challenge_id,
                            code: wrong_code(&correct),
                        },
                    )
                    .await;
                assert!(matches!(result, Err(AuthError::InvalidCode)));
            }
            let elevated = mfa
                .verify(
                    &aal1.session,
                    VerifyInput {
                        factor_id: factor.factor_id,
                        challenge_id: challenge.challenge_id,
                        code: correct.clone(),
                    },
                )
                .await
                .unwrap();
            assert_eq!(elevated.session.aal, Aal::Aal2);
        }
    }

    #[tokio::test]
    async fn test_expired_challenge() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let mfa = mfa_use_case(&repo, &config);

        let enrolled = mfa.enroll(&issued.session, None).await.unwrap();
        let stale = MfaChallenge::new(
            enrolled.factor.factor_id,
            issued.user.user_id,
            chrono::Duration::milliseconds(-1),
        );
        repo.create_challenge(&stale).await.unwrap();

        let result = mfa
            .verify(
                &issued.session,
                VerifyInput {
                    factor_id: enrolled.factor.factor_id,
                    challenge_id: stale.challenge_id,
                    code: current_code(&config, &enrolled.factor),
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::ChallengeExpired)));
        assert_eq!(result.err().map(|e| e.status_code().as_u16()), Some(410));
    }

    #[tokio::test]
    async fn test_challenge_for_foreign_factor() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        let result = mfa_use_case(&repo, &config)
            .challenge(&issued.session, &crate::domain::value_object::mfa::FactorId::new())
            .await;
        assert!(matches!(result, Err(AuthError::FactorNotFound)));
    }

    #[tokio::test]
    async fn test_unenroll_verified_factor_needs_aal2() {
        let (repo, config) = seeded().await;
        let first = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let (factor, elevated) = enroll_verified(&repo, &config, &first).await;
        let mfa = mfa_use_case(&repo, &config);

        let aal1 = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let result = mfa.unenroll(&aal1.session, &factor.factor_id).await;
        assert!(matches!(result, Err(AuthError::InsufficientAal)));

        mfa.unenroll(&elevated.session, &factor.factor_id)
            .await
            .unwrap();
        assert!(repo.find_factor(&factor.factor_id).await.unwrap().is_none());
    }
}

#[cfg(test)]
mod gate_tests {
    use super::support::*;
    use crate::application::CheckGateUseCase;
    use crate::domain::gate::GateState;

    #[tokio::test]
    async fn test_no_token_is_unauthenticated() {
        let (repo, config) = seeded().await;
        let check = CheckGateUseCase::new(repo, config)
            .execute(None)
            .await
            .unwrap();
        assert_eq!(check.state, GateState::Unauthenticated);
        assert!(check.view.is_none());
    }

    #[tokio::test]
    async fn test_without_factor_passes() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();

        let check = CheckGateUseCase::new(repo, config)
            .execute(Some(&issued.access_token))
            .await
            .unwrap();
        assert_eq!(check.state, GateState::None);
    }

    #[tokio::test]
    async fn test_unverified_enrollment_never_gates() {
        let (repo, config) = seeded().await;
        let issued = sign_in(&repo, &config, PASSWORD).await.unwrap();
        mfa_use_case(&repo, &config)
            .enroll(&issued.session, None)
            .await
            .unwrap();

        let check = CheckGateUseCase::new(repo, config)
            .execute(Some(&issued.access_token))
            .await
            .unwrap();
        assert_eq!(check.state, GateState::None);
    }

    #[tokio::test]
    async fn test_verified_factor_requires_aal2() {
        let (repo, config) = seeded().await;
        let first = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let (_, elevated) = enroll_verified(&repo, &config, &first).await;
        let gate = CheckGateUseCase::new(repo.clone(), config.clone());

        let check = gate.execute(Some(&elevated.access_token)).await.unwrap();
        assert_eq!(check.state, GateState::Verified);

        let aal1 = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let check = gate.execute(Some(&aal1.access_token)).await.unwrap();
        assert_eq!(check.state, GateState::Required);
    }
}

#[cfg(test)]
mod middleware_tests {
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::support::*;
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::{AuthAppState, diagnostics_routes, require_admin_gate};

    fn admin_app(state: AuthAppState<MemoryAuthRepository>) -> Router {
        let admin = Router::new()
            .route("/posts", get(|| async { "posts" }))
            .merge(diagnostics_routes(state.clone()))
            .layer(from_fn_with_state(
                state,
                require_admin_gate::<MemoryAuthRepository>,
            ));
        Router::new().nest("/api/admin", admin)
    }

    fn get_with(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_gate_responses() {
        let (repo, config) = seeded().await;
        let state = AuthAppState::from_shared(repo.clone(), config.clone());
        let app = admin_app(state);

        // Signed out
        let response = app
            .clone()
            .oneshot(get_with("/api/admin/posts", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["X-Auth-Required"], "true");

        // No factor enrolled
        let first = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let response = app
            .clone()
            .oneshot(get_with("/api/admin/posts", Some(&first.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Verified factor, aal1 session
        let (_, elevated) = enroll_verified(&repo, &config, &first).await;
        let aal1 = sign_in(&repo, &config, PASSWORD).await.unwrap();
        let response = app
            .clone()
            .oneshot(get_with("/api/admin/posts", Some(&aal1.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["X-MFA-Required"], "true");
        assert_eq!(
            response.headers()[header::LOCATION],
            "/admin/mfa-challenge?returnTo=%2Fadmin"
        );

        // Diagnostics stay reachable
        let response = app
            .clone()
            .oneshot(get_with(
                "/api/admin/diagnostics/auth",
                Some(&aal1.access_token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["gateState"], "required");
        assert_eq!(json["verifiedFactors"], 1);

        // aal2 session
        let response = app
            .oneshot(get_with("/api/admin/posts", Some(&elevated.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[cfg(test)]
mod client_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use reqwest::StatusCode;

    use super::support::*;
    use crate::application::AuthConfig;
    use crate::client::{
        AuthContext, BackendClient, GateEvaluation, HttpBackendClient, MfaChallengeFlow,
        ProtectedArea, RetryReason, SubmitOutcome,
    };
    use crate::domain::gate::{GateOutcome, GateState};
    use crate::domain::value_object::{aal::Aal, totp_secret::TotpSecret};
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::{AuthAppState, auth_routes, diagnostics_routes, require_admin_gate};

    async fn serve() -> (String, Arc<AuthConfig>) {
        let (repo, config) = seeded().await;
        let state = AuthAppState::from_shared(repo, config.clone());

        let admin = Router::new()
            .route("/posts", get(|| async { "posts" }))
            .merge(diagnostics_routes(state.clone()))
            .layer(from_fn_with_state(
                state.clone(),
                require_admin_gate::<MemoryAuthRepository>,
            ));
        let app = Router::new()
            .nest("/api/auth", auth_routes(state))
            .nest("/api/admin", admin);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/api"), config)
    }

    /// Let the context's event listener catch up
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    async fn admin_status(base: &str, client: &HttpBackendClient) -> StatusCode {
        let token = client.current_session().await.unwrap().access_token;
        reqwest::Client::new()
            .get(format!("{base}/admin/posts"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_enroll_challenge_and_gate_end_to_end() {
        let (base, config) = serve().await;
        let client = Arc::new(HttpBackendClient::new(&base).unwrap());
        let context = Arc::new(AuthContext::init(client.clone()).await);
        let area = ProtectedArea::new(context.clone(), config.gate.clone());

        assert!(!context.state().loading);
        assert_eq!(
            area.evaluate("/admin/posts").await.outcome,
            GateOutcome::ShowLogin
        );

        // Sign in without MFA
        let session = context.sign_in_with_password(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(session.aal, Aal::Aal1);
        settle().await;
        assert_eq!(
            area.evaluate("/admin/posts").await,
            GateEvaluation {
                state: GateState::None,
                outcome: GateOutcome::Render,
            }
        );

        // Enroll and verify a TOTP factor
        let enrolled = context.enroll_mfa(Some("Phone")).await.unwrap();
        let secret = TotpSecret::from_base32(enrolled.totp.secret.clone()).unwrap();
        let challenge = context.challenge_mfa(&enrolled.id).await.unwrap();
        let code = secret.generate_current(&config.totp_issuer, EMAIL).unwrap();
        let verified = context
            .verify_mfa(&enrolled.id, &challenge.id, &code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verified.aal, Aal::Aal2);
        assert_eq!(admin_status(&base, &client).await, StatusCode::OK);

        // A fresh sign-in is back at aal1 and must pass the challenge
        context.sign_out().await.unwrap();
        context.sign_in_with_password(EMAIL, PASSWORD).await.unwrap();
        settle().await;

        let evaluation = area.evaluate("/admin/posts").await;
        assert_eq!(evaluation.state, GateState::Required);
        assert_eq!(
            evaluation.outcome,
            GateOutcome::Redirect("/admin/mfa-challenge?returnTo=%2Fadmin%2Fposts".to_string())
        );
        assert_eq!(
            area.evaluate("/admin/mfa-challenge").await.outcome,
            GateOutcome::Render
        );
        assert_eq!(admin_status(&base, &client).await, StatusCode::FORBIDDEN);

        let mut flow = MfaChallengeFlow::new(
            context.clone(),
            &config.gate,
            Duration::from_millis(10),
            Some("/admin/posts"),
        );
        let opened = flow.start().await.unwrap().clone();
        assert_eq!(opened.factor_id, enrolled.id);

        let correct = secret.generate_current(&config.totp_issuer, EMAIL).unwrap();
        assert_eq!(
            flow.submit(&wrong_code(&correct)).await.unwrap(),
            SubmitOutcome::Retry(RetryReason::InvalidCode)
        );
        assert_eq!(flow.challenge().map(|c| c.id), Some(opened.id));

        let correct = secret.generate_current(&config.totp_issuer, EMAIL).unwrap();
        assert_eq!(
            flow.submit(&correct).await.unwrap(),
            SubmitOutcome::Redirect {
                to: "/admin/posts".to_string(),
                confirmed: true,
            }
        );
        settle().await;

        assert_eq!(
            area.evaluate("/admin/posts").await.state,
            GateState::Verified
        );
        assert_eq!(admin_status(&base, &client).await, StatusCode::OK);
        assert_eq!(
            client.get_assurance_level().await.unwrap().current_level,
            Some(Aal::Aal2)
        );
    }

    #[tokio::test]
    async fn test_wrong_password_surfaces_api_error() {
        let (base, _) = serve().await;
        let client = Arc::new(HttpBackendClient::new(&base).unwrap());
        let context = AuthContext::init(client).await;

        let err = context
            .sign_in_with_password(EMAIL, "not-the-password")
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!context.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_get_session_survives_round_trip() {
        let (base, _) = serve().await;
        let client = Arc::new(HttpBackendClient::new(&base).unwrap());

        let signed_in = client.sign_in_with_password(EMAIL, PASSWORD).await.unwrap();
        let current = client.get_session().await.unwrap().unwrap();
        assert_eq!(current.user.id, signed_in.user.id);
        // The session read does not return a refresh token; the stored one is kept
        assert_eq!(current.refresh_token, signed_in.refresh_token);

        client.sign_out().await.unwrap();
        assert!(client.get_session().await.unwrap().is_none());
    }
}
