//! HTTP Handlers

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use platform::rate_limit::MemoryRateLimitStore;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CheckGateUseCase, CheckSessionUseCase, GateCheck, IssuedSession, MfaUseCase,
    RefreshSessionUseCase, SessionView, SignInInput, SignInUseCase, SignOutUseCase, VerifyInput,
};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::aal::AssuranceLevels;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthDiagnosticsResponse, ChallengeRequest, ChallengeResponse, EnrollRequest, EnrollResponse,
    FactorListResponse, RefreshRequest, SessionDto, SessionStatusResponse, SignInRequest,
    TotpEnrollment, UnenrollRequest, UnenrollResponse, VerifyRequest,
};

/// Shared state for auth handlers and the admin gate
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    /// Shared across requests so MFA attempt counts persist
    pub limiter: Arc<MemoryRateLimitStore>,
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self::from_shared(Arc::new(repo), Arc::new(config))
    }

    pub fn from_shared(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            config,
            limiter: Arc::new(MemoryRateLimitStore::new()),
        }
    }
}

// ============================================================================
// Sign In / Sign Out / Refresh
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.config.clone());

    let issued = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(issued_response(&state.config, issued))
}

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    if let Some(token) = access_token(&headers, &state.config) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign-out with unusable token");
        }
    }

    let cookie = state.config.session_cookie().build_delete_cookie();

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// POST /api/auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let use_case = RefreshSessionUseCase::new(state.repo.clone(), state.config.clone());
    let issued = use_case.execute(&req.refresh_token).await?;

    Ok(issued_response(&state.config, issued))
}

/// GET /api/auth/session
///
/// Never fails on a bad token; reports `authenticated: false` instead.
pub async fn session<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Json<SessionStatusResponse>>
where
    R: AuthStore,
{
    let Some(token) = access_token(&headers, &state.config) else {
        return Ok(Json(SessionStatusResponse {
            authenticated: false,
            session: None,
        }));
    };

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());
    match use_case.execute(&token).await {
        Ok(view) => Ok(Json(SessionStatusResponse {
            authenticated: true,
            session: Some(SessionDto::from_view(&token, &view)),
        })),
        Err(AuthError::SessionInvalid) => Ok(Json(SessionStatusResponse {
            authenticated: false,
            session: None,
        })),
        Err(e) => Err(e),
    }
}

// ============================================================================
// MFA (requires authentication)
// ============================================================================

/// GET /api/auth/mfa/factors
pub async fn list_factors<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Json<FactorListResponse>>
where
    R: AuthStore,
{
    let view = require_session(&state, &headers).await?;
    let factors = mfa(&state).list_factors(&view.session).await?;

    Ok(Json(FactorListResponse::new(&factors)))
}

/// POST /api/auth/mfa/enroll
pub async fn enroll<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<EnrollRequest>,
) -> AuthResult<Json<EnrollResponse>>
where
    R: AuthStore,
{
    let view = require_session(&state, &headers).await?;
    let output = mfa(&state).enroll(&view.session, req.friendly_name).await?;

    Ok(Json(EnrollResponse {
        id: output.factor.factor_id,
        factor_type: output.factor.factor_type,
        friendly_name: output.factor.friendly_name,
        totp: TotpEnrollment {
            qr_code: output.qr_code,
            secret: output.secret,
            uri: output.uri,
        },
    }))
}

/// POST /api/auth/mfa/challenge
pub async fn challenge<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<ChallengeRequest>,
) -> AuthResult<Json<ChallengeResponse>>
where
    R: AuthStore,
{
    let view = require_session(&state, &headers).await?;
    let challenge = mfa(&state).challenge(&view.session, &req.factor_id).await?;

    Ok(Json(ChallengeResponse {
        id: challenge.challenge_id,
        factor_id: challenge.factor_id,
        expires_at_ms: challenge.expires_at_ms,
    }))
}

/// POST /api/auth/mfa/verify
///
/// Returns the elevated session and replaces the access cookie.
pub async fn verify<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let view = require_session(&state, &headers).await?;
    let issued = mfa(&state)
        .verify(
            &view.session,
            VerifyInput {
                factor_id: req.factor_id,
                challenge_id: req.challenge_id,
                code: req.code,
            },
        )
        .await?;

    Ok(issued_response(&state.config, issued))
}

/// POST /api/auth/mfa/unenroll
pub async fn unenroll<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<UnenrollRequest>,
) -> AuthResult<Json<UnenrollResponse>>
where
    R: AuthStore,
{
    let view = require_session(&state, &headers).await?;
    mfa(&state).unenroll(&view.session, &req.factor_id).await?;

    Ok(Json(UnenrollResponse { id: req.factor_id }))
}

/// GET /api/auth/mfa/aal
pub async fn assurance_level<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Json<AssuranceLevels>>
where
    R: AuthStore,
{
    let view = require_session(&state, &headers).await?;
    let levels = mfa(&state).assurance_level(&view.session).await?;

    Ok(Json(levels))
}

// ============================================================================
// Diagnostics (exempt from the MFA redirect)
// ============================================================================

/// GET /api/admin/diagnostics/auth
///
/// Reads the `GateCheck` left by `require_admin_gate`; recomputes it when
/// mounted without the middleware.
pub async fn auth_diagnostics<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    check: Option<Extension<GateCheck>>,
) -> AuthResult<Json<AuthDiagnosticsResponse>>
where
    R: AuthStore,
{
    let check = match check {
        Some(Extension(check)) => check,
        None => {
            let token = access_token(&headers, &state.config);
            CheckGateUseCase::new(state.repo.clone(), state.config.clone())
                .execute(token.as_deref())
                .await?
        }
    };

    let mut response = AuthDiagnosticsResponse {
        gate_state: check.state,
        user_id: None,
        email: None,
        aal: None,
        verified_factors: 0,
        unverified_factors: 0,
    };

    if let Some(view) = &check.view {
        let factors = state.repo.list_factors(&view.user.user_id).await?;
        let verified = factors.iter().filter(|f| f.is_verified()).count();

        response.user_id = Some(view.user.user_id);
        response.email = Some(view.user.email.to_string());
        response.aal = Some(view.session.aal);
        response.verified_factors = verified;
        response.unverified_factors = factors.len() - verified;
    }

    Ok(Json(response))
}

// ============================================================================
// Helper Functions
// ============================================================================

pub(crate) fn access_token(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    platform::cookie::extract_access_token(headers, &config.session_cookie_name)
}

async fn require_session<R>(state: &AuthAppState<R>, headers: &HeaderMap) -> AuthResult<SessionView>
where
    R: AuthStore,
{
    let token = access_token(headers, &state.config).ok_or(AuthError::SessionInvalid)?;
    CheckSessionUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&token)
        .await
}

fn mfa<R>(state: &AuthAppState<R>) -> MfaUseCase<R>
where
    R: AuthStore,
{
    MfaUseCase::new(state.repo.clone(), state.config.clone(), state.limiter.clone())
}

fn issued_response(config: &AuthConfig, issued: IssuedSession) -> Response {
    let cookie = config.session_cookie().build_set_cookie(&issued.access_token);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionDto::from(issued)),
    )
        .into_response()
}
