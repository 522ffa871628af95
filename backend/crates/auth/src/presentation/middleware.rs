//! Admin Gate Middleware
//!
//! Request-level AAL gate in front of every admin route. The verdict comes
//! from `CheckGateUseCase`, which re-reads session and factors from the
//! store on every request.

use axum::Json;
use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::application::CheckGateUseCase;
use crate::domain::gate::GateState;
use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{AuthAppState, access_token};

/// Let the request through only for `none`/`verified` sessions
///
/// - unauthenticated: `401` + `X-Auth-Required: true`
/// - MFA required: `403` + `X-MFA-Required: true` + `Location` of the challenge
/// - exempt routes (challenge, diagnostics) always run
///
/// The `GateCheck` is stored in request extensions for downstream handlers.
pub async fn require_admin_gate<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthStore,
{
    // Nested routers see a stripped URI
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let token = access_token(req.headers(), &state.config);

    let use_case = CheckGateUseCase::new(state.repo.clone(), state.config.clone());
    let check = match use_case.execute(token.as_deref()).await {
        Ok(check) => check,
        Err(e) => return Err(e.into_response()),
    };

    let policy = &state.config.gate;
    let state_now = check.state;

    if policy.is_exempt(&path) {
        req.extensions_mut().insert(check);
        return Ok(next.run(req).await);
    }

    match state_now {
        GateState::Unauthenticated | GateState::Checking => {
            Err((StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response())
        }
        GateState::Required => {
            let location = policy.challenge_redirect(&path);
            tracing::debug!(path = %path, "Admin request needs MFA");
            Err((
                StatusCode::FORBIDDEN,
                [
                    ("X-MFA-Required", "true".to_string()),
                    (header::LOCATION.as_str(), location.clone()),
                ],
                Json(json!({
                    "title": "Forbidden",
                    "status": 403,
                    "detail": "Two-factor verification is required",
                    "redirectTo": location,
                })),
            )
                .into_response())
        }
        GateState::None | GateState::Verified => {
            req.extensions_mut().insert(check);
            Ok(next.run(req).await)
        }
    }
}
