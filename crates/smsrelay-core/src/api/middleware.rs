//! Request middleware

use axum::{
    extract::{Request, State},
    http::{header::WWW_AUTHENTICATE, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::handlers::AppState;
use crate::config::AuthConfig;

/// Enforce HTTP basic authentication when it is enabled in the config
pub async fn require_basic_auth(
    State(state): State<AppState>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
    request: Request,
    next: Next,
) -> Response {
    let auth = &state.auth;
    if !auth.enabled {
        return next.run(request).await;
    }

    match credentials {
        Some(TypedHeader(basic)) if credentials_match(auth, basic.username(), basic.password()) => {
            next.run(request).await
        }
        _ => {
            warn!(path = %request.uri().path(), "Rejected webhook with invalid credentials");
            (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, "Basic realm=\"smsrelay\"")],
                "Unauthorized",
            )
                .into_response()
        }
    }
}

/// Compare both credentials in constant time; both are always checked.
fn credentials_match(auth: &AuthConfig, username: &str, password: &str) -> bool {
    let username = username.as_bytes().ct_eq(auth.username.as_bytes());
    let password = password.as_bytes().ct_eq(auth.password.as_bytes());
    (username & password).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn auth() -> AuthConfig {
        AuthConfig {
            enabled: true,
            username: "alertmanager".to_string(),
            password: "supersecret".to_string(),
        }
    }

    #[rstest]
    #[case("alertmanager", "supersecret", true)]
    #[case("alertmanagex", "supersecret", false)]
    #[case("alertmanager", "supersecreX", false)]
    #[case("alertmanager", "supersecret!", false)]
    #[case("alert", "super", false)]
    #[case("", "", false)]
    fn test_credentials_match(#[case] username: &str, #[case] password: &str, #[case] expected: bool) {
        assert_eq!(credentials_match(&auth(), username, password), expected);
    }
}
