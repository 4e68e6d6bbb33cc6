//! 认证 handlers
//!
//! - POST /token：表单提交 username/password，返回 Bearer access token

use crate::AppState;
use crate::utils::response::{auth_error, internal_auth_error};
use api_contract::{ApiResponse, TokenRequest, TokenResponse};
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use iot_auth::AuthError;
use tracing::warn;

/// 口令换取 access token。
pub async fn issue_token(State(state): State<AppState>, Form(payload): Form<TokenRequest>) -> Response {
    match state.auth.login(&payload.username, &payload.password) {
        Ok(tokens) => (
            StatusCode::OK,
            Json(ApiResponse::success(TokenResponse {
                access_token: tokens.access_token,
                token_type: tokens.token_type.to_string(),
                expires_in: tokens.expires_in,
            })),
        )
            .into_response(),
        Err(AuthError::InvalidCredentials) => {
            warn!(target: "iot.api", username = %payload.username, "token_rejected");
            auth_error(StatusCode::UNAUTHORIZED)
        }
        Err(err) => internal_auth_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, state_with};
    use iot_storage::InMemorySampleStore;
    use std::sync::Arc;

    fn form(username: &str, password: &str) -> Form<TokenRequest> {
        Form(TokenRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn issues_verifiable_token() {
        let state = state_with(Arc::new(InMemorySampleStore::new()), true);
        let response = issue_token(State(state.clone()), form("admin", "admin")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["token_type"], "bearer");
        assert_eq!(body["data"]["expires_in"], 3600);
        let token = body["data"]["access_token"].as_str().expect("token");
        assert_eq!(state.auth.verify_access_token(token).expect("verify"), "admin");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = state_with(Arc::new(InMemorySampleStore::new()), true);
        let response = issue_token(State(state), form("admin", "wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "AUTH.UNAUTHORIZED");
    }
}
