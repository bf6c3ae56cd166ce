use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::token::EXPIRATION_TIME;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize)]
pub struct Body {
    pub email: String,
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
}

/// Handler to log a user in and issue a session token.
pub async fn handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Body>, JsonRejection>,
) -> Result<Json<Response>> {
    let Json(body) = body?;

    let (_, token) =
        state.accounts().login(&body.email, &body.password).await?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token,
        expires_in: EXPIRATION_TIME,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn register(state: &AppState) {
        state
            .accounts()
            .register("Ann", "ann@x.com", "secret1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_handler() {
        let state = router::state();
        register(&state).await;
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/users/login",
            json!({ "email": "ann@x.com", "password": "secret1" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.token_type, TOKEN_TYPE);
        assert_eq!(body.expires_in, EXPIRATION_TIME);

        let claims = state.token.decode(&body.token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.email, "ann@x.com");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let state = router::state();
        register(&state).await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/users/login",
            json!({ "email": "ann@x.com", "password": "wrong" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_unknown_email() {
        let state = router::state();
        register(&state).await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/users/login",
            json!({ "email": "bob@x.com", "password": "secret1" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
