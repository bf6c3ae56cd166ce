use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "Password must be at least 6 characters long."
    ))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub message: String,
}

/// Handler to register user.
pub async fn handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Body>, JsonRejection>,
) -> Result<(StatusCode, Json<Response>)> {
    let Json(body) = body?;
    body.validate()?;

    let id = state
        .accounts()
        .register(&body.name, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            id,
            message: "User registered successfully.".to_owned(),
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_handler() {
        let state = router::state();
        let app = app(state.clone());

        let req_body = Body {
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password: "secret1".into(),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/users/register",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.id, 1);

        let user = state
            .db
            .users
            .find_user_by_email("ann@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.name, "Ann");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_create_with_invalid_email() {
        let app = app(router::state());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/users/register",
            json!({
                "name": "Ann",
                "email": "not-an-email",
                "password": "secret1",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let app = app(router::state());

        let body = json!({
            "name": "Ann",
            "email": "ann@x.com",
            "password": "secret1",
        })
        .to_string();

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/users/register",
            body.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            make_request(None, app, Method::POST, "/users/register", body)
                .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
