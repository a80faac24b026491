//! `AppError` to HTTP response mapping, checked without a server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use storefront_api::error::AppError;
use storefront_core::error::CoreError;
use storefront_db::error::{HydrationError, WriteError};
use storefront_db::DbError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_names_the_entity() {
    let (status, json) = error_to_response(AppError::Core(CoreError::NotFound {
        entity: "User",
        id: 42,
    }))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "User with id 42 not found");
}

#[tokio::test]
async fn generic_not_found_from_storage() {
    let (status, json) =
        error_to_response(AppError::Db(DbError::Database(sqlx::Error::RowNotFound))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Resource not found");
}

#[tokio::test]
async fn validation_error_keeps_its_message() {
    let (status, json) = error_to_response(AppError::Db(DbError::Core(CoreError::Validation(
        "order must contain at least one product".into(),
    ))))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "order must contain at least one product");
}

#[tokio::test]
async fn hydration_failure_is_sanitized() {
    let source = serde_json::from_str::<i64>("\"x\"").unwrap_err();
    let (status, json) = error_to_response(AppError::Db(DbError::Hydration(HydrationError {
        target: "product",
        source,
    })))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn failed_transaction_open_is_internal() {
    let (status, _) = error_to_response(AppError::Db(DbError::Write(WriteError::TransactionOpen {
        aggregate: "order_insert",
        source: sqlx::Error::PoolTimedOut,
    })))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn bad_request_and_internal_variants() {
    let (status, json) = error_to_response(AppError::BadRequest("destination is required".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let (status, json) = error_to_response(AppError::InternalError("disk on fire".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}
