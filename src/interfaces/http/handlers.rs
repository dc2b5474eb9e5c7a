use super::AppState;
use super::dto::{PaymentRequest, PaymentResponse};
use super::error::ApiError;
use crate::domain::payment::{OrderId, PaymentId};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde_json::{Value, json};
use tracing::info;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

type ApiResult<T> = Result<T, ApiError>;

pub async fn process_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let Json(request) = payload?;
    info!(
        order_id = ?request.order_id,
        amount = ?request.amount,
        method = ?request.payment_method,
        "Received payment request"
    );

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let command = request.validate(idempotency_key)?;

    let payment = state.engine.process(command).await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

pub async fn get_payment(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<PaymentResponse>> {
    let Path(id) = id?;
    let payment = state.engine.get_by_id(PaymentId::new(id)).await?;
    Ok(Json(payment.into()))
}

pub async fn get_payments_by_order(
    State(state): State<AppState>,
    order_id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Vec<PaymentResponse>>> {
    let Path(order_id) = order_id?;
    let payments = state.engine.get_by_order(OrderId::new(order_id)).await?;
    let body = payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(body))
}

pub async fn refund_payment(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<PaymentResponse>> {
    let Path(id) = id?;
    let payment = state.engine.refund(PaymentId::new(id)).await?;
    Ok(Json(payment.into()))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.engine.delete(PaymentId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}
