use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pondok_domain::ResolvedIdentity;

use crate::dto::PaymentTokenResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_payment_token_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(invoice_id): Path<String>,
) -> ApiResult<(StatusCode, Json<PaymentTokenResponse>)> {
    let token = state
        .function_service
        .create_payment_token(&identity, invoice_id.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(PaymentTokenResponse::from(token))))
}
