//! The inventory lookup route.
//!
//! Pipeline per request: bearer extraction → token verification → token
//! exchange → inventory query → envelope assembly. Verification failures
//! short-circuit with 401/403; everything after verification fails soft,
//! landing in the envelope under a 200.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::shopify::{
    ExchangeFailure, InventoryLevels, LocationNode, QueryFailure, SessionClaims,
    exchange_session_token, fetch_variant_inventory, select_match, variant_gid,
    verify_session_token,
};
use crate::state::AppState;

/// Caller-supplied identifiers; both optional, bare numeric or `gid://`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryParams {
    pub location_id: Option<String>,
    pub variant_id: Option<String>,
}

/// The response payload for `GET /inventory`.
///
/// Assembled even when the exchange or the query failed; the error fields
/// keep the four pipeline outcomes distinguishable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEnvelope {
    message: &'static str,
    shop: String,
    user: String,
    location_id: Option<String>,
    variant_id: Option<String>,
    /// Out-of-stock flag: set only when the matched location's available
    /// quantity is exactly zero.
    match_found: bool,
    matched_location: Option<LocationNode>,
    matched_location_inventory: Option<i64>,
    inventory_quantity: Option<i64>,
    /// Duplicate of `inventory_quantity`, kept for existing consumers.
    available_inventory: Option<i64>,
    admin_api_error: Option<Value>,
    admin_api_response: Option<Value>,
    session_payload: SessionClaims,
    access_token: Option<String>,
    exchange_error: Option<Value>,
}

/// CORS preflight. Runs before any authentication so browser preflights
/// (which carry no bearer token) succeed.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Look up the available quantity of a variant at a location.
pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<InventoryParams>,
    headers: HeaderMap,
) -> Result<Json<InventoryEnvelope>, AppError> {
    let token = extract_bearer(&headers).ok_or(AppError::MissingToken)?;

    let claims = verify_session_token(token, &state.config().shopify.api_secret)
        .map_err(AppError::InvalidToken)?;
    let shop = claims.shop_domain().to_string();

    let exchange = exchange_session_token(state.http(), &state.config().shopify, &shop, token).await;

    // The query stage only runs with an access token and both identifiers;
    // anything missing means the stage is skipped, not failed.
    let query = match (&exchange, &params.variant_id, &params.location_id) {
        (Ok(access_token), Some(variant_id), Some(_)) => Some(
            fetch_variant_inventory(
                state.http(),
                &shop,
                &state.config().shopify.api_version,
                access_token,
                &variant_gid(variant_id),
            )
            .await,
        ),
        _ => None,
    };

    Ok(Json(assemble_envelope(
        claims,
        shop,
        params,
        exchange,
        query,
        state.config().expose_diagnostics,
    )))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Merge the pipeline stage outcomes into one envelope.
///
/// Pure; no I/O. The access token and the raw Admin API payload are
/// development-only diagnostics and serialize as null unless
/// `expose_diagnostics` is on.
fn assemble_envelope(
    claims: SessionClaims,
    shop: String,
    params: InventoryParams,
    exchange: Result<String, ExchangeFailure>,
    query: Option<Result<InventoryLevels, QueryFailure>>,
    expose_diagnostics: bool,
) -> InventoryEnvelope {
    let (access_token, exchange_error) = match exchange {
        Ok(token) => (Some(token), None),
        Err(failure) => (None, Some(failure.detail)),
    };

    let mut match_found = false;
    let mut matched_location = None;
    let mut inventory_quantity = None;
    let mut admin_api_error = None;
    let mut admin_api_response = None;

    if let Some(outcome) = query {
        match outcome {
            Ok(levels) => {
                admin_api_response = Some(levels.raw);
                if let Some(requested) = params.location_id.as_deref()
                    && let Some(m) = select_match(levels.nodes, requested)
                {
                    inventory_quantity = m.quantity;
                    match_found = m.quantity == Some(0);
                    matched_location = Some(m.location);
                }
            }
            Err(failure) => admin_api_error = Some(failure.detail),
        }
    }

    InventoryEnvelope {
        message: "POS token authenticated, token exchange and Admin API query attempted",
        shop,
        user: claims.sub.clone(),
        location_id: params.location_id,
        variant_id: params.variant_id,
        match_found,
        matched_location,
        matched_location_inventory: inventory_quantity,
        inventory_quantity,
        available_inventory: inventory_quantity,
        admin_api_error,
        admin_api_response: expose_diagnostics.then_some(admin_api_response).flatten(),
        session_payload: claims,
        access_token: expose_diagnostics.then_some(access_token).flatten(),
        exchange_error,
    }
}
