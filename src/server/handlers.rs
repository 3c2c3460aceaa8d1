//! Route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::oauth::{
    begin_auth_with_config_defaults, complete_callback_with_client, CallbackQuery, OAuthError,
};
use crate::clients::AdminClient;
use crate::discounts::{self, DiscountRequest};
use crate::downstream::{DownstreamClient, DownstreamError};
use crate::server::error::ApiError;
use crate::server::AppState;
use crate::webhooks::{VerifiedWebhook, WebhookEnvelope};

/// Topic assumed by the dedicated order route.
const ORDERS_CREATE_TOPIC: &str = "orders/create";

pub async fn root() -> &'static str {
    "shopify-bridge is running"
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartQuery {
    shop: Option<String>,
    #[serde(rename = "brandId")]
    brand_id: Option<String>,
}

/// GET /api/shopify/auth/start
pub async fn auth_start(
    State(state): State<AppState>,
    Query(query): Query<StartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = query
        .shop
        .filter(|s| !s.trim().is_empty())
        .ok_or(OAuthError::MissingParameter { name: "shop" })?;
    let brand_id = query.brand_id.unwrap_or_default();

    let result = begin_auth_with_config_defaults(&state.config, &shop, &brand_id)?;
    tracing::info!(shop = %result.shop, brand_id = %brand_id, "redirecting to Shopify authorization");

    Ok((StatusCode::FOUND, [(header::LOCATION, result.auth_url)]))
}

/// GET /api/shopify/auth/callback
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, ApiError> {
    let credential = complete_callback_with_client(
        &state.config,
        &state.http,
        &query,
        state.state_store.as_ref(),
    )
    .await?;

    let saved = match saver(state.downstream.as_deref()) {
        Some(client) => match client.save_connection(&credential).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(shop = %credential.shop, error = %e, "failed to save shop connection");
                Value::Null
            }
        },
        None => {
            tracing::warn!(shop = %credential.shop, "downstream save URL not configured, skipping save");
            Value::Null
        }
    };

    Ok(Json(json!({
        "ok": true,
        "message": "Shopify shop connected successfully",
        "shop": credential.shop,
        "scope": credential.scopes.to_string(),
        "downstream": saved,
    })))
}

fn saver(downstream: Option<&DownstreamClient>) -> Option<&DownstreamClient> {
    downstream.filter(|client| client.config().save_connection_url_value().is_some())
}

/// POST /api/shopify/webhooks/orders/create
pub async fn orders_create_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let envelope = envelope(&headers, body).with_default_topic(ORDERS_CREATE_TOPIC);
    accept_webhook(&state, &envelope)
}

/// POST /api/shopify/webhooks
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    accept_webhook(&state, &envelope(&headers, body))
}

fn envelope(headers: &HeaderMap, body: Bytes) -> WebhookEnvelope {
    WebhookEnvelope::from_header_lookup(body.to_vec(), |name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
    })
}

fn accept_webhook(state: &AppState, envelope: &WebhookEnvelope) -> Result<Json<Value>, ApiError> {
    let webhook = state.verifier.verify(envelope).map_err(|e| {
        tracing::warn!(
            topic = envelope.topic().unwrap_or_default(),
            shop = envelope.shop_domain().unwrap_or_default(),
            error = %e,
            "rejected webhook"
        );
        ApiError::from(e)
    })?;

    tracing::info!(
        topic = webhook.topic(),
        shop = webhook.shop_domain(),
        length = envelope.body().len(),
        "webhook verified"
    );

    match state.downstream.clone() {
        Some(client) if client.config().webhook_url_value().is_some() => {
            tokio::spawn(forward(client, webhook));
        }
        _ => tracing::debug!("downstream webhook URL not configured, not forwarding"),
    }

    Ok(Json(json!({ "ok": true })))
}

async fn forward(client: Arc<DownstreamClient>, webhook: VerifiedWebhook) {
    match client.forward_webhook(&webhook).await {
        Ok(status) => tracing::info!(
            topic = webhook.topic(),
            key = %webhook.idempotency_key().unwrap_or_default(),
            status,
            "forwarded webhook downstream"
        ),
        Err(e) => tracing::error!(
            topic = webhook.topic(),
            error = %e,
            "failed to forward webhook downstream"
        ),
    }
}

/// POST /api/shopify/discounts/create
pub async fn create_discount(
    State(state): State<AppState>,
    payload: Result<Json<DiscountRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    let downstream = state
        .downstream
        .as_deref()
        .ok_or(DownstreamError::NotConfigured {
            field: "DOWNSTREAM_API_KEY",
        })?;

    let store = downstream.lookup_store(&request.brand_id).await.map_err(|e| {
        tracing::error!(brand_id = %request.brand_id, error = %e, "store lookup failed");
        ApiError::from(e)
    })?;

    let shop = state.config.parse_shop(&store.shop_domain).map_err(|e| {
        ApiError::internal("Downstream store returned an invalid shop domain")
            .with_details(e.to_string())
    })?;
    let client = AdminClient::with_client(
        state.http.clone(),
        &state.config,
        &shop,
        &store.access_token,
    );

    let created = discounts::create_discount(&client, &request)
        .await
        .map_err(|e| {
            tracing::error!(shop = %shop, code = %request.code, error = %e, "discount creation failed");
            ApiError::from(e)
        })?;

    tracing::info!(shop = %shop, code = %request.code, "created discount");

    Ok(Json(json!({
        "ok": true,
        "message": "Discount created successfully",
        "brandId": request.brand_id,
        "shop": shop,
        "percentage": request.percentage,
        "priceRule": created.price_rule,
        "discount": created.discount,
    })))
}

/// GET or POST /api/ping
pub async fn ping(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let downstream = state
        .downstream
        .as_deref()
        .ok_or(DownstreamError::NotConfigured {
            field: "DOWNSTREAM_API_KEY",
        })?;

    let reply = downstream.ping().await.map_err(|e| {
        tracing::error!(error = %e, "downstream ping failed");
        ApiError::from(e)
    })?;

    Ok(Json(json!({ "ok": true, "downstream": reply })))
}
