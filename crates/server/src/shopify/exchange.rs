//! Session token exchange.
//!
//! Trades a verified session token for an Admin API access token via the
//! shop's OAuth token endpoint. One POST, no retries: any failure is
//! captured verbatim and surfaced in the response envelope while the rest
//! of the pipeline is skipped.

use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ShopifyAppConfig;

const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";

/// Token exchange failure, carrying the upstream response body (or the
/// transport error message) verbatim for diagnostics.
#[derive(Debug, Error)]
#[error("token exchange failed: {detail}")]
pub struct ExchangeFailure {
    pub detail: Value,
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    subject_token: &'a str,
    subject_token_type: &'a str,
}

/// Exchange a verified session token for an Admin API access token.
///
/// Network failure, a non-2xx response, and a 2xx response without an
/// `access_token` field are all the same category of failure.
///
/// # Errors
///
/// Returns [`ExchangeFailure`] with the upstream body or error message.
#[instrument(skip_all, fields(shop = %shop))]
pub async fn exchange_session_token(
    client: &reqwest::Client,
    config: &ShopifyAppConfig,
    shop: &str,
    session_token: &str,
) -> Result<String, ExchangeFailure> {
    let url = format!("https://{shop}/admin/oauth/access_token");

    let body = ExchangeRequest {
        client_id: &config.api_key,
        client_secret: config.api_secret.expose_secret(),
        grant_type: TOKEN_EXCHANGE_GRANT_TYPE,
        subject_token: session_token,
        subject_token_type: ID_TOKEN_TYPE,
    };

    let response = match client.post(&url).json(&body).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "token exchange request failed");
            return Err(ExchangeFailure {
                detail: Value::String(e.to_string()),
            });
        }
    };

    let status = response.status();
    let payload = read_body_verbatim(response).await;

    if status.is_success()
        && let Some(access_token) = payload.get("access_token").and_then(Value::as_str)
    {
        debug!("access token obtained");
        return Ok(access_token.to_string());
    }

    warn!(status = %status, "token exchange rejected");
    Err(ExchangeFailure { detail: payload })
}

/// Read a response body as JSON, falling back to the raw text (or the read
/// error message) so nothing is lost for diagnostics.
async fn read_body_verbatim(response: reqwest::Response) -> Value {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(e) => Value::String(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_failure_display_carries_detail() {
        let failure = ExchangeFailure {
            detail: serde_json::json!({"error": "invalid_subject_token"}),
        };

        assert!(failure.to_string().contains("invalid_subject_token"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ExchangeRequest {
            client_id: "key",
            client_secret: "secret",
            grant_type: TOKEN_EXCHANGE_GRANT_TYPE,
            subject_token: "jwt",
            subject_token_type: ID_TOKEN_TYPE,
        };

        let json = serde_json::to_value(&body).expect("serializable");
        assert_eq!(
            json["grant_type"],
            "urn:ietf:params:oauth:grant-type:token-exchange"
        );
        assert_eq!(
            json["subject_token_type"],
            "urn:ietf:params:oauth:token-type:id_token"
        );
        assert_eq!(json["subject_token"], "jwt");
    }
}
