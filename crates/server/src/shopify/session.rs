//! Session token verification.
//!
//! Shopify embedded apps receive a short-lived JWT identifying the calling
//! shop and user, signed with the app's client secret (HS256). Verification
//! is local; no network call is involved.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims decoded from a Shopify session token.
///
/// `dest` and `sub` are required; the remaining fields are carried through
/// into the response envelope as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Origin URL of the calling shop (e.g., `https://store.myshopify.com`)
    pub dest: String,
    /// ID of the user the token was issued for
    pub sub: String,
    /// Expiry (Unix timestamp, validated during decode)
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Session ID of the embedded-app surface that requested the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

impl SessionClaims {
    /// Shop domain derived from `dest` by stripping the scheme prefix.
    #[must_use]
    pub fn shop_domain(&self) -> &str {
        self.dest
            .strip_prefix("https://")
            .or_else(|| self.dest.strip_prefix("http://"))
            .unwrap_or(&self.dest)
    }
}

/// Session token verification failure.
#[derive(Debug, Error)]
pub enum SessionTokenError {
    /// Signature, algorithm, expiry, or claim-shape check failed.
    #[error("session token rejected: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
}

/// Verify a session token's HS256 signature and decode its claims.
///
/// Tokens signed with any other algorithm are rejected, as are expired or
/// malformed tokens.
///
/// # Errors
///
/// Returns [`SessionTokenError`] if verification fails for any reason.
pub fn verify_session_token(
    token: &str,
    secret: &SecretString,
) -> Result<SessionClaims, SessionTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // The token's `aud` is the app's client ID; it is echoed in the
    // envelope but not used for authorization here.
    validation.validate_aud = false;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )?;

    Ok(data.claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "shpss_test_signing_secret";

    fn claims(dest: &str) -> SessionClaims {
        let now = i64::try_from(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        )
        .unwrap();

        SessionClaims {
            dest: dest.to_string(),
            sub: "42".to_string(),
            exp: now + 60,
            iss: Some(format!("{dest}/admin")),
            aud: Some("test_client_id".to_string()),
            nbf: Some(now - 5),
            iat: Some(now),
            jti: Some("4e7bd9a1".to_string()),
            sid: Some("abc123".to_string()),
        }
    }

    fn mint(claims: &SessionClaims, secret: &str, algorithm: Algorithm) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_roundtrip() {
        let token = mint(
            &claims("https://store.myshopify.com"),
            SECRET,
            Algorithm::HS256,
        );

        let decoded = verify_session_token(&token, &SecretString::from(SECRET)).unwrap();
        assert_eq!(decoded.dest, "https://store.myshopify.com");
        assert_eq!(decoded.sub, "42");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = mint(
            &claims("https://store.myshopify.com"),
            "some-other-secret",
            Algorithm::HS256,
        );

        assert!(verify_session_token(&token, &SecretString::from(SECRET)).is_err());
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let token = mint(
            &claims("https://store.myshopify.com"),
            SECRET,
            Algorithm::HS512,
        );

        assert!(verify_session_token(&token, &SecretString::from(SECRET)).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut expired = claims("https://store.myshopify.com");
        // Beyond the default validation leeway
        expired.exp -= 3600;
        let token = mint(&expired, SECRET, Algorithm::HS256);

        assert!(verify_session_token(&token, &SecretString::from(SECRET)).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(verify_session_token("not-a-jwt", &SecretString::from(SECRET)).is_err());
    }

    #[test]
    fn test_shop_domain_strips_scheme() {
        assert_eq!(
            claims("https://store.myshopify.com").shop_domain(),
            "store.myshopify.com"
        );
        assert_eq!(
            claims("http://store.myshopify.com").shop_domain(),
            "store.myshopify.com"
        );
        assert_eq!(
            claims("store.myshopify.com").shop_domain(),
            "store.myshopify.com"
        );
    }
}
