// Token gate - bearer extraction plus verification against the external
// identity provider.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::viewer::{Principal, ViewerContext};

/// Identity confirmed by the verifier.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub claims: Map<String, Value>,
}

/// External identity verifier. A rejection is any `Err`; the gate reports it
/// as `InvalidToken`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedIdentity>;
}

/// Verifies HS256-signed JWTs. The subject (`sub`, or `user_id` when the
/// provider sends that instead) becomes the principal id.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedIdentity> {
        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let uid = claims
            .get("sub")
            .or_else(|| claims.get("user_id"))
            .and_then(Value::as_str)
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| anyhow::anyhow!("token has no subject"))?
            .to_string();

        Ok(VerifiedIdentity { uid, claims })
    }
}

/// Pull the bearer credential out of the `Authorization` header. Anything
/// other than a non-empty `Bearer` token counts as no credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct TokenGate {
    verifier: Arc<dyn IdentityVerifier>,
}

impl TokenGate {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }

    /// Resolve the request's principal, failing when no credential is
    /// present or the verifier rejects it.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<Principal> {
        let token = bearer_token(headers).ok_or(AppError::Unauthenticated)?;
        self.verify(token).await
    }

    /// Build the request's viewer context. A missing credential yields an
    /// anonymous viewer, which gated operations reject; a bad one fails here.
    pub async fn resolve_viewer(&self, headers: &HeaderMap) -> AppResult<ViewerContext> {
        let request_id = format!("req-{}", Uuid::new_v4());
        match self.authenticate(headers).await {
            Ok(principal) => {
                debug!(request_id = %request_id, uid = %principal.id, "authenticated request");
                Ok(ViewerContext::authenticated(principal, request_id))
            }
            Err(AppError::Unauthenticated) => Ok(ViewerContext::anonymous(request_id)),
            Err(err) => Err(err),
        }
    }

    async fn verify(&self, token: &str) -> AppResult<Principal> {
        match self.verifier.verify(token).await {
            Ok(identity) => Ok(Principal::with_claims(identity.uid, identity.claims)),
            Err(err) => {
                warn!(error = %err, "rejected bearer token");
                Err(AppError::InvalidToken(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token(claims: Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn gate() -> TokenGate {
        TokenGate::new(Arc::new(JwtVerifier::new(SECRET, None, None)))
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let t = token(json!({"sub": "alice", "email": "a@x.io", "exp": exp()}), SECRET);
        let principal = gate()
            .authenticate(&headers(&format!("Bearer {}", t)))
            .await
            .unwrap();

        assert_eq!(principal.id, "alice");
        assert_eq!(principal.email(), Some("a@x.io"));
    }

    #[tokio::test]
    async fn test_authenticate_missing_credential() {
        let err = gate().authenticate(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_signature_and_expiry() {
        let forged = token(json!({"sub": "alice", "exp": exp()}), "other-secret");
        let err = gate()
            .authenticate(&headers(&format!("Bearer {}", forged)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));

        let expired = token(json!({"sub": "alice", "exp": 1_000}), SECRET);
        let err = gate()
            .authenticate(&headers(&format!("Bearer {}", expired)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));

        let err = gate()
            .authenticate(&headers("Bearer not-a-jwt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_subject_required() {
        let t = token(json!({"email": "a@x.io", "exp": exp()}), SECRET);
        let err = gate()
            .authenticate(&headers(&format!("Bearer {}", t)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_resolve_viewer() {
        let anon = gate().resolve_viewer(&HeaderMap::new()).await.unwrap();
        assert!(!anon.is_authenticated());

        let t = token(json!({"user_id": "bob", "exp": exp()}), SECRET);
        let vc = gate()
            .resolve_viewer(&headers(&format!("Bearer {}", t)))
            .await
            .unwrap();
        assert_eq!(vc.principal().unwrap().id, "bob");

        let basic = gate().resolve_viewer(&headers("Basic abc")).await.unwrap();
        assert!(!basic.is_authenticated());

        let err = gate()
            .resolve_viewer(&headers("Bearer not-a-jwt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_issuer_checked_when_configured() {
        let gate = TokenGate::new(Arc::new(JwtVerifier::new(SECRET, Some("issuer-a"), None)));
        let t = token(json!({"sub": "alice", "iss": "issuer-b", "exp": exp()}), SECRET);
        let err = gate
            .authenticate(&headers(&format!("Bearer {}", t)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }
}
