// Request-scoped viewer context. Created once per request by the token gate
// and handed to every service operation.

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Authenticated identity resolved from a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: String,
    pub claims: Map<String, Value>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            claims: Map::new(),
        }
    }

    pub fn with_claims(id: impl Into<String>, claims: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            claims,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.get("email").and_then(Value::as_str)
    }

    /// Display name from the token, if the identity provider sent one.
    pub fn name(&self) -> Option<&str> {
        self.claims.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    principal: Option<Principal>,
}

impl ViewerContext {
    pub fn authenticated(principal: Principal, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            principal: Some(principal),
        }
    }

    pub fn anonymous(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            principal: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// The caller's principal; every gated operation starts here.
    pub fn principal(&self) -> AppResult<&Principal> {
        self.principal.as_ref().ok_or(AppError::Unauthenticated)
    }
}
