//! Login and registration endpoints

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiResult, Envelope};
use crate::types::{AuthPayload, AuthToken, Company, RegisterRequest};

#[derive(Deserialize)]
struct CompanyData {
    company: Company,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthPayload> {
        let envelope = self
            .client
            .post("/api/auth/login", &LoginRequest { email, password })
            .await?;
        into_payload(envelope)
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload> {
        let envelope = self.client.post("/api/auth/register", request).await?;
        into_payload(envelope)
    }
}

/// A success envelope must carry both a token and the company
fn into_payload(envelope: Envelope<CompanyData>) -> ApiResult<AuthPayload> {
    let token = envelope
        .token
        .clone()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Decode("authentication response has no token".to_string()))?;
    let company = envelope.into_data()?.company;

    Ok(AuthPayload {
        token: AuthToken::new(token),
        company,
    })
}
