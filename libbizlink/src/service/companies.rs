//! Company directory and profile endpoints (`/api/companies`)

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;

use crate::http::{ApiClient, ApiResult};
use crate::types::{Company, UpdateCompanyRequest};

#[derive(Deserialize)]
struct CompanyList {
    companies: Vec<Company>,
}

#[derive(Deserialize)]
struct CompanyData {
    company: Company,
}

#[derive(Clone)]
pub struct CompanyService {
    client: Arc<ApiClient>,
}

impl CompanyService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `GET /api/companies`
    pub async fn list(&self) -> ApiResult<Vec<Company>> {
        self.client.require_token()?;
        let envelope = self.client.get::<CompanyList>("/api/companies").await?;
        Ok(envelope.into_data()?.companies)
    }

    /// The authenticated company
    pub async fn me(&self) -> ApiResult<Company> {
        self.client.require_token()?;
        let envelope = self.client.get::<CompanyData>("/api/companies/me").await?;
        Ok(envelope.into_data()?.company)
    }

    pub async fn update_me(&self, request: &UpdateCompanyRequest) -> ApiResult<Company> {
        self.client.require_token()?;
        let envelope = self
            .client
            .put::<_, CompanyData>("/api/companies/me", request)
            .await?;
        Ok(envelope.into_data()?.company)
    }

    pub async fn update(&self, id: i64, request: &UpdateCompanyRequest) -> ApiResult<Company> {
        self.client.require_token()?;
        let envelope = self
            .client
            .put::<_, CompanyData>(&format!("/api/companies/{}", id), request)
            .await?;
        Ok(envelope.into_data()?.company)
    }

    /// Upload a profile photo as the multipart field `photo`
    pub async fn upload_photo(&self, id: i64, bytes: Vec<u8>, filename: &str) -> ApiResult<Company> {
        self.client.require_token()?;
        let form = Form::new().part("photo", Part::bytes(bytes).file_name(filename.to_string()));
        let envelope = self
            .client
            .post_multipart::<CompanyData>(&format!("/api/companies/{}/photo", id), form)
            .await?;
        Ok(envelope.into_data()?.company)
    }
}
