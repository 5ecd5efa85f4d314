//! Partner project endpoints (`/api/projects`)

use serde::Deserialize;
use std::sync::Arc;

use crate::http::{ApiClient, ApiResult};
use crate::types::{Project, ProjectInput};

#[derive(Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct ProjectData {
    project: Project,
}

#[derive(Clone)]
pub struct ProjectService {
    client: Arc<ApiClient>,
}

impl ProjectService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Projects where the current company is customer or executor
    pub async fn list(&self) -> ApiResult<Vec<Project>> {
        self.client.require_token()?;
        let envelope = self.client.get::<ProjectList>("/api/projects").await?;
        Ok(envelope.into_data()?.projects)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Project> {
        self.client.require_token()?;
        let envelope = self
            .client
            .get::<ProjectData>(&format!("/api/projects/{}", id))
            .await?;
        Ok(envelope.into_data()?.project)
    }

    pub async fn create(&self, input: &ProjectInput) -> ApiResult<Project> {
        self.client.require_token()?;
        let envelope = self
            .client
            .post::<_, ProjectData>("/api/projects", input)
            .await?;
        Ok(envelope.into_data()?.project)
    }

    pub async fn update(&self, id: i64, input: &ProjectInput) -> ApiResult<Project> {
        self.client.require_token()?;
        let envelope = self
            .client
            .put::<_, ProjectData>(&format!("/api/projects/{}", id), input)
            .await?;
        Ok(envelope.into_data()?.project)
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.require_token()?;
        self.client.delete(&format!("/api/projects/{}", id)).await
    }
}
