//! Announcement board endpoints (`/api/announcements`)

use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiResult};
use crate::types::{Announcement, AnnouncementInput};
use crate::validation;

#[derive(Deserialize)]
struct AnnouncementList {
    announcements: Vec<Announcement>,
}

#[derive(Deserialize)]
struct AnnouncementData {
    announcement: Announcement,
}

/// Announcements outside the requirement bounds are a schema mismatch
fn checked(announcement: Announcement) -> ApiResult<Announcement> {
    validation::check_requirement_bounds(&announcement.requirements).map_err(|reason| {
        ApiError::Decode(format!("announcement {}: {}", announcement.id, reason))
    })?;
    Ok(announcement)
}

#[derive(Clone)]
pub struct AnnouncementService {
    client: Arc<ApiClient>,
}

impl AnnouncementService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Announcement>> {
        self.client.require_token()?;
        let envelope = self.client.get::<AnnouncementList>("/api/announcements").await?;
        envelope
            .into_data()?
            .announcements
            .into_iter()
            .map(checked)
            .collect()
    }

    pub async fn get(&self, id: i64) -> ApiResult<Announcement> {
        self.client.require_token()?;
        let envelope = self
            .client
            .get::<AnnouncementData>(&format!("/api/announcements/{}", id))
            .await?;
        checked(envelope.into_data()?.announcement)
    }

    pub async fn create(&self, input: &AnnouncementInput) -> ApiResult<Announcement> {
        self.client.require_token()?;
        let envelope = self
            .client
            .post::<_, AnnouncementData>("/api/announcements", input)
            .await?;
        checked(envelope.into_data()?.announcement)
    }

    pub async fn update(&self, id: i64, input: &AnnouncementInput) -> ApiResult<Announcement> {
        self.client.require_token()?;
        let envelope = self
            .client
            .put::<_, AnnouncementData>(&format!("/api/announcements/{}", id), input)
            .await?;
        checked(envelope.into_data()?.announcement)
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.require_token()?;
        self.client
            .delete(&format!("/api/announcements/{}", id))
            .await
    }
}
