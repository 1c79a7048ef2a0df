// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::Method;
use serde::de::IgnoredAny;

use super::client::{AdminClient, ApiRequest, FormField};
use super::error::ApiError;
use super::types::{Episode, Id, ImageFile, require};

#[derive(Debug, Clone, Default)]
pub struct EpisodeForm {
    pub title: String,
    pub episode_number: Option<u32>,
    pub video_url: String,
    pub image: Option<ImageFile>,
}

impl EpisodeForm {
    fn check(&self) -> Result<(), ApiError> {
        require(&self.title, "title")?;
        if self.episode_number.is_none() {
            return Err(ApiError::MissingField("episodeNumber"));
        }
        require(&self.video_url, "videoUrl")
    }

    fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::Text {
                name: "title",
                value: self.title.clone(),
            },
            FormField::Text {
                name: "episodeNumber",
                value: self
                    .episode_number
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            },
            FormField::Text {
                name: "videoUrl",
                value: self.video_url.clone(),
            },
        ];
        if let Some(image) = &self.image {
            fields.push(FormField::File {
                name: "image",
                image: image.clone(),
            });
        }
        fields
    }
}

impl AdminClient {
    pub async fn list_episodes(&self, series_id: Id) -> Result<Vec<Episode>, ApiError> {
        self.get(&format!("/series/{}/episodes", series_id)).await
    }

    pub async fn get_episode(&self, series_id: Id, episode_id: Id) -> Result<Episode, ApiError> {
        self.get(&format!("/series/{}/episode/{}", series_id, episode_id))
            .await
    }

    /// New episodes need every field, thumbnail included.
    pub async fn create_episode(&self, series_id: Id, form: &EpisodeForm) -> Result<Episode, ApiError> {
        form.check()?;
        if form.image.is_none() {
            return Err(ApiError::MissingField("image"));
        }

        self.send(
            ApiRequest::new(Method::POST, format!("/admin/series/{}/episodes", series_id))
                .multipart(form.fields()),
        )
        .await
    }

    pub async fn update_episode(&self, episode_id: Id, form: &EpisodeForm) -> Result<Episode, ApiError> {
        form.check()?;

        self.send(
            ApiRequest::new(Method::PUT, format!("/admin/series/episodes/{}", episode_id))
                .multipart(form.fields()),
        )
        .await
    }

    pub async fn delete_episode(&self, episode_id: Id) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .send(ApiRequest::delete(format!(
                "/admin/series/episodes/{}",
                episode_id
            )))
            .await?;
        Ok(())
    }
}
