// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::Method;
use serde_json::Value;

use super::client::{AdminClient, ApiRequest, FormField};
use super::error::ApiError;
use super::types::{Id, ImageFile, Series, SeriesStatus, decode_list, require};

/// Fields of the series create/edit form.
#[derive(Debug, Clone, Default)]
pub struct SeriesForm {
    pub title: String,
    pub status: SeriesStatus,
    pub image: Option<ImageFile>,
}

impl SeriesForm {
    fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::Text {
                name: "title",
                value: self.title.clone(),
            },
            FormField::Text {
                name: "status",
                value: self.status.to_string(),
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
    pub async fn list_series(&self) -> Result<Vec<Series>, ApiError> {
        let value: Value = self.get("/series/all").await?;
        decode_list(value, &["series", "movies"])
    }

    pub async fn get_series(&self, id: Id) -> Result<Series, ApiError> {
        self.get(&format!("/series/{}", id)).await
    }

    /// Video URLs across every series.
    pub async fn list_all_videos(&self) -> Result<Vec<String>, ApiError> {
        self.get("/admin/series/all").await
    }

    pub async fn create_series(&self, form: &SeriesForm) -> Result<Series, ApiError> {
        require(&form.title, "title")?;
        if form.image.is_none() {
            return Err(ApiError::MissingField("image"));
        }

        self.send(ApiRequest::new(Method::POST, "/series/add").multipart(form.fields()))
            .await
    }

    /// Edit title and status; the image is replaced only when one is given.
    pub async fn update_series(&self, id: Id, form: &SeriesForm) -> Result<Series, ApiError> {
        require(&form.title, "title")?;

        self.send(
            ApiRequest::new(Method::PUT, format!("/admin/series/{}", id)).multipart(form.fields()),
        )
        .await
    }
}
