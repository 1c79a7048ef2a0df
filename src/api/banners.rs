// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::Method;
use serde::de::IgnoredAny;
use serde_json::Value;

use super::client::{AdminClient, ApiRequest, FormField};
use super::error::ApiError;
use super::types::{Banner, Id, ImageFile, decode_list};

/// Edit of an existing banner. Without a new `image`, the banner keeps the
/// one at `image_url`.
#[derive(Debug, Clone, Default)]
pub struct BannerUpdate {
    pub series_id: Option<Id>,
    pub image: Option<ImageFile>,
    pub image_url: Option<String>,
}

impl AdminClient {
    pub async fn list_banners(&self) -> Result<Vec<Banner>, ApiError> {
        let value: Value = self.get("/banners").await?;
        decode_list(value, &["banners"])
    }

    pub async fn add_banner(&self, series_id: Id, image: ImageFile) -> Result<Banner, ApiError> {
        let fields = vec![
            FormField::Text {
                name: "seriesId",
                value: series_id.to_string(),
            },
            FormField::File {
                name: "image",
                image,
            },
        ];

        self.send(ApiRequest::new(Method::POST, "/admin/banners").multipart(fields))
            .await
    }

    pub async fn update_banner(&self, id: Id, update: &BannerUpdate) -> Result<Banner, ApiError> {
        let Some(series_id) = update.series_id else {
            return Err(ApiError::MissingField("seriesId"));
        };

        let image_url = update
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        if update.image.is_none() && image_url.is_none() {
            return Err(ApiError::MissingField("image"));
        }

        let mut fields = vec![FormField::Text {
            name: "seriesId",
            value: series_id.to_string(),
        }];
        if let Some(image) = &update.image {
            fields.push(FormField::File {
                name: "image",
                image: image.clone(),
            });
        }
        if let Some(url) = image_url {
            fields.push(FormField::Text {
                name: "imageUrl",
                value: url.to_string(),
            });
        }

        self.send(ApiRequest::new(Method::PUT, format!("/admin/banners/{}", id)).multipart(fields))
            .await
    }

    pub async fn delete_banner(&self, id: Id) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .send(ApiRequest::delete(format!("/admin/banners/{}", id)))
            .await?;
        Ok(())
    }
}
