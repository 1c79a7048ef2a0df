// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use vidadmin::AdminClient;
use vidadmin::api::ImageFile;

pub mod access;
pub mod auth;
pub mod banners;
pub mod episodes;
pub mod series;
pub mod users;

pub use access::AccessCommand;
pub use auth::AuthCommand;
pub use banners::BannerCommand;
pub use episodes::EpisodeCommand;
pub use series::SeriesCommand;
pub use users::UserCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format: {}. Use 'text' or 'json'", s),
        }
    }
}

/// Everything a command needs to talk to the backend and print results
pub struct CommandContext {
    pub client: AdminClient,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn new(client: AdminClient, format: OutputFormat) -> Self {
        Self { client, format }
    }

    /// Print `value` as JSON, or fall back to `text` for the text format
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }

    pub fn require_session(&self) -> Result<()> {
        if self.client.current_session().is_none() {
            anyhow::bail!(vidadmin::ApiError::NotLoggedIn);
        }
        Ok(())
    }
}

/// Run `fut` behind a spinner on stderr
pub async fn with_spinner<F, T>(message: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = fut.await;
    pb.finish_and_clear();
    result
}

pub async fn read_image(path: Option<&Path>) -> Result<Option<ImageFile>> {
    match path {
        Some(path) => Ok(Some(ImageFile::read(path).await?)),
        None => Ok(None),
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}
