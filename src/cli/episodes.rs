// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::Subcommand;
use inquire::Confirm;
use serde_json::json;
use std::path::PathBuf;

use vidadmin::api::{EpisodeForm, Id};

use super::{CommandContext, or_dash, read_image, with_spinner};

#[derive(Debug, Subcommand)]
pub enum EpisodeCommand {
    /// List episodes of a series
    List { series_id: Id },

    /// Show one episode
    Show { series_id: Id, episode_id: Id },

    /// Add an episode to a series
    Create {
        series_id: Id,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        number: u32,
        #[arg(short = 'u', long)]
        video_url: String,
        /// Thumbnail image file
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Edit an episode
    Update {
        series_id: Id,
        episode_id: Id,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        number: Option<u32>,
        #[arg(short = 'u', long)]
        video_url: Option<String>,
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Delete an episode
    Delete {
        episode_id: Id,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl EpisodeCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        context.require_session()?;
        let client = &context.client;

        match self {
            Self::List { series_id } => {
                let episodes = client.list_episodes(series_id).await?;
                context.emit(&episodes, || {
                    if episodes.is_empty() {
                        println!("No episodes in series #{}", series_id);
                    }
                    for ep in &episodes {
                        println!(
                            "{:6} | {:>3} | {} | {}",
                            ep.id,
                            ep.episode_number.map(|n| n.to_string()).unwrap_or_default(),
                            ep.title,
                            or_dash(ep.video_url.as_deref())
                        );
                    }
                })?;
            }

            Self::Show {
                series_id,
                episode_id,
            } => {
                let ep = client.get_episode(series_id, episode_id).await?;
                context.emit(&ep, || {
                    println!("{} (#{})", ep.title, ep.id);
                    println!(
                        "  Number: {}",
                        ep.episode_number.map(|n| n.to_string()).unwrap_or_default()
                    );
                    println!("  Video:  {}", or_dash(ep.video_url.as_deref()));
                    if let Some(url) = ep.image_path.as_deref().and_then(|p| client.media_url(p)) {
                        println!("  Thumb:  {}", url);
                    }
                })?;
            }

            Self::Create {
                series_id,
                title,
                number,
                video_url,
                image,
            } => {
                let form = EpisodeForm {
                    title,
                    episode_number: Some(number),
                    video_url,
                    image: read_image(Some(image.as_path())).await?,
                };
                let created = with_spinner(
                    "Uploading episode...",
                    client.create_episode(series_id, &form),
                )
                .await?;
                context.emit(&created, || {
                    println!("✓ Created episode {} (#{})", created.title, created.id)
                })?;
            }

            Self::Update {
                series_id,
                episode_id,
                title,
                number,
                video_url,
                image,
            } => {
                let current = client.get_episode(series_id, episode_id).await?;
                let form = EpisodeForm {
                    title: title.unwrap_or(current.title),
                    episode_number: number.or_else(|| {
                        current.episode_number.and_then(|n| u32::try_from(n).ok())
                    }),
                    video_url: video_url.or(current.video_url).unwrap_or_default(),
                    image: read_image(image.as_deref()).await?,
                };
                let updated = with_spinner(
                    "Saving episode...",
                    client.update_episode(episode_id, &form),
                )
                .await?;
                context.emit(&updated, || {
                    println!("✓ Updated episode {} (#{})", updated.title, updated.id)
                })?;
            }

            Self::Delete { episode_id, yes } => {
                if !yes
                    && !Confirm::new(&format!("Delete episode #{}?", episode_id))
                        .with_default(false)
                        .prompt()?
                {
                    return Ok(());
                }

                client.delete_episode(episode_id).await?;
                context.emit(&json!({ "deleted": episode_id }), || {
                    println!("✓ Deleted episode #{}", episode_id)
                })?;
            }
        }

        Ok(())
    }
}
