// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use vidadmin::api::{Id, Series, SeriesForm, SeriesStatus};

use super::{CommandContext, or_dash, read_image, with_spinner};

#[derive(Debug, Subcommand)]
pub enum SeriesCommand {
    /// List every series
    List {
        /// Only titles containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one series with its episodes
    Show { id: Id },

    /// Create a series
    Create {
        #[arg(short, long)]
        title: String,
        /// COMING_SOON, PUBLISHED, UNLISTED, ARCHIVED, DRAFT or REMOVED
        #[arg(short, long, default_value = "COMING_SOON")]
        status: SeriesStatus,
        /// Cover image file
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Edit title, status, and optionally the cover image
    Update {
        id: Id,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        status: Option<SeriesStatus>,
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// List every video URL across all series
    Videos,
}

impl SeriesCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        context.require_session()?;
        let client = &context.client;

        match self {
            Self::List { search } => {
                let all = client.list_series().await?;
                let series: Vec<&Series> =
                    vidadmin::api::access::filter_series(&all, search.as_deref().unwrap_or(""));

                context.emit(&series, || {
                    if series.is_empty() {
                        println!("No series found");
                    }
                    for s in &series {
                        print_row(s);
                    }
                })?;
            }

            Self::Show { id } => {
                let series = client.get_series(id).await?;
                let episodes = client.list_episodes(id).await?;

                let payload = serde_json::json!({ "series": &series, "episodes": &episodes });
                context.emit(&payload, || {
                    println!("{} (#{})", series.title, series.id);
                    println!("  Status: {}", or_dash(series.status.as_deref()));
                    if let Some(url) = series.image_path.as_deref().and_then(|p| client.media_url(p)) {
                        println!("  Cover:  {}", url);
                    }
                    println!("  Episodes: {}", episodes.len());
                    for ep in &episodes {
                        println!(
                            "    {:>3}. {} (#{})",
                            ep.episode_number.map(|n| n.to_string()).unwrap_or_default(),
                            ep.title,
                            ep.id
                        );
                    }
                })?;
            }

            Self::Create {
                title,
                status,
                image,
            } => {
                let form = SeriesForm {
                    title,
                    status,
                    image: read_image(Some(image.as_path())).await?,
                };
                let created = with_spinner("Uploading series...", client.create_series(&form)).await?;
                context.emit(&created, || {
                    println!("✓ Created series {} (#{})", created.title, created.id)
                })?;
            }

            Self::Update {
                id,
                title,
                status,
                image,
            } => {
                // Unset fields keep their current values
                let current = client.get_series(id).await?;
                let form = SeriesForm {
                    title: title.unwrap_or(current.title),
                    status: match status {
                        Some(status) => status,
                        None => current
                            .status
                            .as_deref()
                            .and_then(|s| s.parse().ok())
                            .unwrap_or_default(),
                    },
                    image: read_image(image.as_deref()).await?,
                };
                let updated = with_spinner("Saving series...", client.update_series(id, &form)).await?;
                context.emit(&updated, || {
                    println!("✓ Updated series {} (#{})", updated.title, updated.id)
                })?;
            }

            Self::Videos => {
                let videos = client.list_all_videos().await?;
                context.emit(&videos, || {
                    if videos.is_empty() {
                        println!("No videos found");
                    }
                    for url in &videos {
                        println!("{}", url);
                    }
                })?;
            }
        }

        Ok(())
    }
}

fn print_row(series: &Series) {
    println!(
        "{:6} | {:<12} | {}",
        series.id,
        or_dash(series.status.as_deref()),
        series.title
    );
}
