// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::Subcommand;
use inquire::Confirm;
use serde_json::json;
use std::path::PathBuf;

use vidadmin::api::{BannerUpdate, Id, ImageFile};

use super::{CommandContext, read_image, with_spinner};

#[derive(Debug, Subcommand)]
pub enum BannerCommand {
    /// List banners
    List,

    /// Upload a banner for a series
    Add {
        #[arg(short, long)]
        series_id: Id,
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Change a banner's series or image
    Update {
        id: Id,
        #[arg(short, long)]
        series_id: Option<Id>,
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Delete a banner
    Delete {
        id: Id,
        #[arg(short, long)]
        yes: bool,
    },
}

impl BannerCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        context.require_session()?;
        let client = &context.client;

        match self {
            Self::List => {
                let banners = client.list_banners().await?;
                context.emit(&banners, || {
                    if banners.is_empty() {
                        println!("No banners found");
                    }
                    for banner in &banners {
                        println!(
                            "{:6} | series {:>6} | {}",
                            banner.id,
                            banner
                                .series_id
                                .map(|id| id.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            banner
                                .image
                                .as_deref()
                                .and_then(|p| client.media_url(p))
                                .unwrap_or_else(|| "-".to_string())
                        );
                    }
                })?;
            }

            Self::Add { series_id, image } => {
                let image = ImageFile::read(&image).await?;
                let banner = with_spinner("Uploading banner...", client.add_banner(series_id, image)).await?;
                context.emit(&banner, || println!("✓ Created banner #{}", banner.id))?;
            }

            Self::Update {
                id,
                series_id,
                image,
            } => {
                let current = client
                    .list_banners()
                    .await?
                    .into_iter()
                    .find(|b| b.id == id)
                    .ok_or_else(|| anyhow::anyhow!("Banner #{} not found", id))?;

                let update = BannerUpdate {
                    series_id: series_id.or(current.series_id),
                    image: read_image(image.as_deref()).await?,
                    image_url: current.image,
                };
                let banner = with_spinner("Saving banner...", client.update_banner(id, &update)).await?;
                context.emit(&banner, || println!("✓ Updated banner #{}", banner.id))?;
            }

            Self::Delete { id, yes } => {
                if !yes {
                    let unlinked = client
                        .list_banners()
                        .await?
                        .iter()
                        .any(|b| b.id == id && b.series_id.is_none());
                    let prompt = if unlinked {
                        format!("Banner #{} is not linked to a series. Delete it anyway?", id)
                    } else {
                        format!("Delete banner #{}?", id)
                    };
                    if !Confirm::new(&prompt).with_default(false).prompt()? {
                        return Ok(());
                    }
                }

                client.delete_banner(id).await?;
                context.emit(&json!({ "deleted": id }), || println!("✓ Deleted banner #{}", id))?;
            }
        }

        Ok(())
    }
}
