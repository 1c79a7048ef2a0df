// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

use vidadmin::api::access::{active_series, can_view};
use vidadmin::api::{AccessGrant, Id};

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum AccessCommand {
    /// Show grants for every user
    List,

    /// Show one user's grants
    Show { user_id: Id },

    /// Replace a user's grants with exactly these series
    Set {
        user_id: Id,
        /// Series ids; pass none to revoke everything
        series_ids: Vec<Id>,
    },

    /// Grant one series to a user
    Grant { user_id: Id, series_id: Id },

    /// Revoke one series from a user
    Revoke { user_id: Id, series_id: Id },

    /// Check whether a user can watch a series right now
    Check { user_id: Id, series_id: Id },
}

impl AccessCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        context.require_session()?;
        let client = &context.client;

        match self {
            Self::List => {
                let map = client.list_access().await?;
                let users = client.list_users().await?;
                let names: BTreeMap<Id, &str> =
                    users.iter().map(|u| (u.id, u.username.as_str())).collect();

                context.emit(&map, || {
                    if map.is_empty() {
                        println!("No access grants");
                    }
                    for (user_id, grants) in &map {
                        println!(
                            "{} (#{}):",
                            names.get(user_id).copied().unwrap_or("?"),
                            user_id
                        );
                        print_grants(grants);
                    }
                })?;
            }

            Self::Show { user_id } => {
                let grants = client.user_access(user_id).await?;
                context.emit(&grants, || print_grants(&grants))?;
            }

            Self::Set {
                user_id,
                series_ids,
            } => {
                let ids: BTreeSet<Id> = series_ids.into_iter().collect();
                client.set_user_access(user_id, &ids).await?;
                context.emit(&json!({ "userId": user_id, "seriesIds": ids }), || {
                    println!("✓ User #{} now has access to {} series", user_id, ids.len())
                })?;
            }

            Self::Grant { user_id, series_id } => {
                let changed = client.grant_access(user_id, series_id).await?;
                context.emit(
                    &json!({ "userId": user_id, "seriesId": series_id, "changed": changed }),
                    || {
                        if changed {
                            println!("✓ Granted series #{} to user #{}", series_id, user_id)
                        } else {
                            println!("User #{} already has series #{}", user_id, series_id)
                        }
                    },
                )?;
            }

            Self::Revoke { user_id, series_id } => {
                let changed = client.revoke_access(user_id, series_id).await?;
                context.emit(
                    &json!({ "userId": user_id, "seriesId": series_id, "changed": changed }),
                    || {
                        if changed {
                            println!("✓ Revoked series #{} from user #{}", series_id, user_id)
                        } else {
                            println!("User #{} had no grant for series #{}", user_id, series_id)
                        }
                    },
                )?;
            }

            Self::Check { user_id, series_id } => {
                let user = client
                    .list_users()
                    .await?
                    .into_iter()
                    .find(|u| u.id == user_id)
                    .ok_or_else(|| anyhow::anyhow!("User #{} not found", user_id))?;
                let grants = client.user_access(user_id).await?;
                let now = Utc::now();
                let allowed = can_view(&user, &grants, series_id, now);
                let via = if user.subscription {
                    "subscription"
                } else if active_series(&grants, now).contains(&series_id) {
                    "grant"
                } else {
                    "none"
                };

                context.emit(
                    &json!({ "userId": user_id, "seriesId": series_id, "allowed": allowed, "via": via }),
                    || {
                        if allowed {
                            println!("✓ {} can watch series #{} (via {})", user.username, series_id, via)
                        } else {
                            println!("✗ {} cannot watch series #{}", user.username, series_id)
                        }
                    },
                )?;
            }
        }

        Ok(())
    }
}

fn print_grants(grants: &[AccessGrant]) {
    if grants.is_empty() {
        println!("  (no grants)");
        return;
    }

    let now = Utc::now();
    for grant in grants {
        let expiry = match grant.expires_at {
            Some(at) if at <= now => format!("expired {}", at.format("%Y-%m-%d")),
            Some(at) => format!("until {}", at.format("%Y-%m-%d")),
            None => "no expiry".to_string(),
        };
        println!(
            "  {:6} | {:<30} | {}",
            grant.series_id,
            grant.title.as_deref().unwrap_or("-"),
            expiry
        );
    }
}
