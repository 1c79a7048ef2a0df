// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::Subcommand;

use vidadmin::api::users::filter_users;
use vidadmin::api::{Id, User, UserUpdate};

use super::{CommandContext, or_dash};

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users
    List {
        /// Only users whose username or email contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Edit a user's profile and subscription
    Update {
        id: Id,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(long)]
        subscription: Option<bool>,
    },
}

impl UserCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        context.require_session()?;
        let client = &context.client;

        match self {
            Self::List { search } => {
                let all = client.list_users().await?;
                let users = filter_users(&all, search.as_deref().unwrap_or(""));
                context.emit(&users, || {
                    if users.is_empty() {
                        println!("No users found");
                    }
                    for user in &users {
                        print_row(user);
                    }
                })?;
            }

            Self::Update {
                id,
                username,
                email,
                subscription,
            } => {
                let current = client
                    .list_users()
                    .await?
                    .into_iter()
                    .find(|u| u.id == id)
                    .ok_or_else(|| anyhow::anyhow!("User #{} not found", id))?;

                let mut update = UserUpdate::from(&current);
                if let Some(username) = username {
                    update.username = username;
                }
                if let Some(email) = email {
                    update.email = email;
                }
                if let Some(subscription) = subscription {
                    update.subscription = subscription;
                }

                let updated = client.update_user(id, &update).await?;
                context.emit(&updated, || {
                    println!("✓ Updated user");
                    print_row(&updated);
                })?;
            }
        }

        Ok(())
    }
}

fn print_row(user: &User) {
    println!(
        "{:6} | {:<20} | {:<30} | {:<5} | {}",
        user.id,
        user.username,
        user.email,
        if user.subscription { "sub" } else { "-" },
        or_dash(user.role.as_deref())
    );
}
