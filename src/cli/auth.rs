// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::Subcommand;
use inquire::validator::Validation;
use inquire::{Password, PasswordDisplayMode, Text};
use serde_json::json;

use super::{CommandContext, with_spinner};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign in with a Google ID token
    GoogleLogin {
        #[arg(long)]
        credential: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Status,
}

fn required(value: Option<String>, prompt: &str) -> Result<String> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => Ok(v),
        None => Ok(Text::new(prompt)
            .with_validator(|input: &str| {
                if input.trim().is_empty() {
                    Ok(Validation::Invalid("This field is required".into()))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt()?),
    }
}

fn password(value: Option<String>, confirm: bool) -> Result<String> {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => Ok(v),
        None => {
            let prompt = Password::new("Password:").with_display_mode(PasswordDisplayMode::Masked);
            let prompt = if confirm {
                prompt
            } else {
                prompt.without_confirmation()
            };
            Ok(prompt.prompt()?)
        }
    }
}

impl AuthCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let client = &context.client;

        match self {
            Self::Login { email, password: pw } => {
                let email = required(email, "Email:")?;
                let pw = password(pw, false)?;
                with_spinner("Signing in...", client.sign_in(&email, &pw)).await?;
                context.emit(&json!({ "signedIn": true, "email": email }), || {
                    println!("✓ Signed in as {}", email)
                })?;
            }

            Self::Register {
                email,
                username,
                password: pw,
            } => {
                let email = required(email, "Email:")?;
                let username = required(username, "Username:")?;
                let pw = password(pw, true)?;
                with_spinner("Registering...", client.sign_up(&email, &pw, &username)).await?;
                context.emit(
                    &json!({ "registered": true, "email": email, "username": username }),
                    || println!("✓ Registered {} <{}>", username, email),
                )?;
            }

            Self::GoogleLogin { credential } => {
                with_spinner("Signing in with Google...", client.google_sign_in(&credential))
                    .await?;
                context.emit(&json!({ "signedIn": true }), || {
                    println!("✓ Signed in with Google")
                })?;
            }

            Self::Logout => {
                client.sign_out();
                context.emit(&json!({ "signedIn": false }), || println!("Signed out"))?;
            }

            Self::Status => {
                let session = client.current_session();
                let status = json!({
                    "server": client.base_url(),
                    "signedIn": session.is_some(),
                    "email": session.as_ref().and_then(|s| s.email.clone()),
                    "canRefresh": session.as_ref().map(|s| s.refresh_token.is_some()).unwrap_or(false),
                    "savedAt": session.as_ref().map(|s| s.saved_at),
                    "sessionFile": client.session().path().map(|p| p.display().to_string()),
                });
                context.emit(&status, || match &session {
                    Some(s) => {
                        println!("Server:  {}", client.base_url());
                        println!(
                            "Account: {}",
                            s.email.as_deref().unwrap_or("(unknown)")
                        );
                        println!("Since:   {}", s.saved_at.format("%Y-%m-%d %H:%M UTC"));
                        println!(
                            "Refresh: {}",
                            if s.refresh_token.is_some() { "available" } else { "none" }
                        );
                    }
                    None => println!("Not signed in to {}", client.base_url()),
                })?;
            }
        }

        Ok(())
    }
}
