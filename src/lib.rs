// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod api;
pub mod config;
pub mod session;

pub use api::{AdminClient, ApiError};
pub use config::Config;
pub use session::{Session, SessionStore};
