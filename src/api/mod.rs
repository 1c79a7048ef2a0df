// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod access;
pub mod auth;
pub mod banners;
pub mod client;
pub mod episodes;
pub mod error;
pub mod refresh;
pub mod series;
pub mod types;
pub mod users;

pub use banners::BannerUpdate;
pub use client::{AdminClient, ClientOptions};
pub use episodes::EpisodeForm;
pub use error::ApiError;
pub use series::SeriesForm;
pub use types::{AccessGrant, Banner, Episode, Id, ImageFile, Series, SeriesStatus, User};
pub use users::UserUpdate;
