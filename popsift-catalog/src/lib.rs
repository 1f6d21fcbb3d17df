//! A barebones client for the Spotify Web API, covering track search and audio-feature lookup.
#![deny(missing_docs)]

mod client;
pub use client::*;

mod auth;
pub use auth::*;

mod track;
pub use track::*;

mod search;
pub use search::*;

mod audio_features;
pub use audio_features::*;

mod request;
