use serde::{Deserialize, Serialize};

/// A full track object, as returned by search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// The catalog ID
    pub id: String,
    /// The track name
    pub name: String,
    /// The popularity, from 0 to 100
    pub popularity: u8,
    /// The duration in milliseconds
    pub duration_ms: u32,
    /// Whether the track has explicit lyrics
    #[serde(default)]
    pub explicit: bool,
    /// The credited artists, primary artist first
    pub artists: Vec<SimplifiedArtist>,
    /// The album the track appears on
    pub album: SimplifiedAlbum,
}
impl Track {
    /// The name of the first credited artist, if any.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }
}

/// An artist, as embedded in other objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    /// The catalog ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The artist name
    pub name: String,
}

/// An album, as embedded in a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    /// The catalog ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The album name
    pub name: String,
    /// The release date, with as much detail as `release_date_precision` says
    pub release_date: String,
    /// How much of `release_date` is meaningful
    pub release_date_precision: ReleaseDatePrecision,
}

/// The granularity of an album's release date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseDatePrecision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
}

/// A page of results from an offset-paginated endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    /// The items on this page; the service occasionally sends `null` in place of one
    pub items: Vec<Option<T>>,
    /// The requested page size
    pub limit: u32,
    /// The offset of the first item
    pub offset: u32,
    /// The total number of results available
    pub total: u32,
    /// The URL of the next page, if there is one
    pub next: Option<String>,
}
