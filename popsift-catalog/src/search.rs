use serde::{Deserialize, Serialize};

use crate::{Client, ClientResult, CredentialManager, Paging, Track};

/// A search query string, built from field filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(pub String);
impl SearchQuery {
    /// Tracks released in the inclusive year range `start..=end`.
    pub fn year_range(start: i32, end: i32) -> Self {
        if start == end {
            SearchQuery(format!("year:{start}"))
        } else {
            SearchQuery(format!("year:{start}-{end}"))
        }
    }
}
impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A track search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The search query.
    pub query: SearchQuery,
    /// The maximum number of tracks to return.
    pub limit: u32,
    /// The index of the first result to return. Used for paging.
    pub offset: u32,
    /// Restrict results to tracks playable in this market.
    pub market: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchResponse {
    tracks: Paging<Track>,
}

/// Search-related functionality.
impl<C: CredentialManager> Client<C> {
    /// Search for tracks.
    pub async fn search_tracks(&self, request: &SearchRequest) -> ClientResult<Paging<Track>> {
        let mut parameters = vec![
            ("q", request.query.0.clone()),
            ("type", "track".to_string()),
            ("limit", request.limit.to_string()),
            ("offset", request.offset.to_string()),
        ];
        if let Some(market) = &request.market {
            parameters.push(("market", market.clone()));
        }

        Ok(self
            .request::<SearchResponse>("search", &parameters)
            .await?
            .tracks)
    }
}
