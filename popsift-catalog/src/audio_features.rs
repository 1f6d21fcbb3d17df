use serde::{Deserialize, Serialize};

use crate::{Client, ClientResult, CredentialManager};

/// Audio analysis outputs for a single track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// The catalog ID of the analysed track
    pub id: String,
    /// How suitable the track is for dancing, 0.0 to 1.0
    pub danceability: f64,
    /// Perceived intensity, 0.0 to 1.0
    pub energy: f64,
    /// Pitch class of the key, or -1 if none was detected
    pub key: i32,
    /// Overall loudness in dB
    pub loudness: f64,
    /// 1 for major, 0 for minor
    pub mode: i32,
    /// Presence of spoken words, 0.0 to 1.0
    pub speechiness: f64,
    /// Confidence that the track is acoustic, 0.0 to 1.0
    pub acousticness: f64,
    /// Likelihood the track has no vocals, 0.0 to 1.0
    pub instrumentalness: f64,
    /// Likelihood the track was performed live, 0.0 to 1.0
    pub liveness: f64,
    /// Musical positiveness, 0.0 to 1.0
    pub valence: f64,
    /// Estimated tempo in BPM
    pub tempo: f64,
    /// The duration in milliseconds
    pub duration_ms: u32,
    /// Estimated beats per bar
    pub time_signature: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<AudioFeatures>>,
}

/// Audio-feature functionality.
impl<C: CredentialManager> Client<C> {
    /// Look up audio features for a batch of track ids.
    ///
    /// The result has one entry per id the service answered for, in the service's order;
    /// ids it has no analysis for come back as `None`. An empty batch makes no request.
    pub async fn audio_features(&self, ids: &[String]) -> ClientResult<Vec<Option<AudioFeatures>>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Ok(self
            .request::<AudioFeaturesResponse>("audio-features", &[("ids", ids.join(","))])
            .await?
            .audio_features)
    }
}
