use crate::pc;

pub fn track(id: &str, name: &str, popularity: u8, release_date: &str) -> pc::Track {
    pc::Track {
        id: id.to_string(),
        name: name.to_string(),
        popularity,
        duration_ms: 180_000,
        explicit: false,
        artists: vec![pc::SimplifiedArtist {
            id: None,
            name: format!("{name} Artist"),
        }],
        album: pc::SimplifiedAlbum {
            id: None,
            name: format!("{name} Album"),
            release_date: release_date.to_string(),
            release_date_precision: match release_date.len() {
                4 => pc::ReleaseDatePrecision::Year,
                7 => pc::ReleaseDatePrecision::Month,
                _ => pc::ReleaseDatePrecision::Day,
            },
        },
    }
}

/// Features whose tempo is derived from the id, so mismatched joins are detectable.
pub fn features(id: &str) -> pc::AudioFeatures {
    let seed = id.bytes().map(f64::from).sum::<f64>();
    pc::AudioFeatures {
        id: id.to_string(),
        danceability: 0.5,
        energy: 0.6,
        key: 5,
        loudness: -6.5,
        mode: 1,
        speechiness: 0.05,
        acousticness: 0.1,
        instrumentalness: 0.0,
        liveness: 0.12,
        valence: 0.4,
        tempo: 60.0 + seed,
        duration_ms: 180_000,
        time_signature: 4,
    }
}

pub fn record(id: &str, popularity: u8, release_date: &str) -> crate::TrackRecord {
    let track = track(id, &id.to_uppercase(), popularity, release_date);
    crate::TrackRecord::new(
        crate::TrackMetadata::try_from(&track).unwrap(),
        &features(id),
    )
}
