use crate::{Field, ReleaseDate, TrackId, TrackMetadata, pc};

/// Per-field storage that the fetcher appends to.
///
/// Metadata and feature columns are written separately, so nothing here forces them to stay
/// the same length; [`crate::Table::from_columns`] checks that before building rows.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct Columns {
    pub artist: Vec<String>,
    pub name: Vec<String>,
    pub id: Vec<TrackId>,
    pub release_date: Vec<ReleaseDate>,
    pub popularity: Vec<u8>,
    pub danceability: Vec<f64>,
    pub energy: Vec<f64>,
    pub key: Vec<i32>,
    pub loudness: Vec<f64>,
    pub mode: Vec<i32>,
    pub speechiness: Vec<f64>,
    pub acousticness: Vec<f64>,
    pub instrumentalness: Vec<f64>,
    pub liveness: Vec<f64>,
    pub valence: Vec<f64>,
    pub tempo: Vec<f64>,
    pub duration_ms: Vec<u32>,
    pub time_signature: Vec<i32>,
}
impl Columns {
    /// Append one track's search metadata.
    pub fn push_metadata(&mut self, metadata: TrackMetadata) {
        self.artist.push(metadata.artist);
        self.name.push(metadata.name);
        self.id.push(metadata.id);
        self.release_date.push(metadata.release_date);
        self.popularity.push(metadata.popularity);
    }

    /// Append one track's audio features.
    pub fn push_features(&mut self, features: &pc::AudioFeatures) {
        self.danceability.push(features.danceability);
        self.energy.push(features.energy);
        self.key.push(features.key);
        self.loudness.push(features.loudness);
        self.mode.push(features.mode);
        self.speechiness.push(features.speechiness);
        self.acousticness.push(features.acousticness);
        self.instrumentalness.push(features.instrumentalness);
        self.liveness.push(features.liveness);
        self.valence.push(features.valence);
        self.tempo.push(features.tempo);
        self.duration_ms.push(features.duration_ms);
        self.time_signature.push(features.time_signature);
    }

    /// The length of every column, in header order.
    pub fn lengths(&self) -> [(Field, usize); 18] {
        Field::ALL.map(|field| (field, self.len_of(field)))
    }

    /// The common length of all columns, or `None` if they differ.
    pub fn rectangular_len(&self) -> Option<usize> {
        let lengths = self.lengths();
        let first = lengths[0].1;
        lengths.iter().all(|(_, len)| *len == first).then_some(first)
    }

    fn len_of(&self, field: Field) -> usize {
        match field {
            Field::Artist => self.artist.len(),
            Field::Name => self.name.len(),
            Field::Id => self.id.len(),
            Field::ReleaseDate => self.release_date.len(),
            Field::Popularity => self.popularity.len(),
            Field::Danceability => self.danceability.len(),
            Field::Energy => self.energy.len(),
            Field::Key => self.key.len(),
            Field::Loudness => self.loudness.len(),
            Field::Mode => self.mode.len(),
            Field::Speechiness => self.speechiness.len(),
            Field::Acousticness => self.acousticness.len(),
            Field::Instrumentalness => self.instrumentalness.len(),
            Field::Liveness => self.liveness.len(),
            Field::Valence => self.valence.len(),
            Field::Tempo => self.tempo.len(),
            Field::DurationMs => self.duration_ms.len(),
            Field::TimeSignature => self.time_signature.len(),
        }
    }
}
