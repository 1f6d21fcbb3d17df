use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DatasetError, DatasetResult, pc};

/// A track ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);
impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A release date at the precision the catalog knows it.
///
/// Ordering against a cutoff follows ISO-8601 text order: a coarse date sorts before
/// the first day of its own period, so `2020` and `2020-08` both fall before `2020-08-01`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseDate {
    text: String,
    precision: pc::ReleaseDatePrecision,
    first_day: NaiveDate,
}
impl ReleaseDate {
    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse(text: &str) -> DatasetResult<Self> {
        let invalid = || DatasetError::InvalidReleaseDate(text.to_string());

        let mut parts = text.split('-');
        let year = parts
            .next()
            .filter(|y| y.len() == 4)
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let mut component = |len: usize| -> DatasetResult<Option<u32>> {
            parts
                .next()
                .map(|p| {
                    (p.len() == len)
                        .then(|| p.parse::<u32>().ok())
                        .flatten()
                        .ok_or_else(invalid)
                })
                .transpose()
        };
        let month = component(2)?;
        let day = component(2)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let precision = match (month, day) {
            (None, _) => pc::ReleaseDatePrecision::Year,
            (Some(_), None) => pc::ReleaseDatePrecision::Month,
            (Some(_), Some(_)) => pc::ReleaseDatePrecision::Day,
        };
        let first_day = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))
            .ok_or_else(invalid)?;

        Ok(Self {
            text: text.to_string(),
            precision,
            first_day,
        })
    }

    /// The date as the catalog reported it.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The earliest day this date could refer to.
    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Whether this date sorts strictly before `cutoff`.
    pub fn is_before(&self, cutoff: NaiveDate) -> bool {
        match self.precision {
            pc::ReleaseDatePrecision::Day => self.first_day < cutoff,
            pc::ReleaseDatePrecision::Month | pc::ReleaseDatePrecision::Year => {
                self.first_day <= cutoff
            }
        }
    }
}
impl TryFrom<String> for ReleaseDate {
    type Error = DatasetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
impl From<ReleaseDate> for String {
    fn from(value: ReleaseDate) -> Self {
        value.text
    }
}
impl std::fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A named column of the dataset. The declaration order is the header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Field {
    Artist,
    Name,
    Id,
    ReleaseDate,
    Popularity,
    Danceability,
    Energy,
    Key,
    Loudness,
    Mode,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Valence,
    Tempo,
    DurationMs,
    TimeSignature,
}
impl Field {
    /// Every field, in header order.
    pub const ALL: [Field; 18] = [
        Field::Artist,
        Field::Name,
        Field::Id,
        Field::ReleaseDate,
        Field::Popularity,
        Field::Danceability,
        Field::Energy,
        Field::Key,
        Field::Loudness,
        Field::Mode,
        Field::Speechiness,
        Field::Acousticness,
        Field::Instrumentalness,
        Field::Liveness,
        Field::Valence,
        Field::Tempo,
        Field::DurationMs,
        Field::TimeSignature,
    ];

    /// The column name used in the header row.
    pub fn name(self) -> &'static str {
        match self {
            Field::Artist => "artist",
            Field::Name => "name",
            Field::Id => "id",
            Field::ReleaseDate => "release_date",
            Field::Popularity => "popularity",
            Field::Danceability => "danceability",
            Field::Energy => "energy",
            Field::Key => "key",
            Field::Loudness => "loudness",
            Field::Mode => "mode",
            Field::Speechiness => "speechiness",
            Field::Acousticness => "acousticness",
            Field::Instrumentalness => "instrumentalness",
            Field::Liveness => "liveness",
            Field::Valence => "valence",
            Field::Tempo => "tempo",
            Field::DurationMs => "duration_ms",
            Field::TimeSignature => "time_signature",
        }
    }
}
impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The fields of a track that come from a search page.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// The primary artist's name
    pub artist: String,
    /// The track name
    pub name: String,
    /// The track ID
    pub id: TrackId,
    /// The album's release date
    pub release_date: ReleaseDate,
    /// The popularity, from 0 to 100
    pub popularity: u8,
}
impl TryFrom<&pc::Track> for TrackMetadata {
    type Error = DatasetError;

    fn try_from(track: &pc::Track) -> Result<Self, Self::Error> {
        Ok(TrackMetadata {
            artist: track.primary_artist().unwrap_or_default().to_string(),
            name: track.name.clone(),
            id: TrackId(track.id.clone()),
            release_date: ReleaseDate::parse(&track.album.release_date)?,
            popularity: track.popularity,
        })
    }
}

/// One complete row of the dataset. Field order matches [`Field::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TrackRecord {
    pub artist: String,
    pub name: String,
    pub id: TrackId,
    pub release_date: ReleaseDate,
    pub popularity: u8,
    pub danceability: f64,
    pub energy: f64,
    pub key: i32,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: u32,
    pub time_signature: i32,
}
impl TrackRecord {
    /// Join search metadata with the audio features for the same track.
    pub fn new(metadata: TrackMetadata, features: &pc::AudioFeatures) -> Self {
        TrackRecord {
            artist: metadata.artist,
            name: metadata.name,
            id: metadata.id,
            release_date: metadata.release_date,
            popularity: metadata.popularity,
            danceability: features.danceability,
            energy: features.energy,
            key: features.key,
            loudness: features.loudness,
            mode: features.mode,
            speechiness: features.speechiness,
            acousticness: features.acousticness,
            instrumentalness: features.instrumentalness,
            liveness: features.liveness,
            valence: features.valence,
            tempo: features.tempo,
            duration_ms: features.duration_ms,
            time_signature: features.time_signature,
        }
    }

    /// The header row.
    pub fn header() -> [&'static str; 18] {
        Field::ALL.map(Field::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_release_date_precisions() {
        let day = ReleaseDate::parse("2020-07-15").unwrap();
        assert_eq!(day.precision, pc::ReleaseDatePrecision::Day);
        assert_eq!(day.first_day(), date(2020, 7, 15));

        let month = ReleaseDate::parse("2020-08").unwrap();
        assert_eq!(month.precision, pc::ReleaseDatePrecision::Month);
        assert_eq!(month.first_day(), date(2020, 8, 1));

        let year = ReleaseDate::parse("2019").unwrap();
        assert_eq!(year.precision, pc::ReleaseDatePrecision::Year);
        assert_eq!(year.first_day(), date(2019, 1, 1));
        assert_eq!(year.as_str(), "2019");
    }

    #[test]
    fn test_release_date_cutoff_matches_iso_string_order() {
        let cutoff = date(2020, 8, 1);
        assert!(ReleaseDate::parse("2020-07-31").unwrap().is_before(cutoff));
        assert!(!ReleaseDate::parse("2020-08-01").unwrap().is_before(cutoff));
        assert!(!ReleaseDate::parse("2020-08-15").unwrap().is_before(cutoff));
        // Coarser dates sort before the first day of their own period.
        assert!(ReleaseDate::parse("2020-08").unwrap().is_before(cutoff));
        assert!(ReleaseDate::parse("2020").unwrap().is_before(cutoff));
        assert!(!ReleaseDate::parse("2021").unwrap().is_before(cutoff));
        assert!(!ReleaseDate::parse("2020-09").unwrap().is_before(cutoff));
        assert!(ReleaseDate::parse("2020-07").unwrap().is_before(cutoff));

        // A coarse date landing exactly on the cutoff still sorts before it.
        let new_year = date(2020, 1, 1);
        assert!(ReleaseDate::parse("2020").unwrap().is_before(new_year));
        assert!(ReleaseDate::parse("2019-12").unwrap().is_before(new_year));
        assert!(!ReleaseDate::parse("2020-01-01").unwrap().is_before(new_year));
        assert!(!ReleaseDate::parse("2020-01").unwrap().is_before(date(2019, 12, 31)));
    }

    #[test]
    fn test_release_date_rejects_malformed() {
        for text in ["", "20", "2020-", "2020-8", "2020-13", "2020-02-30", "2020-01-01-01", "abcd"] {
            assert!(
                matches!(ReleaseDate::parse(text), Err(DatasetError::InvalidReleaseDate(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_header_order() {
        let header = TrackRecord::header();
        assert_eq!(header.len(), 18);
        assert_eq!(header[0], "artist");
        assert_eq!(header[4], "popularity");
        assert_eq!(header[17], "time_signature");
    }
}
