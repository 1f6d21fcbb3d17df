use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Columns, Dataset, DatasetError, DatasetResult, TrackRecord};

/// What to do when the accumulated columns are not all the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Refuse to build a table.
    #[default]
    Fail,
    /// Truncate every column to the shortest one and log a warning.
    Truncate,
}

/// Which rows survive [`Table::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Rows with popularity at or below this are excluded.
    pub popularity_cutoff: u8,
    /// Rows released on or after this date are excluded.
    pub release_date_cutoff: NaiveDate,
}
impl FilterCriteria {
    /// Whether `record` should be kept.
    pub fn matches(&self, record: &TrackRecord) -> bool {
        record.popularity > self.popularity_cutoff
            && record.release_date.is_before(self.release_date_cutoff)
    }
}

/// Rows of track records, each labelled with an index.
///
/// Filtering and sorting carry the labels along; [`Table::reindex`] replaces them with
/// `0..len`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Vec<(usize, TrackRecord)>,
}
impl Table {
    /// Build a table from columns, one row per position.
    pub fn from_columns(columns: Columns, policy: MismatchPolicy) -> DatasetResult<Self> {
        let len = match columns.rectangular_len() {
            Some(len) => len,
            None => {
                let lengths = columns.lengths();
                let shortest = lengths.iter().map(|(_, len)| *len).min().unwrap_or(0);
                match policy {
                    MismatchPolicy::Fail => {
                        return Err(DatasetError::ColumnLengthMismatch {
                            lengths: lengths.to_vec(),
                        });
                    }
                    MismatchPolicy::Truncate => {
                        tracing::warn!(
                            "column lengths differ ({}), truncating to {shortest} rows",
                            lengths
                                .iter()
                                .map(|(field, len)| format!("{field}={len}"))
                                .collect::<Vec<_>>()
                                .join(", ")
                        );
                        shortest
                    }
                }
            }
        };

        let Columns {
            artist,
            name,
            id,
            release_date,
            popularity,
            danceability,
            energy,
            key,
            loudness,
            mode,
            speechiness,
            acousticness,
            instrumentalness,
            liveness,
            valence,
            tempo,
            duration_ms,
            time_signature,
        } = columns;
        let mut artist = artist.into_iter();
        let mut name = name.into_iter();
        let mut id = id.into_iter();
        let mut release_date = release_date.into_iter();
        let mut popularity = popularity.into_iter();
        let mut danceability = danceability.into_iter();
        let mut energy = energy.into_iter();
        let mut key = key.into_iter();
        let mut loudness = loudness.into_iter();
        let mut mode = mode.into_iter();
        let mut speechiness = speechiness.into_iter();
        let mut acousticness = acousticness.into_iter();
        let mut instrumentalness = instrumentalness.into_iter();
        let mut liveness = liveness.into_iter();
        let mut valence = valence.into_iter();
        let mut tempo = tempo.into_iter();
        let mut duration_ms = duration_ms.into_iter();
        let mut time_signature = time_signature.into_iter();

        let rows = (0..len)
            .map_while(|index| {
                Some((
                    index,
                    TrackRecord {
                        artist: artist.next()?,
                        name: name.next()?,
                        id: id.next()?,
                        release_date: release_date.next()?,
                        popularity: popularity.next()?,
                        danceability: danceability.next()?,
                        energy: energy.next()?,
                        key: key.next()?,
                        loudness: loudness.next()?,
                        mode: mode.next()?,
                        speechiness: speechiness.next()?,
                        acousticness: acousticness.next()?,
                        instrumentalness: instrumentalness.next()?,
                        liveness: liveness.next()?,
                        valence: valence.next()?,
                        tempo: tempo.next()?,
                        duration_ms: duration_ms.next()?,
                        time_signature: time_signature.next()?,
                    },
                ))
            })
            .collect();

        Ok(Self { rows })
    }

    /// Build a table from complete records, indexed by position.
    pub fn from_records(records: impl IntoIterator<Item = TrackRecord>) -> Self {
        Self {
            rows: records.into_iter().enumerate().collect(),
        }
    }

    /// Keep only the rows `criteria` matches.
    pub fn filter(mut self, criteria: &FilterCriteria) -> Self {
        self.rows.retain(|(_, record)| criteria.matches(record));
        self
    }

    /// Order rows by popularity, highest first. Rows with equal popularity keep their order.
    pub fn sort_by_popularity(mut self) -> Self {
        self.rows.sort_by(|(_, a), (_, b)| b.popularity.cmp(&a.popularity));
        self
    }

    /// Relabel rows `0..len` in their current order.
    pub fn reindex(mut self) -> Self {
        for (position, (index, _)) in self.rows.iter_mut().enumerate() {
            *index = position;
        }
        self
    }

    /// The row labels, in row order.
    pub fn index(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|(index, _)| *index)
    }

    /// The records, in row order.
    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> {
        self.rows.iter().map(|(_, record)| record)
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop the row labels.
    pub fn into_dataset(self) -> Dataset {
        Dataset::from_records(self.rows.into_iter().map(|(_, record)| record).collect())
    }
}
