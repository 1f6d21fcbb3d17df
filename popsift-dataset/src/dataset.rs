use std::{
    io::{Read, Write},
    path::Path,
};

use crate::{
    Columns, DatasetError, DatasetResult, FilterCriteria, MismatchPolicy, Table, TrackRecord,
};

/// The filtered, popularity-ordered output of a collection run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    records: Vec<TrackRecord>,
}
impl Dataset {
    /// Turn fetched columns into a dataset: build the table, keep the rows `criteria` matches,
    /// order by popularity and reindex.
    pub fn assemble(
        columns: Columns,
        criteria: &FilterCriteria,
        policy: MismatchPolicy,
    ) -> DatasetResult<Self> {
        let table = Table::from_columns(columns, policy)?;
        let candidates = table.len();
        let table = table.filter(criteria).sort_by_popularity().reindex();
        tracing::info!("kept {} of {candidates} rows", table.len());
        Ok(table.into_dataset())
    }

    pub(crate) fn from_records(records: Vec<TrackRecord>) -> Self {
        Self { records }
    }

    /// The records, most popular first.
    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The lowest popularity that made it into the dataset.
    pub fn min_popularity(&self) -> Option<u8> {
        self.records.iter().map(|r| r.popularity).min()
    }

    /// Write the dataset as comma-separated values to `path`, creating parent directories.
    pub fn write_csv(&self, path: &Path) -> DatasetResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.to_writer(std::io::BufWriter::new(file))
    }

    /// Write the header row and one row per record. There is no index column.
    pub fn to_writer(&self, writer: impl Write) -> DatasetResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(TrackRecord::header())?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a dataset previously written with [`Dataset::write_csv`].
    pub fn read_csv(path: &Path) -> DatasetResult<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// Parse a dataset from comma-separated values with the standard header row.
    pub fn from_reader(reader: impl Read) -> DatasetResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let header = reader.headers()?;
        if !header.iter().eq(TrackRecord::header()) {
            return Err(DatasetError::UnexpectedHeader(
                header.iter().map(str::to_string).collect(),
            ));
        }

        let records = reader
            .deserialize::<TrackRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }
}
