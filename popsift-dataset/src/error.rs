use crate::Field;

#[derive(Debug)]
/// An error that can occur while assembling, writing or reading a dataset.
pub enum DatasetError {
    /// The accumulated columns were not all the same length.
    ColumnLengthMismatch {
        /// The length of every column, in header order.
        lengths: Vec<(Field, usize)>,
    },
    /// A release date was not `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    InvalidReleaseDate(String),
    /// A dataset file did not start with the expected header row.
    UnexpectedHeader(Vec<String>),
    /// An error from the delimited-file reader or writer.
    Csv(csv::Error),
    /// An I/O error.
    Io(std::io::Error),
}
impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::ColumnLengthMismatch { lengths } => {
                write!(f, "Column length mismatch:")?;
                for (field, length) in lengths {
                    write!(f, " {field}={length}")?;
                }
                Ok(())
            }
            DatasetError::InvalidReleaseDate(text) => write!(f, "Invalid release date: {text:?}"),
            DatasetError::UnexpectedHeader(header) => {
                write!(f, "Unexpected header: {}", header.join(","))
            }
            DatasetError::Csv(e) => write!(f, "CSV error: {e}"),
            DatasetError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}
impl std::error::Error for DatasetError {}
impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> Self {
        DatasetError::Csv(e)
    }
}
impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e)
    }
}
/// A result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;
