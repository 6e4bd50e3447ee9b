use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// Malformed CSV (unbalanced quotes, ragged rows, bad field type).
    Csv(String),
    /// Missing required column in input data.
    MissingColumn { input: String, column: String },
    /// Quantity below 1 or not an integer.
    InvalidQuantity { input: String, id: String, value: String },
    /// IO error (file read, output write).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::MissingColumn { input, column } => {
                write!(f, "{input}: missing column '{column}'")
            }
            Self::InvalidQuantity { input, id, value } => {
                write!(f, "{input}, item '{id}': quantity must be a whole number >= 1, got '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            Self::Io(e.to_string())
        } else {
            Self::Csv(e.to_string())
        }
    }
}
