//! Station table error types.

/// Errors that can occur when loading the station table.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Table file does not exist
    #[error("station table not found: {path}")]
    NotFound { path: String },

    /// Table could not be read as CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header lacks a required column
    #[error("invalid station table: missing {0} column")]
    MissingColumn(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StationError::MissingColumn("stop_name");
        assert_eq!(err.to_string(), "invalid station table: missing stop_name column");

        let err = StationError::NotFound {
            path: "data/stops.txt".into(),
        };
        assert_eq!(err.to_string(), "station table not found: data/stops.txt");
    }
}
