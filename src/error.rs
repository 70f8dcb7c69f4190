use thiserror::Error;

/// Structural failures while turning a spreadsheet file into entries.
///
/// Row-level anomalies (missing cells, unparseable numbers) never surface
/// here; they degrade to defaults during normalization. Anything that does
/// surface aborts the whole operation — a merge across sheets never returns
/// a partial result.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file is larger than the accepted maximum.
    #[error("file is {actual} bytes, over the {limit} byte limit")]
    SizeExceeded { actual: u64, limit: u64 },

    /// The byte stream could not be read or is not a spreadsheet container.
    #[error("could not read workbook: {0}")]
    Read(String),

    /// A sheet's grid could not be converted to rows.
    #[error("could not parse sheet '{sheet}': {reason}")]
    Parse { sheet: String, reason: String },

    /// The requested sheet name is absent from the workbook.
    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Read(err.to_string())
    }
}

impl From<calamine::Error> for LoadError {
    fn from(err: calamine::Error) -> Self {
        LoadError::Read(err.to_string())
    }
}
