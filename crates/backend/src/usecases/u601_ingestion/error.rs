use std::path::PathBuf;

/// Ошибки чтения выгрузки с целями продавцов
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("goal sheet not found: {0}")]
    FileNotFound(PathBuf),
    #[error("cannot read workbook: {0}")]
    Workbook(String),
    #[error("BI export contains an error banner")]
    InvalidExport,
    #[error("header row not found in the first {0} rows")]
    HeaderNotFound(usize),
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
}
