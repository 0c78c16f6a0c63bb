pub mod acquire;
pub mod bi_export;
pub mod contacts;
pub mod error;
pub mod spreadsheet;

pub use error::IngestError;
pub use spreadsheet::SheetRow;
