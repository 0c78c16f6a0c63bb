pub mod d410_medal_table;
pub mod d411_store_overview;
pub mod dashboard;
pub mod executions;
pub mod images;
