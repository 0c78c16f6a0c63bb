pub mod backup;
pub mod execution_log;
