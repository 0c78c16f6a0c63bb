pub mod execution_log;
