use anyhow::Result;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Пишет ход выполнения задачи в файл `task_logs/{session_id}.log`.
pub struct TaskLogger {
    log_dir: PathBuf,
}

impl TaskLogger {
    pub fn new(base_log_dir: &Path) -> Self {
        Self {
            log_dir: base_log_dir.join("task_logs"),
        }
    }

    pub fn get_log_file_path(&self, session_id: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", session_id))
    }

    /// Дописывает строку с отметкой времени; файл создаётся при первой записи.
    pub fn write_log(&self, session_id: &str, message: &str) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.get_log_file_path(session_id))?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn read_log(&self, session_id: &str) -> Result<String> {
        let file_path = self.get_log_file_path(session_id);
        if file_path.exists() {
            Ok(fs::read_to_string(&file_path)?)
        } else {
            Ok(format!("Log file for session {} not found.", session_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TaskLogger::new(dir.path());
        logger.write_log("s1", "first").unwrap();
        logger.write_log("s1", "second").unwrap();

        let content = logger.read_log("s1").unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().ends_with("] second"));
        assert!(dir.path().join("task_logs").join("s1.log").exists());
        assert!(logger.read_log("missing").unwrap().contains("not found"));
    }
}
