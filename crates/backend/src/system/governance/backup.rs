use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Ежедневные копии баз: в датированную папку и рядом с файлом (`.backup`)
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: usize,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            retention,
        }
    }

    /// Возвращает true, если скопирован хотя бы один файл
    pub fn perform_backup(&self, files: &[PathBuf], today: NaiveDate) -> bool {
        match self.try_backup(files, today) {
            Ok(copied) => copied > 0,
            Err(e) => {
                tracing::error!("BACKUP | critical failure: {}", e);
                false
            }
        }
    }

    fn try_backup(&self, files: &[PathBuf], today: NaiveDate) -> anyhow::Result<usize> {
        let dest_folder = self.backup_dir.join(today.format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&dest_folder)?;

        let mut copied = 0;
        for src in files {
            if !src.exists() {
                tracing::warn!("BACKUP | file not found: {}", src.display());
                continue;
            }
            let Some(name) = src.file_name() else {
                continue;
            };
            std::fs::copy(src, dest_folder.join(name))?;

            let mut side = name.to_os_string();
            side.push(".backup");
            std::fs::copy(src, src.with_file_name(side))?;

            copied += 1;
            tracing::debug!("BACKUP | saved {}", src.display());
        }

        if copied > 0 {
            tracing::info!(
                "BACKUP | {} file(s) saved to {}",
                copied,
                dest_folder.display()
            );
            if let Err(e) = self.rotate() {
                tracing::warn!("BACKUP | rotation failed: {}", e);
            }
        }
        Ok(copied)
    }

    /// Оставляет только `retention` самых новых папок
    fn rotate(&self) -> anyhow::Result<()> {
        let mut folders: Vec<(std::time::SystemTime, PathBuf)> = std::fs::read_dir(&self.backup_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter_map(|p| {
                let modified = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
                Some((modified, p))
            })
            .collect();
        if folders.len() <= self.retention {
            return Ok(());
        }
        folders.sort();
        let excess = folders.len() - self.retention;
        for (_, folder) in folders.into_iter().take(excess) {
            std::fs::remove_dir_all(&folder)?;
            tracing::info!("BACKUP | removed old backup {}", display_name(&folder));
        }
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_copies_to_dated_folder_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("league.db");
        std::fs::write(&db, b"data").unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 7);
        let today = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();

        let missing = dir.path().join("missing.db");
        assert!(manager.perform_backup(&[db.clone(), missing], today));
        assert!(dir.path().join("backups/2025-01-13/league.db").exists());
        assert!(dir.path().join("league.db.backup").exists());
    }

    #[test]
    fn test_nothing_copied_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 7);
        let today = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
        assert!(!manager.perform_backup(&[dir.path().join("none.db")], today));
    }

    #[test]
    fn test_rotation_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("league.db");
        std::fs::write(&db, b"data").unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 2);
        for day in 1..=4 {
            let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
            assert!(manager.perform_backup(&[db.clone()], date));
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        let left: Vec<_> = std::fs::read_dir(dir.path().join("backups"))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(left.len(), 2);
        assert!(dir.path().join("backups/2025-01-04").exists());
    }
}
