use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

use crate::shared::config::Config;

/// Первый существующий файл логотипа: сначала в data_dir, затем в базовой папке
pub fn find_logo(candidates: &[String], dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
        .find(|p| p.is_file())
}

pub fn logo_for(config: &Config) -> Option<PathBuf> {
    find_logo(
        &config.paths.logo_candidates,
        &[config.data_dir(), config.base_dir.clone()],
    )
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Картинка как data URI для встраивания в HTML
pub fn image_to_data_uri(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!(
            "data:{};base64,{}",
            mime_for(path),
            STANDARD.encode(bytes)
        )),
        Err(e) => {
            tracing::warn!("RANKING | cannot read logo {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(dir.path().join("logo_empresa.png"), b"base").unwrap();
        std::fs::write(data.join("logo_empresa.jpg"), b"data").unwrap();

        let candidates = vec!["logo_empresa.png".to_string(), "logo_empresa.jpg".to_string()];
        let found = find_logo(&candidates, &[data.clone(), dir.path().to_path_buf()]);
        assert_eq!(found, Some(data.join("logo_empresa.jpg")));
        assert!(find_logo(&candidates, &[dir.path().join("missing")]).is_none());
    }

    #[test]
    fn test_data_uri_mime() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("logo.JPG");
        std::fs::write(&jpg, b"abc").unwrap();
        assert_eq!(image_to_data_uri(&jpg).unwrap(), "data:image/jpeg;base64,YWJj");
        let other = dir.path().join("logo.bmp");
        std::fs::write(&other, b"abc").unwrap();
        assert!(image_to_data_uri(&other).unwrap().starts_with("data:image/png;"));
    }
}
