use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Страницы `{prefix}_p{n}.{ext}` по порядку, иначе одиночный `{prefix}.{ext}`
pub fn find_ranking_images(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut pages = Vec::new();
    for ext in EXTENSIONS {
        for n in 1.. {
            let page = dir.join(format!("{}_p{}.{}", prefix, n, ext));
            if !page.is_file() {
                break;
            }
            pages.push(page);
        }
    }
    if !pages.is_empty() {
        return pages;
    }
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prefix, ext)))
        .find(|p| p.is_file())
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["ranking_semanal_p2.png", "ranking_semanal_p1.png", "ranking_semanal_p4.png", "ranking_semanal.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let found = find_ranking_images(dir.path(), "ranking_semanal");
        assert_eq!(
            found,
            vec![
                dir.path().join("ranking_semanal_p1.png"),
                dir.path().join("ranking_semanal_p2.png")
            ]
        );
    }

    #[test]
    fn test_single_image_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ranking_vendedor.jpg"), b"x").unwrap();
        assert_eq!(
            find_ranking_images(dir.path(), "ranking_vendedor"),
            vec![dir.path().join("ranking_vendedor.jpg")]
        );
        assert!(find_ranking_images(dir.path(), "ranking_pontos").is_empty());
    }
}
