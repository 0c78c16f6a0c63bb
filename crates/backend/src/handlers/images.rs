use axum::http::StatusCode;
use axum::Json;
use contracts::enums::RankingKind;
use serde::Serialize;
use std::path::Path;

use crate::shared::config::{get_config, Config};
use crate::usecases::u604_rendering::paging::image_base;
use crate::usecases::u605_notify::find_ranking_images;

/// Последние изображения одного рейтинга
#[derive(Debug, Clone, Serialize)]
pub struct RankingImageSet {
    pub kind: RankingKind,
    pub title: String,
    pub urls: Vec<String>,
}

/// Адрес под `/images` для файла из выходной папки
fn image_url(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    Some(format!("/images/{}", urlencoding::encode(&name)))
}

pub fn latest_images(config: &Config) -> Vec<RankingImageSet> {
    let output_dir = config.output_dir();
    RankingKind::all()
        .into_iter()
        .map(|kind| {
            let base = image_base(config.ranking.image_file(kind));
            RankingImageSet {
                kind,
                title: kind.title().to_string(),
                urls: find_ranking_images(&output_dir, &base)
                    .iter()
                    .filter_map(|p| image_url(p))
                    .collect(),
            }
        })
        .filter(|set| !set.urls.is_empty())
        .collect()
}

/// GET /api/images
pub async fn list_latest() -> Result<Json<Vec<RankingImageSet>>, StatusCode> {
    let config = get_config().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(latest_images(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_images_skip_missing_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.base_dir = dir.path().to_path_buf();
        let out = config.output_dir();
        std::fs::create_dir_all(&out).unwrap();
        for name in ["ranking_semanal_p1.png", "ranking_semanal_p2.png", "ranking_pontos.png"] {
            std::fs::write(out.join(name), b"png").unwrap();
        }

        let sets = latest_images(&config);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].kind, RankingKind::Points);
        assert_eq!(sets[0].urls, vec!["/images/ranking_pontos.png"]);
        assert_eq!(sets[1].kind, RankingKind::Weekly);
        assert_eq!(sets[1].urls.len(), 2);
    }
}
