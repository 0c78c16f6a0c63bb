use std::path::Path;

pub fn page_count(rows: usize, page_size: usize, at_least_one: bool) -> usize {
    let size = page_size.max(1);
    let pages = rows.div_ceil(size);
    if at_least_one {
        pages.max(1)
    } else {
        pages
    }
}

/// Имя файла без расширения: `ranking_semanal.png` -> `ranking_semanal`
pub fn image_base(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// `{base}_p{n}.png` для нескольких страниц (или всегда для always_paged), иначе `{base}.png`
pub fn page_file_names(base: &str, pages: usize, always_paged: bool) -> Vec<String> {
    if pages == 1 && !always_paged {
        return vec![format!("{}.png", base)];
    }
    (1..=pages).map(|n| format!("{}_p{}.png", base, n)).collect()
}

/// Удаляет `{base}.{ext}` и `{base}_p{n}.{ext}` прошлых запусков; возвращает число удалённых файлов
pub fn remove_stale_pages(dir: &Path, base: &str) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_page_of(&name, base) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("RANKING | cannot remove old image {}: {}", name, e),
        }
    }
    removed
}

fn is_page_of(file_name: &str, base: &str) -> bool {
    let path = Path::new(file_name);
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false);
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    if !ext_ok {
        return false;
    }
    if stem == base {
        return true;
    }
    stem.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix("_p"))
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

pub fn pages<T>(rows: &[T], page_size: usize, at_least_one: bool) -> Vec<&[T]> {
    let mut chunks: Vec<&[T]> = rows.chunks(page_size.max(1)).collect();
    if chunks.is_empty() && at_least_one {
        chunks.push(&[]);
    }
    chunks
}
