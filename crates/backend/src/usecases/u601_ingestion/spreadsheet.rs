use calamine::{open_workbook_auto, Data, Reader};
use contracts::enums::SellerRole;
use std::path::Path;

use super::error::IngestError;
use crate::shared::text::{clean_seller_name, normalize_header, parse_br_number};

/// Сколько строк просматривать в поисках заголовка
const HEADER_SCAN_ROWS: usize = 50;
/// Сколько первых строк проверять на баннер ошибки BI
const SANITY_ROWS: usize = 6;
const ERROR_BANNER: &str = "ERRO AO RECUPERAR RESULTADOS";

const NAME_CANDIDATES: &[&str] = &["nome", "vendedor", "funcionario"];
const GOAL_CANDIDATES: &[&str] = &["meta diaria", "meta diária", "meta"];
const SALES_CANDIDATES: &[&str] = &["fat. hoje", "faturado hoje", "venda hoje", "fat hoje"];
const ATTAINMENT_CANDIDATES: &[&str] = &["% alcance", "alcance", "alcance %"];

/// Ячейка листа после чтения через calamine
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => parse_br_number(s),
        }
    }

    fn is_blank(&self) -> bool {
        self.as_text().trim().is_empty()
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            other => Cell::Text(other.to_string()),
        }
    }
}

pub type Grid = Vec<Vec<Cell>>;

/// Строка выгрузки после очистки
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub name: String,
    pub goal: f64,
    pub sales: f64,
    pub attainment: f64,
    /// Заполняется из файла контактов
    pub store: Option<String>,
    pub role: SellerRole,
}

/// Индексы нужных колонок в строке заголовка
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub name: usize,
    pub goal: usize,
    pub sales: usize,
    pub attainment: Option<usize>,
}

/// Первый лист книги как сетка ячеек
pub fn read_grid(path: &Path) -> Result<Grid, IngestError> {
    if !path.exists() {
        return Err(IngestError::FileNotFound(path.to_path_buf()));
    }
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Workbook("workbook has no sheets".into()))?
        .map_err(|e| IngestError::Workbook(e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect())
}

/// BI иногда отдаёт файл с баннером ошибки вместо данных
pub fn sanity_check(grid: &Grid) -> Result<(), IngestError> {
    let broken = grid.iter().take(SANITY_ROWS).any(|row| {
        row.iter()
            .any(|c| c.as_text().to_uppercase().contains(ERROR_BANNER))
    });
    if broken {
        Err(IngestError::InvalidExport)
    } else {
        Ok(())
    }
}

/// Проверка скачанного файла без разбора строк
pub fn validate_file(path: &Path) -> Result<(), IngestError> {
    let grid = read_grid(path)?;
    sanity_check(&grid)
}

pub fn find_header_row(grid: &Grid) -> Result<usize, IngestError> {
    grid.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let cells: Vec<String> = row.iter().map(|c| normalize_header(&c.as_text())).collect();
            let has_name = cells
                .iter()
                .any(|c| c == "NOME" || c == "VENDEDOR" || c == "FUNCIONARIO");
            let has_goal = cells.iter().any(|c| c.contains("META DIARIA"));
            let has_sales = cells
                .iter()
                .any(|c| c.contains("FAT. HOJE") || c.contains("FAT HOJE"));
            let filled = cells.iter().filter(|c| !c.is_empty()).count();
            has_name && has_goal && has_sales && filled >= 5
        })
        .ok_or(IngestError::HeaderNotFound(HEADER_SCAN_ROWS))
}

fn find_column(header: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|cand| header.iter().position(|h| h == cand))
}

pub fn resolve_columns(header: &[Cell]) -> Result<ColumnMap, IngestError> {
    let header: Vec<String> = header
        .iter()
        .map(|c| c.as_text().trim().to_lowercase())
        .collect();
    Ok(ColumnMap {
        name: find_column(&header, NAME_CANDIDATES).ok_or(IngestError::MissingColumn("nome"))?,
        goal: find_column(&header, GOAL_CANDIDATES)
            .ok_or(IngestError::MissingColumn("meta diaria"))?,
        sales: find_column(&header, SALES_CANDIDATES)
            .ok_or(IngestError::MissingColumn("fat. hoje"))?,
        attainment: find_column(&header, ATTAINMENT_CANDIDATES),
    })
}

/// Разбор сетки: заголовок, колонки, очистка строк, сортировка по выполнению
pub fn parse_grid(grid: &Grid) -> Result<Vec<SheetRow>, IngestError> {
    sanity_check(grid)?;
    let header_idx = find_header_row(grid)?;
    let columns = resolve_columns(&grid[header_idx])?;

    let cell = |row: &Vec<Cell>, idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);

    let mut rows: Vec<SheetRow> = grid[header_idx + 1..]
        .iter()
        .filter_map(|row| {
            let raw_name = cell(row, columns.name);
            if raw_name.is_blank() {
                return None;
            }
            let name = clean_seller_name(&raw_name.as_text());
            let lowered = name.to_lowercase();
            if name.is_empty() || lowered == "total" || lowered == "total geral" {
                return None;
            }
            let goal = cell(row, columns.goal).as_number()?;
            let sales = cell(row, columns.sales).as_number()?;
            if goal <= 0.0 {
                return None;
            }
            Some(SheetRow {
                name,
                goal,
                sales,
                attainment: (sales / goal).max(0.0) * 100.0,
                store: None,
                role: SellerRole::Seller,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.attainment.total_cmp(&a.attainment));
    Ok(rows)
}

pub fn parse_goal_sheet(path: &Path) -> Result<Vec<SheetRow>, IngestError> {
    let grid = read_grid(path)?;
    let rows = parse_grid(&grid)?;
    tracing::info!(
        "INGESTION | {} seller rows parsed from {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn header() -> Vec<Cell> {
        vec![
            t("Nome"),
            t("Meta Diária"),
            t("Fat. Hoje"),
            t("% Alcance"),
            t("Loja"),
        ]
    }

    fn grid() -> Grid {
        vec![
            vec![t("Relatório de metas"), Cell::Empty],
            vec![Cell::Empty],
            header(),
            vec![t("LOJA: ana souza"), n(1000.0), n(1100.0), n(1.1), t("1")],
            vec![t("bruno lima"), t("R$ 2.000,00"), t("1.500,00"), t("75%"), t("2")],
            vec![t("Carla"), n(0.0), n(10.0), Cell::Empty, t("2")],
            vec![t("Davi"), t("nan"), n(10.0), Cell::Empty, t("3")],
            vec![t(""), n(10.0), n(10.0), Cell::Empty, t("3")],
            vec![t("Total Geral"), n(3000.0), n(2600.0), Cell::Empty, Cell::Empty],
        ]
    }

    #[test]
    fn test_header_detected_after_title_rows() {
        assert_eq!(find_header_row(&grid()).unwrap(), 2);
    }

    #[test]
    fn test_header_requires_five_filled_cells() {
        let g = vec![vec![t("Nome"), t("Meta Diaria"), t("Fat Hoje")]];
        assert!(matches!(find_header_row(&g), Err(IngestError::HeaderNotFound(_))));
    }

    #[test]
    fn test_rows_cleaned_and_sorted() {
        let rows = parse_grid(&grid()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Souza", "Bruno Lima"]);
        assert!((rows[0].attainment - 110.0).abs() < 1e-9);
        assert_eq!(rows[1].goal, 2000.0);
        assert_eq!(rows[1].sales, 1500.0);
        assert!((rows[1].attainment - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_banner_rejected() {
        let mut g = grid();
        g.insert(0, vec![t("Erro ao recuperar resultados do widget")]);
        assert!(matches!(parse_grid(&g), Err(IngestError::InvalidExport)));
    }

    #[test]
    fn test_duplicate_columns_keep_first() {
        let mut h = header();
        h.push(t("Meta"));
        let cols = resolve_columns(&h).unwrap();
        assert_eq!(cols.goal, 1);
        assert_eq!(cols.attainment, Some(3));
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_goal_sheet_from_xlsx() {
        let rows = parse_goal_sheet(&fixture("meta_vendedor.xlsx")).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Souza", "Carla Dias", "Bruno Lima"]);
        assert_eq!(rows[0].goal, 1000.0);
        assert_eq!(rows[0].sales, 1500.0);
        assert!((rows[0].attainment - 150.0).abs() < 1e-9);
        assert!((rows[1].attainment - 120.0).abs() < 1e-9);
        assert_eq!(rows[2].goal, 2000.0);
        assert!((rows[2].attainment - 50.0).abs() < 1e-9);
        assert!(rows.iter().all(|r| r.store.is_none() && r.role == SellerRole::Seller));
    }

    #[test]
    fn test_xlsx_grid_keeps_title_rows() {
        let grid = read_grid(&fixture("meta_vendedor.xlsx")).unwrap();
        assert_eq!(grid[0][0], t("Meta por vendedor"));
        assert_eq!(find_header_row(&grid).unwrap(), 2);
        assert_eq!(grid[3][2], n(1000.0));
        assert!(validate_file(&fixture("meta_vendedor.xlsx")).is_ok());
    }

    #[test]
    fn test_xlsx_error_export_rejected() {
        let path = fixture("export_erro.xlsx");
        assert!(matches!(validate_file(&path), Err(IngestError::InvalidExport)));
        assert!(matches!(parse_goal_sheet(&path), Err(IngestError::InvalidExport)));
    }

    #[test]
    fn test_missing_file() {
        let err = read_grid(Path::new("/nonexistent/MetaVendedor_0101.xlsx")).unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound(_)));
    }
}
