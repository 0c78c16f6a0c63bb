use anyhow::Result;
use chrono::NaiveDate;
use contracts::enums::HolidayScope;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;

use super::repository::{self, NewHoliday};
use crate::shared::calendar::HolidayCalendar;

/// Национальные праздники, которые заводятся при первом запуске
const NATIONAL_SEED: &[(&str, &str)] = &[
    ("2025-01-01", "Confraternização Universal"),
    ("2025-04-21", "Tiradentes"),
];

pub async fn seed_national(db: &DatabaseConnection) -> Result<usize> {
    let mut inserted = 0;
    for (date, description) in NATIONAL_SEED {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
        let holiday = NewHoliday {
            date,
            description: description.to_string(),
            scope: HolidayScope::National,
            state: None,
            city: None,
            store: None,
        };
        if repository::insert_or_ignore(db, &holiday).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

#[derive(Debug, Deserialize)]
struct StoreHolidayRecord {
    loja: String,
    data: String,
    #[serde(default)]
    tipo: String,
}

fn parse_holiday_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// Загружает CSV `loja,data,tipo`. Магазин TODAS означает национальный праздник.
/// Отсутствующий файл не считается ошибкой.
pub async fn import_store_csv(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    if !path.exists() {
        tracing::warn!("HOLIDAYS | file not found: {}", path.display());
        return Ok(0);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut holidays = Vec::new();
    for record in reader.deserialize::<StoreHolidayRecord>() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("HOLIDAYS | skipping malformed row: {}", e);
                continue;
            }
        };
        let Some(date) = parse_holiday_date(&record.data) else {
            tracing::warn!("HOLIDAYS | invalid date '{}'", record.data);
            continue;
        };
        let store = record.loja.trim().to_string();
        let (scope, store) = if store.eq_ignore_ascii_case("TODAS") {
            (HolidayScope::National, None)
        } else {
            (HolidayScope::Store, Some(store))
        };
        holidays.push(NewHoliday {
            date,
            description: record.tipo,
            scope,
            state: None,
            city: None,
            store,
        });
    }

    let mut inserted = 0;
    for holiday in &holidays {
        if repository::insert_or_ignore(db, holiday).await? {
            inserted += 1;
        }
    }
    tracing::info!(
        "HOLIDAYS | imported {} new of {} rows from {}",
        inserted,
        holidays.len(),
        path.display()
    );
    Ok(inserted)
}

/// Праздник, в который рассылка не выполняется
pub async fn is_notification_holiday(
    db: &DatabaseConnection,
    date: NaiveDate,
    state: Option<&str>,
    city: Option<&str>,
) -> Result<bool> {
    let rows = repository::on_date(db, date).await?;
    Ok(rows.iter().any(|h| match h.scope() {
        Some(HolidayScope::National) => true,
        Some(HolidayScope::State) => state.is_some() && h.state.as_deref() == state,
        Some(HolidayScope::Municipal) => city.is_some() && h.city.as_deref() == city,
        _ => false,
    }))
}

/// Календарь для расчёта рабочих дней: таблица плюс праздники из конфигурации
pub async fn load_calendar(db: &DatabaseConnection, custom: &[NaiveDate]) -> Result<HolidayCalendar> {
    let mut calendar = HolidayCalendar::default();
    for holiday in repository::list_all(db).await? {
        let Some(date) = holiday.date() else {
            continue;
        };
        match holiday.scope() {
            Some(HolidayScope::National) => calendar.add_national(date),
            Some(HolidayScope::Store) if !holiday.store.is_empty() => {
                calendar.add_store(&holiday.store, date)
            }
            _ => {}
        }
    }
    for date in custom {
        calendar.add_national(*date);
    }
    Ok(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (_dir, db) = test_connection().await;
        assert_eq!(seed_national(&db).await.unwrap(), 2);
        assert_eq!(seed_national(&db).await.unwrap(), 0);
        assert!(is_notification_holiday(&db, d(4, 21), None, None).await.unwrap());
        assert!(!is_notification_holiday(&db, d(4, 22), None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_import_store_csv_and_calendar() {
        let (dir, db) = test_connection().await;
        let path = dir.path().join("feriados.csv");
        std::fs::write(
            &path,
            "loja,data,tipo\nTODAS,2025-03-04,Carnaval\n7,20/01/2025,Municipal\nx,not-a-date,Nada\n",
        )
        .unwrap();

        assert_eq!(import_store_csv(&db, &path).await.unwrap(), 2);
        assert_eq!(import_store_csv(&db, &path).await.unwrap(), 0);

        let cal = load_calendar(&db, &[d(12, 24)]).await.unwrap();
        assert!(cal.is_holiday(d(3, 4), Some("1")));
        assert!(cal.is_holiday(d(1, 20), Some("7")));
        assert!(!cal.is_holiday(d(1, 20), Some("8")));
        assert!(cal.is_holiday(d(12, 24), None));

        // store holidays do not block notifications
        assert!(!is_notification_holiday(&db, d(1, 20), None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_an_error() {
        let (dir, db) = test_connection().await;
        let n = import_store_csv(&db, &dir.path().join("nope.csv")).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_state_and_city_scopes() {
        let (_dir, db) = test_connection().await;
        let holiday = NewHoliday {
            date: d(7, 9),
            description: "Revolução Constitucionalista".into(),
            scope: HolidayScope::State,
            state: Some("SP".into()),
            city: None,
            store: None,
        };
        repository::insert_or_ignore(&db, &holiday).await.unwrap();
        assert!(is_notification_holiday(&db, d(7, 9), Some("SP"), None).await.unwrap());
        assert!(!is_notification_holiday(&db, d(7, 9), Some("RJ"), None).await.unwrap());
        assert!(!is_notification_holiday(&db, d(7, 9), None, None).await.unwrap());
    }
}
