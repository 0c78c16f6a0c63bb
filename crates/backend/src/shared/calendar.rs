//! Календарь лиги: недели Пн..Сб, коммерческий месяц, рабочие дни с весами.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{HashMap, HashSet};

use crate::shared::config::CommercialMonthConfig;

pub fn monday_of(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.weekday().num_days_from_monday() as i64)
}

/// Неделя от понедельника до указанной даты включительно
pub fn week_range(d: NaiveDate) -> (NaiveDate, NaiveDate) {
    (monday_of(d), d)
}

pub fn saturday_of(d: NaiveDate) -> NaiveDate {
    monday_of(d) + Duration::days(5)
}

/// Идентификатор недели вида "2025_W3" по ISO-неделе понедельника
pub fn week_id(d: NaiveDate) -> String {
    let iso = monday_of(d).iso_week();
    format!("{}_W{}", iso.year(), iso.week())
}

/// Идентификатор недели с двузначным номером: "2025_W03"
pub fn padded_week_id(d: NaiveDate) -> String {
    let iso = monday_of(d).iso_week();
    format!("{}_W{:02}", iso.year(), iso.week())
}

/// ISO-неделя в формате `%G-W%V`
pub fn iso_week_key(d: NaiveDate) -> String {
    d.format("%G-W%V").to_string()
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .map(|d| d - Duration::days(1))
        .unwrap_or(NaiveDate::MAX)
}

fn clamped(year: i32, month: u32, day: u32) -> NaiveDate {
    let last = last_day_of_month(year, month);
    NaiveDate::from_ymd_opt(year, month, day.min(last.day())).unwrap_or(last)
}

fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Начало коммерческого цикла и сама дата
pub fn commercial_cycle(d: NaiveDate, cfg: &CommercialMonthConfig) -> (NaiveDate, NaiveDate) {
    let start = if d.day() <= cfg.end_day || d.day() < cfg.start_day {
        let (y, m) = prev_month(d.year(), d.month());
        clamped(y, m, cfg.start_day)
    } else {
        clamped(d.year(), d.month(), cfg.start_day)
    };
    (start, d)
}

pub fn commercial_cycle_end(d: NaiveDate, cfg: &CommercialMonthConfig) -> NaiveDate {
    if d.day() <= cfg.end_day {
        clamped(d.year(), d.month(), cfg.end_day)
    } else {
        let (y, m) = next_month(d.year(), d.month());
        clamped(y, m, cfg.end_day)
    }
}

pub fn is_monthly_closing_day(d: NaiveDate, cfg: &CommercialMonthConfig) -> bool {
    d.day() == cfg.end_day || d == last_day_of_month(d.year(), d.month())
}

/// Праздники: общенациональные и по магазинам
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    pub national: HashSet<NaiveDate>,
    pub per_store: HashMap<String, HashSet<NaiveDate>>,
}

impl HolidayCalendar {
    pub fn add_national(&mut self, d: NaiveDate) {
        self.national.insert(d);
    }

    pub fn add_store(&mut self, store: &str, d: NaiveDate) {
        self.per_store
            .entry(store.trim().to_string())
            .or_default()
            .insert(d);
    }

    pub fn is_holiday(&self, d: NaiveDate, store: Option<&str>) -> bool {
        if self.national.contains(&d) {
            return true;
        }
        store
            .and_then(|s| self.per_store.get(s.trim()))
            .map(|dates| dates.contains(&d))
            .unwrap_or(false)
    }

    /// Вес одного дня: праздник 0, 31 декабря 0.5, Пн–Пт 1, Сб 0.5, Вс 0
    pub fn day_weight(&self, d: NaiveDate, store: Option<&str>) -> f64 {
        if self.is_holiday(d, store) {
            return 0.0;
        }
        if d.month() == 12 && d.day() == 31 {
            return 0.5;
        }
        match d.weekday() {
            Weekday::Sun => 0.0,
            Weekday::Sat => 0.5,
            _ => 1.0,
        }
    }

    pub fn business_days(&self, from: NaiveDate, to: NaiveDate, store: Option<&str>) -> f64 {
        from.iter_days()
            .take_while(|d| *d <= to)
            .map(|d| self.day_weight(d, store))
            .sum()
    }

    /// Цель, пропорциональная прошедшим рабочим дням периода
    pub fn proportional_goal(
        &self,
        total: f64,
        start: NaiveDate,
        today: NaiveDate,
        end: NaiveDate,
        store: Option<&str>,
    ) -> f64 {
        let whole = self.business_days(start, end, store);
        if whole <= 0.0 {
            return total;
        }
        total * self.business_days(start, today, store) / whole
    }
}
