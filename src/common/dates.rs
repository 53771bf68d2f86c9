// src/common/dates.rs

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::common::error::AppError;

/// Janela [início, fim) de um dia civil no fuso da clínica, em UTC.
pub fn day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| anyhow::anyhow!("Data fora do intervalo suportado: {}", date))?;
    Ok((local_midnight(date, offset)?, local_midnight(next, offset)?))
}

/// Janela [início, fim) do mês civil que contém `date`.
pub fn month_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let first = date
        .with_day(1)
        .ok_or_else(|| anyhow::anyhow!("Data inválida: {}", date))?;
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow::anyhow!("Data fora do intervalo suportado: {}", date))?;

    Ok((local_midnight(first, offset)?, local_midnight(next_first, offset)?))
}

/// "Hoje" no fuso da clínica.
pub fn local_today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<Utc>, AppError> {
    let naive = date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("Horário local ambíguo: {}", naive).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn day_window_follows_clinic_offset() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, end) = day_bounds(date, brt()).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-10T03:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-03-11T03:00:00+00:00");
    }

    #[test]
    fn month_window_handles_december() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let (start, end) = month_bounds(date, brt()).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-12-01T03:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T03:00:00+00:00");
    }

    #[test]
    fn month_window_handles_leap_february() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = month_bounds(date, utc).unwrap();
        assert_eq!((end - start).num_days(), 29);
    }
}
