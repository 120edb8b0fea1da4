use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// One cell of a month grid. `day == 0` marks padding outside the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl CalendarDay {
    const PADDING: CalendarDay = CalendarDay {
        day: 0,
        count: 0,
        date: None,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCalendar {
    pub month: u32,
    pub name: &'static str,
    /// Week rows, Monday first.
    pub weeks: Vec<[CalendarDay; 7]>,
}

impl MonthCalendar {
    pub fn total(&self) -> u32 {
        self.weeks.iter().flatten().map(|d| d.count).sum()
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}

pub fn month_calendar(year: i32, month: u32, counts: &BTreeMap<NaiveDate, u32>) -> Option<MonthCalendar> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let lead = first.weekday().num_days_from_monday() as usize;

    let mut cells = vec![CalendarDay::PADDING; lead];
    for day in 1..=days_in_month(year, month) {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        cells.push(CalendarDay {
            day,
            count: counts.get(&date).copied().unwrap_or(0),
            date: Some(date),
        });
    }
    while cells.len() % 7 != 0 {
        cells.push(CalendarDay::PADDING);
    }

    let weeks = cells
        .chunks_exact(7)
        .map(|w| [w[0], w[1], w[2], w[3], w[4], w[5], w[6]])
        .collect();

    Some(MonthCalendar {
        month,
        name: MONTH_NAMES[month as usize - 1],
        weeks,
    })
}

/// Twelve month grids for `year` annotated with per-day paper counts.
pub fn year_calendar(year: i32, counts: &BTreeMap<NaiveDate, u32>) -> Vec<MonthCalendar> {
    (1..=12).filter_map(|m| month_calendar(year, m, counts)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_starts_on_correct_weekday() {
        // 1 January 2024 was a Monday.
        let jan = month_calendar(2024, 1, &BTreeMap::new()).unwrap();
        assert_eq!(jan.weeks[0][0].day, 1);
        assert_eq!(jan.weeks.len(), 5);

        // 1 September 2024 was a Sunday.
        let sep = month_calendar(2024, 9, &BTreeMap::new()).unwrap();
        assert!(sep.weeks[0][..6].iter().all(|d| d.day == 0));
        assert_eq!(sep.weeks[0][6].day, 1);
        assert_eq!(sep.weeks.len(), 6);
    }

    #[test]
    fn test_leap_february() {
        let feb = month_calendar(2024, 2, &BTreeMap::new()).unwrap();
        let days: Vec<u32> = feb.weeks.iter().flatten().filter(|d| d.day > 0).map(|d| d.day).collect();
        assert_eq!(days.last(), Some(&29));
        let feb_2023 = month_calendar(2023, 2, &BTreeMap::new()).unwrap();
        assert_eq!(feb_2023.weeks.iter().flatten().filter(|d| d.day > 0).count(), 28);
    }

    #[test]
    fn test_counts_are_placed() {
        let mut counts = BTreeMap::new();
        counts.insert(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), 4);
        let year = year_calendar(2024, &counts);
        assert_eq!(year.len(), 12);
        assert_eq!(year[2].name, "March");
        assert_eq!(year[2].total(), 4);
        assert_eq!(year[0].total(), 0);
    }
}
