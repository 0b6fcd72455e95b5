use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

/// Marker class for days with at least one logged run.
pub const RUN_MARKER: &str = "has-run";

const GRID_DAYS: i64 = 42;

/// A rendered day in a calendar view.
pub trait CalendarCell {
    fn add_marker(&mut self, class: &str);
    fn remove_marker(&mut self, class: &str);
    fn has_marker(&self, class: &str) -> bool;
    /// Date-key attached to the cell, if any.
    fn run_date(&self) -> Option<&str>;
    fn set_run_date(&mut self, key: Option<String>);
}

/// A month calendar that renders cells for some visible range of days.
///
/// Native dates are midnights in the widget's time zone.
pub trait CalendarWidget {
    type Tz: TimeZone;
    type Cell: CalendarCell;

    fn timezone(&self) -> &Self::Tz;

    /// Cell for `date`, or `None` when the day is not currently rendered.
    fn cell_for_date(&mut self, date: &DateTime<Self::Tz>) -> Option<&mut Self::Cell>;

    /// Every rendered cell, including padding days from adjacent months.
    fn cells_mut(&mut self) -> Box<dyn Iterator<Item = &mut Self::Cell> + '_>;
}

/// Events a widget reports to whoever drives it.
#[derive(Debug, Clone)]
pub enum CalendarEvent<Tz: TimeZone> {
    DateClicked(DateTime<Tz>),
    ViewChanged,
}

#[derive(Debug, Error, PartialEq)]
pub enum CalendarError {
    #[error("{year}-{month:02} is not a displayable month")]
    InvalidMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    date: NaiveDate,
    in_month: bool,
    classes: BTreeSet<String>,
    run_date: Option<String>,
}

impl DayCell {
    fn new(date: NaiveDate, in_month: bool) -> Self {
        Self {
            date,
            in_month,
            classes: BTreeSet::new(),
            run_date: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// False for the padding days shown before and after the month.
    pub fn in_month(&self) -> bool {
        self.in_month
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

impl CalendarCell for DayCell {
    fn add_marker(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    fn remove_marker(&mut self, class: &str) {
        self.classes.remove(class);
    }

    fn has_marker(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    fn run_date(&self) -> Option<&str> {
        self.run_date.as_deref()
    }

    fn set_run_date(&mut self, key: Option<String>) {
        self.run_date = key;
    }
}

/// Six-week month view starting on Sunday. Only days of the shown month can
/// be looked up; the padding days are rendered but never addressable.
#[derive(Debug, Clone)]
pub struct MonthGrid<Tz: TimeZone> {
    tz: Tz,
    year: i32,
    month: u32,
    cells: Vec<DayCell>,
}

impl<Tz: TimeZone> MonthGrid<Tz> {
    pub fn new(tz: Tz, year: i32, month: u32) -> Result<Self, CalendarError> {
        let mut grid = Self {
            tz,
            year,
            month,
            cells: Vec::new(),
        };
        grid.show_month(year, month)?;
        Ok(grid)
    }

    /// Grid showing the current month in `tz`.
    pub fn current(tz: Tz) -> Result<Self, CalendarError> {
        let today = Utc::now().with_timezone(&tz).date_naive();
        Self::new(tz, today.year(), today.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    pub fn title(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|first| first.format("%B %Y").to_string())
            .unwrap_or_default()
    }

    pub fn show_month(&mut self, year: i32, month: u32) -> Result<(), CalendarError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(CalendarError::InvalidMonth { year, month })?;
        let start = first - Duration::days(i64::from(first.weekday().num_days_from_sunday()));

        self.cells = (0..GRID_DAYS)
            .map(|offset| {
                let date = start + Duration::days(offset);
                DayCell::new(date, date.year() == year && date.month() == month)
            })
            .collect();
        self.year = year;
        self.month = month;
        Ok(())
    }

    pub fn next_month(&mut self) -> Result<(), CalendarError> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        self.show_month(year, month)
    }

    pub fn previous_month(&mut self) -> Result<(), CalendarError> {
        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        self.show_month(year, month)
    }

    pub fn show_today(&mut self) -> Result<(), CalendarError> {
        let today = Utc::now().with_timezone(&self.tz).date_naive();
        self.show_month(today.year(), today.month())
    }

    /// Native date for a day of the calendar.
    pub fn native_date(&self, date: NaiveDate) -> Option<DateTime<Tz>> {
        crate::dates::local_midnight(&self.tz, date)
    }
}

impl<Tz: TimeZone> CalendarWidget for MonthGrid<Tz> {
    type Tz = Tz;
    type Cell = DayCell;

    fn timezone(&self) -> &Tz {
        &self.tz
    }

    fn cell_for_date(&mut self, date: &DateTime<Tz>) -> Option<&mut DayCell> {
        let day = date.date_naive();
        self.cells
            .iter_mut()
            .find(|cell| cell.in_month && cell.date == day)
    }

    fn cells_mut(&mut self) -> Box<dyn Iterator<Item = &mut DayCell> + '_> {
        Box::new(self.cells.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn grid(year: i32, month: u32) -> MonthGrid<FixedOffset> {
        MonthGrid::new(FixedOffset::west_opt(8 * 3600).unwrap(), year, month).unwrap()
    }

    #[test]
    fn month_grid_starts_on_sunday_and_spans_six_weeks() {
        let grid = grid(2024, 3);
        assert_eq!(grid.cells().len(), 42);
        assert_eq!(grid.weeks().count(), 6);
        // March 1st 2024 is a Friday.
        assert_eq!(grid.cells()[0].date(), NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
        assert!(!grid.cells()[0].in_month());
        assert_eq!(grid.cells()[5].date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(grid.cells()[5].in_month());
        assert_eq!(grid.cells().iter().filter(|c| c.in_month()).count(), 31);
        assert_eq!(grid.title(), "March 2024");
    }

    #[test]
    fn padding_days_cannot_be_looked_up() {
        let mut grid = grid(2024, 3);
        let feb = grid.native_date(NaiveDate::from_ymd_opt(2024, 2, 25).unwrap()).unwrap();
        let march = grid.native_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).unwrap();

        assert!(grid.cell_for_date(&feb).is_none());
        let cell = grid.cell_for_date(&march).expect("march cell");
        assert_eq!(cell.date(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn navigation_wraps_years() {
        let mut grid = grid(2024, 12);
        grid.next_month().unwrap();
        assert_eq!((grid.year(), grid.month()), (2025, 1));
        grid.previous_month().unwrap();
        grid.previous_month().unwrap();
        assert_eq!((grid.year(), grid.month()), (2024, 11));
    }

    #[test]
    fn invalid_month_is_rejected() {
        let mut grid = grid(2024, 1);
        assert_eq!(
            grid.show_month(2024, 13),
            Err(CalendarError::InvalidMonth { year: 2024, month: 13 })
        );
        assert_eq!((grid.year(), grid.month()), (2024, 1));
    }

    #[test]
    fn cell_markers_and_run_date() {
        let mut cell = DayCell::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), true);
        cell.add_marker(RUN_MARKER);
        cell.set_run_date(Some("2024-03-01".into()));
        assert!(cell.has_marker(RUN_MARKER));
        assert_eq!(cell.run_date(), Some("2024-03-01"));

        cell.remove_marker(RUN_MARKER);
        cell.set_run_date(None);
        assert!(!cell.has_marker(RUN_MARKER));
        assert_eq!(cell.classes().count(), 0);
    }
}
