use crate::aggregator::RunAggregator;
use crate::calendar::{CalendarCell, CalendarWidget, RUN_MARKER};
use crate::dates::widget_date;
use tracing::{debug, warn};

/// Outcome of one marker pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub cleared: usize,
    pub marked: usize,
    /// Dates with runs that have no rendered cell.
    pub skipped: usize,
}

/// Rebuilds the run markers on every rendered cell of `widget`.
///
/// All markers are cleared before any are placed, so after this call the
/// marked cells are exactly the rendered days that have runs, whatever was
/// marked before. Calling it twice in a row is a no-op the second time.
pub fn resync<W: CalendarWidget>(widget: &mut W, runs: &RunAggregator) -> SyncReport {
    let mut report = SyncReport::default();

    for cell in widget.cells_mut() {
        if cell.has_marker(RUN_MARKER) || cell.run_date().is_some() {
            cell.remove_marker(RUN_MARKER);
            cell.set_run_date(None);
            report.cleared += 1;
        }
    }

    let tz = widget.timezone().clone();
    for key in runs.dates_with_runs() {
        let native = match widget_date(&tz, &key) {
            Ok(native) => native,
            Err(err) => {
                warn!("skipping run date while marking calendar: {err}");
                report.skipped += 1;
                continue;
            }
        };

        match widget.cell_for_date(&native) {
            Some(cell) => {
                cell.add_marker(RUN_MARKER);
                cell.set_run_date(Some(key));
                report.marked += 1;
            }
            None => report.skipped += 1,
        }
    }

    debug!(
        cleared = report.cleared,
        marked = report.marked,
        skipped = report.skipped,
        "calendar markers updated"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DayCell, MonthGrid};
    use crate::models::Run;
    use chrono::FixedOffset;

    fn marked(grid: &MonthGrid<FixedOffset>) -> Vec<(String, String)> {
        grid.cells()
            .iter()
            .filter(|cell| cell.has_marker(RUN_MARKER))
            .map(|cell: &DayCell| {
                (
                    cell.date().to_string(),
                    cell.run_date().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn west_grid(year: i32, month: u32) -> MonthGrid<FixedOffset> {
        MonthGrid::new(FixedOffset::west_opt(8 * 3600).unwrap(), year, month).unwrap()
    }

    fn runs(records: &[Run]) -> RunAggregator {
        let mut aggregator = RunAggregator::new();
        aggregator.replace(records);
        aggregator
    }

    #[test]
    fn marks_the_exact_day_west_of_utc() {
        let mut grid = west_grid(2024, 1);
        let index = runs(&[Run::new("2024-01-15", 6.0), Run::new("2024-01-01", 2.0)]);

        let report = resync(&mut grid, &index);

        assert_eq!(report.marked, 2);
        assert_eq!(
            marked(&grid),
            vec![
                ("2024-01-01".to_string(), "2024-01-01".to_string()),
                ("2024-01-15".to_string(), "2024-01-15".to_string()),
            ]
        );
    }

    #[test]
    fn resync_is_idempotent() {
        let mut grid = west_grid(2024, 3);
        let index = runs(&[Run::new("2024-03-01", 5.0), Run::new("2024-03-01", 3.5)]);

        resync(&mut grid, &index);
        let first = marked(&grid);
        let second_report = resync(&mut grid, &index);

        assert_eq!(marked(&grid), first);
        assert_eq!(second_report.cleared, 1);
        assert_eq!(second_report.marked, 1);
    }

    #[test]
    fn dates_outside_the_visible_month_are_skipped() {
        let mut grid = west_grid(2024, 3);
        // Feb 29 is rendered as padding but is not addressable.
        let index = runs(&[Run::new("2024-02-29", 4.0), Run::new("2024-04-02", 1.0)]);

        let report = resync(&mut grid, &index);

        assert_eq!(report, SyncReport { cleared: 0, marked: 0, skipped: 2 });
        assert!(marked(&grid).is_empty());
    }

    #[test]
    fn stale_markers_are_removed_when_runs_change() {
        let mut grid = west_grid(2024, 3);
        resync(&mut grid, &runs(&[Run::new("2024-03-10", 5.0)]));
        resync(&mut grid, &runs(&[Run::new("2024-03-11", 5.0)]));

        assert_eq!(
            marked(&grid),
            vec![("2024-03-11".to_string(), "2024-03-11".to_string())]
        );
        assert!(grid.cells().iter().all(|c| c.run_date() != Some("2024-03-10")));
    }

    #[test]
    fn empty_index_marks_nothing() {
        let mut grid = west_grid(2024, 3);
        let report = resync(&mut grid, &RunAggregator::new());
        assert_eq!(report, SyncReport::default());
        assert!(marked(&grid).is_empty());
    }

    #[test]
    fn malformed_keys_do_not_abort_the_pass() {
        let mut grid = west_grid(2024, 3);
        let index = runs(&[Run::new("garbage", 1.0), Run::new("2024-03-05", 1.0)]);

        let report = resync(&mut grid, &index);

        assert_eq!(report.marked, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn markers_follow_month_navigation() {
        let mut grid = west_grid(2024, 3);
        let index = runs(&[Run::new("2024-03-05", 1.0), Run::new("2024-04-05", 2.0)]);
        resync(&mut grid, &index);
        assert_eq!(marked(&grid).len(), 1);

        grid.next_month().unwrap();
        resync(&mut grid, &index);
        assert_eq!(
            marked(&grid),
            vec![("2024-04-05".to_string(), "2024-04-05".to_string())]
        );
    }
}
