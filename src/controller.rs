//! Ties the run store, the aggregator and the calendar together.
//!
//! Every operation reports its outcome on the status line. Errors are also
//! returned for callers that want them (the JSON API), but nothing here
//! leaves the controller in a half-updated state: a failed load or save
//! keeps whatever runs were indexed before.

use crate::aggregator::RunAggregator;
use crate::calendar::{CalendarEvent, CalendarError, CalendarWidget, MonthGrid};
use crate::config::ConfigError;
use crate::dates::{date_key_of, local_midnight, parse_date_key};
use crate::markers::{self, SyncReport};
use crate::models::{Run, RunForm};
use crate::store::{RunStore, StoreError};
use chrono::TimeZone;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

pub const INVALID_RUN_MESSAGE: &str = "Please provide a valid date and positive kilometers.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
    /// Configuration is unusable; the form stays hidden.
    Disabled,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub message: String,
    pub kind: StatusKind,
    expires_at: Option<Instant>,
}

impl Status {
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }

    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// What the detail panel shows for a clicked day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayDetail {
    NoRun { date: String },
    Runs { date: String, items: Vec<f64>, total: f64 },
}

impl DayDetail {
    pub fn date(&self) -> &str {
        match self {
            DayDetail::NoRun { date } | DayDetail::Runs { date, .. } => date,
        }
    }

    pub fn heading(&self) -> String {
        match self {
            DayDetail::NoRun { date } => format!("No run logged for {date}."),
            DayDetail::Runs { date, .. } => format!("Runs on {date}:"),
        }
    }

    pub fn item_lines(&self) -> Vec<String> {
        match self {
            DayDetail::NoRun { .. } => Vec::new(),
            DayDetail::Runs { items, .. } => items.iter().map(|km| format!("{km:.1} km")).collect(),
        }
    }

    pub fn total_line(&self) -> Option<String> {
        match self {
            DayDetail::NoRun { .. } => None,
            DayDetail::Runs { total, .. } => Some(format!("Total: {total:.1} km")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Disabled(#[from] ConfigError),
    #[error("{}", INVALID_RUN_MESSAGE)]
    Invalid,
    #[error("A run for {date} already exists.")]
    Duplicate { date: String },
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

pub struct Controller<S, W: CalendarWidget> {
    store: Option<S>,
    config_error: Option<ConfigError>,
    widget: W,
    runs: RunAggregator,
    records: Vec<Run>,
    phase: Phase,
    status: Option<Status>,
    status_ttl: Duration,
    selected: Option<DayDetail>,
    last_sync: SyncReport,
}

impl<S: RunStore, W: CalendarWidget> Controller<S, W> {
    pub fn new(store: S, widget: W, status_ttl: Duration) -> Self {
        Self {
            store: Some(store),
            config_error: None,
            widget,
            runs: RunAggregator::new(),
            records: Vec::new(),
            phase: Phase::Uninitialized,
            status: None,
            status_ttl,
            selected: None,
            last_sync: SyncReport::default(),
        }
    }

    /// A controller that never reaches the store. The configuration error is
    /// shown once and stays on the status line.
    pub fn disabled(err: ConfigError, widget: W) -> Self {
        error!("run form disabled: {err}");
        Self {
            store: None,
            status: Some(Status {
                message: format!("ERROR: {err}"),
                kind: StatusKind::Error,
                expires_at: None,
            }),
            config_error: Some(err),
            widget,
            runs: RunAggregator::new(),
            records: Vec::new(),
            phase: Phase::Disabled,
            status_ttl: Duration::ZERO,
            selected: None,
            last_sync: SyncReport::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn form_enabled(&self) -> bool {
        self.phase != Phase::Disabled
    }

    pub fn runs(&self) -> &RunAggregator {
        &self.runs
    }

    /// Runs from the last successful load, newest first.
    pub fn records(&self) -> &[Run] {
        &self.records
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn selected(&self) -> Option<&DayDetail> {
        self.selected.as_ref()
    }

    pub fn last_sync(&self) -> SyncReport {
        self.last_sync
    }

    /// Current status line, or `None` once a transient message has expired.
    pub fn status(&self, now: Instant) -> Option<&Status> {
        self.status.as_ref().filter(|status| !status.expired(now))
    }

    pub fn status_ttl(&self) -> Duration {
        self.status_ttl
    }

    fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some(Status {
            message: message.into(),
            kind,
            expires_at: Some(Instant::now() + self.status_ttl),
        });
    }

    fn disabled_error(&self) -> ControllerError {
        let err = self
            .config_error
            .clone()
            .unwrap_or_else(|| ConfigError::Credentials("no run store available".into()));
        ControllerError::Disabled(err)
    }

    /// Fetches every run, rebuilds the index and re-marks the calendar.
    /// Returns the number of runs loaded.
    pub async fn load(&mut self) -> Result<usize, ControllerError> {
        let Some(store) = self.store.as_ref() else {
            return Err(self.disabled_error());
        };
        self.phase = Phase::Loading;
        info!("loading runs");

        let result = store.query().await;
        self.phase = Phase::Ready;

        match result {
            Ok(records) => {
                self.runs.replace(&records);
                self.last_sync = markers::resync(&mut self.widget, &self.runs);
                if let Some(date) = self.selected.as_ref().map(|d| d.date().to_string()) {
                    self.selected = Some(self.day_detail(&date));
                }
                let count = records.len();
                self.records = records;
                info!("loaded {count} runs");
                Ok(count)
            }
            Err(err) => {
                warn!("error loading runs: {err}");
                self.set_status(format!("Error loading runs: {err}"), StatusKind::Error);
                Err(ControllerError::Store(err))
            }
        }
    }

    /// Validates and stores a run, then reloads everything on success.
    pub async fn submit(&mut self, date: &str, kilometers: f64) -> Result<Run, ControllerError> {
        if self.store.is_none() {
            return Err(self.disabled_error());
        }

        let date = date.trim();
        if date.is_empty()
            || parse_date_key(date).is_err()
            || !kilometers.is_finite()
            || kilometers <= 0.0
        {
            self.set_status(INVALID_RUN_MESSAGE, StatusKind::Error);
            return Err(ControllerError::Invalid);
        }

        info!("saving run: {date}, {kilometers} km");
        self.set_status("Saving run...", StatusKind::Info);
        let Some(store) = self.store.as_ref() else {
            return Err(self.disabled_error());
        };
        let result = store.insert(Run::new(date, kilometers)).await;

        match result {
            Ok(saved) => {
                self.set_status("Run saved successfully!", StatusKind::Success);
                // A failed reload reports itself; the run is stored either way.
                let _ = self.load().await;
                Ok(saved)
            }
            Err(StoreError::Duplicate(detail)) => {
                warn!("duplicate run for {date}: {detail}");
                let err = ControllerError::Duplicate { date: date.to_string() };
                self.set_status(err.to_string(), StatusKind::Error);
                Err(err)
            }
            Err(err) => {
                warn!("error saving run: {err}");
                self.set_status(format!("Error saving run: {err}"), StatusKind::Error);
                Err(ControllerError::Store(err))
            }
        }
    }

    /// Form input arrives as text; anything that is not a number fails
    /// validation like a non-positive distance does.
    pub async fn submit_form(&mut self, form: &RunForm) -> Result<Run, ControllerError> {
        let kilometers = form.kilometers.trim().parse::<f64>().unwrap_or(f64::NAN);
        self.submit(&form.date, kilometers).await
    }

    pub fn handle_event(&mut self, event: CalendarEvent<W::Tz>) {
        match event {
            CalendarEvent::DateClicked(date) => {
                let key = date_key_of(&date);
                let detail = self.day_detail(&key);
                info!("date clicked: {key} ({})", detail.heading());
                self.selected = Some(detail);
            }
            CalendarEvent::ViewChanged => {
                self.last_sync = markers::resync(&mut self.widget, &self.runs);
            }
        }
    }

    /// Clicks the day named by `date_key`.
    pub fn select_date(&mut self, date_key: &str) -> Result<&DayDetail, ControllerError> {
        let day = parse_date_key(date_key).map_err(|_| ControllerError::Invalid)?;
        let native = local_midnight(self.widget.timezone(), day).ok_or(ControllerError::Invalid)?;
        self.handle_event(CalendarEvent::DateClicked(native));
        self.selected.as_ref().ok_or(ControllerError::Invalid)
    }

    /// Any day that is marked on the calendar gets a run listing, even when
    /// none of its stored distances read as numbers.
    pub fn day_detail(&self, date_key: &str) -> DayDetail {
        if !self.runs.has_runs(date_key) {
            return DayDetail::NoRun {
                date: date_key.to_string(),
            };
        }
        let items = self.runs.runs_for(date_key);
        DayDetail::Runs {
            date: date_key.to_string(),
            total: items.iter().sum(),
            items,
        }
    }
}

impl<S: RunStore, Tz: TimeZone> Controller<S, MonthGrid<Tz>> {
    pub fn show_month(&mut self, year: i32, month: u32) -> Result<(), ControllerError> {
        self.widget.show_month(year, month)?;
        self.handle_event(CalendarEvent::ViewChanged);
        Ok(())
    }

    pub fn next_month(&mut self) -> Result<(), ControllerError> {
        self.widget.next_month()?;
        self.handle_event(CalendarEvent::ViewChanged);
        Ok(())
    }

    pub fn previous_month(&mut self) -> Result<(), ControllerError> {
        self.widget.previous_month()?;
        self.handle_event(CalendarEvent::ViewChanged);
        Ok(())
    }

    pub fn show_today(&mut self) -> Result<(), ControllerError> {
        self.widget.show_today()?;
        self.handle_event(CalendarEvent::ViewChanged);
        Ok(())
    }
}
