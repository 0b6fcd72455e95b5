use crate::calendar::{CalendarError, MonthGrid};
use crate::config::Config;
use crate::controller::Controller;
use crate::store::AnyStore;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub type RunLog = Controller<AnyStore, MonthGrid<Local>>;

/// Requests take turns on the controller; it is never used concurrently.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<RunLog>>,
}

impl AppState {
    pub fn new(controller: RunLog) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
        }
    }
}

/// Builds the controller described by `config` and runs the initial load.
pub async fn build_state(config: &Config) -> Result<AppState, CalendarError> {
    let grid = MonthGrid::current(Local)?;
    let mut controller = match config.backend.clone() {
        Ok(backend) => {
            let store = backend.into_store();
            info!("run store: {}", store.describe());
            Controller::new(store, grid, config.status_ttl)
        }
        Err(err) => Controller::disabled(err, grid),
    };

    if controller.form_enabled() {
        // The server starts regardless; the error also stays on the status line.
        if let Err(err) = controller.load().await {
            warn!("initial load failed: {err}");
        }
    }

    Ok(AppState::new(controller))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::StatusKind;
    use std::time::Instant;

    #[tokio::test]
    async fn unreadable_data_file_still_builds_state() {
        let path = std::env::temp_dir().join(format!("run_log_state_{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let data_path = path.to_string_lossy().to_string();
        let config = Config::from_lookup(|key| match key {
            "RUN_LOG_DATA_PATH" => Some(data_path.clone()),
            _ => None,
        });

        let state = build_state(&config).await.unwrap();
        std::fs::remove_file(&path).ok();

        let controller = state.controller.lock().await;
        assert!(controller.form_enabled());
        assert!(controller.runs().is_empty());
        let status = controller.status(Instant::now()).unwrap();
        assert!(status.message.starts_with("Error loading runs:"));
        assert!(matches!(status.kind, StatusKind::Error));
    }
}
