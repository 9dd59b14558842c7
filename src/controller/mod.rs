//! Ties [SessionTracker], [CsvExporter] and the elapsed time display together. The controller is
//! what user actions are dispatched into.

pub mod ticker;

use std::{path::PathBuf, sync::Arc, time::Duration};

use ticker::Ticker;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::{
    export::{CsvExporter, ExportError},
    tracker::{
        activity::Activity, entities::Session, SessionTracker, Toggled, TrackerError,
        TrackerStatus,
    },
    utils::{clock::Clock, time::format_elapsed},
};

pub const IDLE_DISPLAY: &str = "00:00:00";

const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct Controller {
    tracker: Arc<Mutex<SessionTracker>>,
    exporter: CsvExporter,
    clock: Arc<dyn Clock>,
    ticker: Option<Ticker>,
    display: Arc<watch::Sender<String>>,
    exported: usize,
}

impl Controller {
    pub fn new(clock: Arc<dyn Clock>, export_dir: PathBuf) -> Self {
        let (display, _) = watch::channel(IDLE_DISPLAY.to_string());
        Self {
            tracker: Arc::new(Mutex::new(SessionTracker::new(clock.clone()))),
            exporter: CsvExporter::new(export_dir, clock.clone()),
            clock,
            ticker: None,
            display: Arc::new(display),
            exported: 0,
        }
    }

    /// Elapsed time of the running session as `HH:MM:SS`, refreshed on every tick.
    pub fn display(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }

    pub async fn subscribe(&self) -> watch::Receiver<TrackerStatus> {
        self.tracker.lock().await.subscribe()
    }

    pub async fn status(&self) -> TrackerStatus {
        self.tracker.lock().await.status()
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.tracker.lock().await.completed().to_vec()
    }

    pub fn export_dir(&self) -> PathBuf {
        self.exporter.dir().to_path_buf()
    }

    pub async fn select(&self, activity: Activity) {
        self.tracker.lock().await.select(activity);
    }

    /// Opens a session and starts refreshing the display.
    pub async fn start(&mut self, activity: Option<Activity>) -> Result<Activity, TrackerError> {
        let activity = self.tracker.lock().await.start(activity)?;
        self.display.send_replace(IDLE_DISPLAY.to_string());
        self.ticker = Some(self.spawn_ticker());
        Ok(activity)
    }

    /// Stops refreshing the display, then closes the session.
    pub async fn stop(&mut self) -> Result<Session, TrackerError> {
        // The ticker locks the tracker, so it has to be stopped before the lock is taken here.
        if let Some(ticker) = self.ticker.take() {
            ticker.stop().await;
        }
        let session = self.tracker.lock().await.stop()?;
        self.display.send_replace(IDLE_DISPLAY.to_string());
        Ok(session)
    }

    pub async fn toggle(&mut self) -> Result<Toggled, TrackerError> {
        let is_open = self.tracker.lock().await.is_open();
        if is_open {
            self.stop().await.map(Toggled::Stopped)
        } else {
            self.start(None).await.map(Toggled::Started)
        }
    }

    /// Exports every completed session. The sessions stay in memory whatever the outcome.
    pub async fn export(&mut self) -> Result<PathBuf, ExportError> {
        let tracker = self.tracker.lock().await;
        let sessions = tracker.completed();
        let path = self.exporter.export(sessions)?;
        self.exported = sessions.len();
        Ok(path)
    }

    /// Number of completed sessions that weren't part of any successful export.
    pub async fn unexported(&self) -> usize {
        self.tracker.lock().await.completed().len() - self.exported
    }

    /// Stops the display refresh. A running session is left open, it is simply not recorded.
    pub async fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop().await;
        }
        if self.tracker.lock().await.is_open() {
            info!("Shutting down with a session still running");
        }
    }

    fn spawn_ticker(&self) -> Ticker {
        let tracker = self.tracker.clone();
        let display = self.display.clone();
        Ticker::spawn(DEFAULT_TICK_PERIOD, self.clock.clone(), move || {
            let tracker = tracker.clone();
            let display = display.clone();
            async move {
                match tracker.lock().await.elapsed_since_start() {
                    Ok(elapsed) => {
                        display.send_replace(format_elapsed(elapsed));
                        true
                    }
                    Err(e) => {
                        debug!("Nothing to tick for: {e}");
                        false
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::{Controller, IDLE_DISPLAY};
    use crate::{
        tracker::{activity::Activity, Toggled, TrackerError},
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    fn test_controller(dir: std::path::PathBuf) -> Controller {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        Controller::new(Arc::new(TestClock::starting_at(start)), dir)
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_follows_session() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let mut controller = test_controller(dir.path().to_path_buf());
        let mut display = controller.display();

        controller.select(Activity::Talking).await;
        assert_eq!(controller.toggle().await, Ok(Toggled::Started(Activity::Talking)));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(*display.borrow_and_update(), "00:00:03");

        let Ok(Toggled::Stopped(session)) = controller.toggle().await else {
            panic!("Session should have been stopped");
        };
        assert_eq!(session.duration().num_milliseconds(), 3100);
        assert_eq!(*display.borrow_and_update(), IDLE_DISPLAY);

        // No ticks once the session is closed.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!display.has_changed()?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_lifecycle() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = test_controller(dir.path().to_path_buf());

        assert!(controller.ticker.is_none());
        controller.start(None).await.unwrap();
        assert!(controller.ticker.is_some());
        assert!(matches!(
            controller.start(Some(Activity::Others)).await,
            Err(TrackerError::SessionAlreadyOpen { .. })
        ));
        assert!(controller.ticker.is_some());

        controller.stop().await.unwrap();
        assert!(controller.ticker.is_none());
        assert_eq!(controller.stop().await, Err(TrackerError::NoOpenSession));
        assert_eq!(controller.sessions().await.len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_keeps_sessions() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "")?;
        let mut controller = test_controller(blocker.clone());

        controller.start(Some(Activity::EatingDrinking)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.stop().await.unwrap();

        assert!(controller.export().await.is_err());
        assert_eq!(controller.sessions().await.len(), 1);
        assert_eq!(controller.unexported().await, 1);

        // Retry after the problem is gone.
        fs::remove_file(&blocker)?;
        let path = controller.export().await?;
        let content = fs::read_to_string(path)?;
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().starts_with("Eating_Drinking,"));
        assert!(content.ends_with(",2 seconds\n"));
        assert_eq!(controller.unexported().await, 0);
        Ok(())
    }
}
