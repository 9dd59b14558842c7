//! Session tracking. [SessionTracker] holds at most one open session and the append-only list of
//! sessions that were already stopped. Every change is published through a
//! [watch](tokio::sync::watch) channel, so the presentation can follow it without polling.

pub mod activity;
pub mod entities;

use std::sync::Arc;

use activity::Activity;
use chrono::{DateTime, TimeDelta, Utc};
use entities::{OpenSession, Session};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::utils::clock::Clock;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrackerError {
    #[error("A {activity} session is already running since {start}")]
    SessionAlreadyOpen {
        activity: Activity,
        start: DateTime<Utc>,
    },
    #[error("No session is running")]
    NoOpenSession,
}

/// What observers of the tracker get notified about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerStatus {
    Idle {
        selected: Option<Activity>,
        completed: usize,
    },
    Open {
        activity: Activity,
        start: DateTime<Utc>,
        completed: usize,
    },
}

impl TrackerStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, TrackerStatus::Open { .. })
    }
}

/// Result of [SessionTracker::toggle].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Started(Activity),
    Stopped(Session),
}

pub struct SessionTracker {
    clock: Arc<dyn Clock>,
    selected: Option<Activity>,
    open: Option<OpenSession>,
    completed: Vec<Session>,
    status: watch::Sender<TrackerStatus>,
}

impl SessionTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (status, _) = watch::channel(TrackerStatus::Idle {
            selected: None,
            completed: 0,
        });
        Self {
            clock,
            selected: None,
            open: None,
            completed: Vec::new(),
            status,
        }
    }

    /// Receiver that sees the status after every change.
    pub fn subscribe(&self) -> watch::Receiver<TrackerStatus> {
        self.status.subscribe()
    }

    /// Changes the selected activity. A running session keeps the activity it was started with.
    pub fn select(&mut self, activity: Activity) {
        debug!("Selected {activity}");
        self.selected = Some(activity);
        self.notify();
    }

    pub fn selected(&self) -> Option<Activity> {
        self.selected
    }

    /// Opens a session. `activity` takes precedence over the selection, and if neither is present
    /// the session is recorded as [Activity::Unknown].
    pub fn start(&mut self, activity: Option<Activity>) -> Result<Activity, TrackerError> {
        if let Some(open) = &self.open {
            warn!("Tried to start a session while {} is running", open.activity);
            return Err(TrackerError::SessionAlreadyOpen {
                activity: open.activity,
                start: open.start,
            });
        }

        let activity = activity.or(self.selected).unwrap_or(Activity::Unknown);
        let open = OpenSession {
            activity,
            start: self.clock.time(),
            anchor: self.clock.instant(),
        };
        info!("Started {activity} session at {}", open.start);
        self.open = Some(open);
        self.notify();
        Ok(activity)
    }

    /// Closes the running session and appends it to the completed ones.
    pub fn stop(&mut self) -> Result<Session, TrackerError> {
        let open = self.open.take().ok_or(TrackerError::NoOpenSession)?;
        let session = open.close(self.clock.time());
        info!(
            "Stopped {} session after {}s",
            session.activity(),
            session.duration().num_seconds()
        );
        self.completed.push(session.clone());
        self.notify();
        Ok(session)
    }

    /// Starts a session when idle, stops the running one otherwise.
    pub fn toggle(&mut self) -> Result<Toggled, TrackerError> {
        if self.open.is_some() {
            self.stop().map(Toggled::Stopped)
        } else {
            self.start(None).map(Toggled::Started)
        }
    }

    /// Time since the running session was started. Measured with the monotonic clock, so it never
    /// decreases while the session stays open.
    pub fn elapsed_since_start(&self) -> Result<TimeDelta, TrackerError> {
        let open = self.open.as_ref().ok_or(TrackerError::NoOpenSession)?;
        let elapsed = self.clock.instant().saturating_duration_since(open.anchor);
        Ok(TimeDelta::from_std(elapsed).unwrap_or(TimeDelta::MAX))
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Completed sessions in the order they were stopped.
    pub fn completed(&self) -> &[Session] {
        &self.completed
    }

    pub fn status(&self) -> TrackerStatus {
        match &self.open {
            Some(open) => TrackerStatus::Open {
                activity: open.activity,
                start: open.start,
                completed: self.completed.len(),
            },
            None => TrackerStatus::Idle {
                selected: self.selected,
                completed: self.completed.len(),
            },
        }
    }

    fn notify(&self) {
        // send_replace doesn't fail when nobody is subscribed.
        self.status.send_replace(self.status());
    }
}
