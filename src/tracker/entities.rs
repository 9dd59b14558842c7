use chrono::{DateTime, TimeDelta, Utc};

use super::activity::Activity;

/// A finished session. Fields are private so that a recorded session can't be changed after the
/// fact, and `end` is never before `start`.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Session {
    activity: Activity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Session {
    /// Wall clocks may be adjusted while a session is running. If `end` ends up before `start` the
    /// session is treated as empty.
    pub fn new(activity: Activity, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            activity,
            start,
            end: end.max(start),
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Session that hasn't been stopped yet.
#[derive(Debug, Clone)]
pub(super) struct OpenSession {
    pub activity: Activity,
    pub start: DateTime<Utc>,
    /// Monotonic counterpart of `start`, used for elapsed time.
    pub anchor: tokio::time::Instant,
}

impl OpenSession {
    pub fn close(self, end: DateTime<Utc>) -> Session {
        Session::new(self.activity, self.start, end)
    }
}
