use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. Wall time is used for
/// session timestamps, instants for measuring elapsed time, so that a wall clock jump doesn't make
/// the stopwatch go backwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

/// Clock for tests. Wall time starts at `start_time` and moves together with tokio time, which
/// allows pausing and advancing it with `tokio::time::advance`.
#[cfg(test)]
#[derive(Clone)]
pub struct TestClock {
    pub start_time: DateTime<Utc>,
    pub reference: Instant,
}

#[cfg(test)]
impl TestClock {
    pub fn starting_at(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            reference: Instant::now(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for TestClock {
    fn time(&self) -> DateTime<Utc> {
        self.start_time + self.reference.elapsed()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}
