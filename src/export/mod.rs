//! Exports completed sessions into CSV files.
//!
//! Every export produces a new file `ActivityLog_<YYYYMMDD_HHMMSS>.csv` in the export directory.
//! Dates and times are written in local time.

use std::{
    fmt::Display,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Local, TimeZone};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::{
    tracker::entities::Session,
    utils::{
        clock::Clock,
        time::{format_file_timestamp, format_record_date, format_record_time},
    },
};

pub const CSV_HEADER: &str = "Activity,Start_Date,Start_Time,End_Date,End_Time,Duration";

const FILE_PREFIX: &str = "ActivityLog_";
const FILE_EXTENSION: &str = "csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create export directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write export file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct CsvExporter {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CsvExporter {
    pub fn new(dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self { dir, clock }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `sessions` into a new file and returns its path. Sessions are only borrowed, so a
    /// failed export can simply be retried.
    #[instrument(skip_all, fields(dir = ?self.dir, sessions = sessions.len()))]
    pub fn export(&self, sessions: &[Session]) -> Result<PathBuf, ExportError> {
        let now = self.clock.time().with_timezone(&Local);
        let path = self.dir.join(file_name(&now));
        let content = render_csv(sessions, &Local);

        std::fs::create_dir_all(&self.dir)
            .map_err(|source| ExportError::CreateDir {
                path: self.dir.clone(),
                source,
            })
            .inspect_err(|e| error!("{e}"))?;

        write_atomically(&self.dir, &path, content.as_bytes())
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })
            .inspect_err(|e| error!("{e}"))?;

        info!("Exported {} sessions into {path:?}", sessions.len());
        Ok(path)
    }
}

/// Name of the export file created at `moment`.
pub fn file_name<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{FILE_PREFIX}{}.{FILE_EXTENSION}",
        format_file_timestamp(moment)
    )
}

/// Renders the whole document, timestamps converted into `tz`. Every line, header included, ends
/// with `\n`.
pub fn render_csv<Tz: TimeZone>(sessions: &[Session], tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let rows = sessions
        .iter()
        .map(|session| render_row(session, tz))
        .collect::<String>();
    format!("{CSV_HEADER}\n{rows}")
}

fn render_row<Tz: TimeZone>(session: &Session, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let start = session.start().with_timezone(tz);
    let end = session.end().with_timezone(tz);
    format!(
        "{},{},{},{},{},{} seconds\n",
        session.activity().label(),
        format_record_date(&start),
        format_record_time(&start),
        format_record_date(&end),
        format_record_time(&end),
        session.duration().num_seconds(),
    )
}

/// The file either appears with the full content or doesn't appear at all. Data goes into a
/// temporary file in the same directory first, which is then renamed over `path`.
fn write_atomically(dir: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    debug!("Wrote {} bytes into {:?}", content.len(), file.path());
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
