//! Interactive console. Reads one command per line and redraws the timer in place on every tick.

use std::{io::Write, str::FromStr};

use ansi_term::Colour;
use anyhow::{anyhow, Result};
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    controller::Controller,
    tracker::{activity::Activity, Toggled, TrackerStatus},
    utils::time::format_elapsed,
};

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Select(Activity),
    Toggle,
    Start(Option<Activity>),
    Stop,
    Export,
    Status,
    List,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let command = parts
            .next()
            .ok_or_else(|| anyhow!("Empty command"))?
            .to_ascii_lowercase();
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(anyhow!("Too many arguments in {s:?}"));
        }

        match (command.as_str(), argument) {
            ("select" | "s", Some(activity)) => Ok(Self::Select(activity.parse()?)),
            ("select" | "s", None) => Err(anyhow!("select needs an activity")),
            ("1" | "2" | "3", None) => Ok(Self::Select(command.parse()?)),
            ("toggle" | "t", None) => Ok(Self::Toggle),
            ("start", activity) => Ok(Self::Start(activity.map(str::parse).transpose()?)),
            ("stop", None) => Ok(Self::Stop),
            ("export" | "e", None) => Ok(Self::Export),
            ("status", None) => Ok(Self::Status),
            ("list" | "ls", None) => Ok(Self::List),
            ("help" | "h" | "?", None) => Ok(Self::Help),
            ("quit" | "q" | "exit", None) => Ok(Self::Quit),
            _ => Err(anyhow!(
                "Unknown command {:?}, type help for the list of commands",
                s.trim()
            )),
        }
    }
}

/// Runs until `quit`, end of input or `shutdown`. Sessions that weren't exported by then are
/// reported, since they only live in memory.
pub async fn run_console<R, W>(
    mut controller: Controller,
    input: R,
    output: &mut W,
    shutdown: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut display = controller.display();
    let mut status = controller.subscribe().await;

    print_help(output)?;
    let initial = status.borrow_and_update().clone();
    print_status(output, &initial)?;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("Console received shutdown");
                break;
            }
            Ok(()) = display.changed() => {
                let timer = display.borrow_and_update().clone();
                write!(output, "\rTimer: {timer}")?;
                output.flush()?;
            }
            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                writeln!(output)?;
                print_status(output, &current)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Console input ended");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(command) => {
                        if !execute(&mut controller, command, output).await? {
                            break;
                        }
                    }
                    Err(e) => writeln!(output, "{}", Colour::Yellow.paint(e.to_string()))?,
                }
            }
        }
    }

    controller.shutdown().await;
    let unexported = controller.unexported().await;
    if unexported > 0 {
        warn!("Exiting with {unexported} sessions that weren't exported");
        writeln!(
            output,
            "{}",
            Colour::Yellow.paint(format!(
                "{unexported} sessions were not exported and are discarded"
            ))
        )?;
    }
    Ok(())
}

/// Executes a single command. Returns false when the console should exit.
async fn execute<W: Write>(
    controller: &mut Controller,
    command: ConsoleCommand,
    output: &mut W,
) -> Result<bool> {
    match command {
        ConsoleCommand::Select(activity) => controller.select(activity).await,
        ConsoleCommand::Toggle => match controller.toggle().await {
            Ok(Toggled::Started(activity)) => writeln!(output, "Started {activity}")?,
            Ok(Toggled::Stopped(session)) => writeln!(
                output,
                "Stopped {} after {}",
                session.activity(),
                format_elapsed(session.duration())
            )?,
            Err(e) => print_error(output, &e)?,
        },
        ConsoleCommand::Start(activity) => match controller.start(activity).await {
            Ok(activity) => writeln!(output, "Started {activity}")?,
            Err(e) => print_error(output, &e)?,
        },
        ConsoleCommand::Stop => match controller.stop().await {
            Ok(session) => writeln!(
                output,
                "Stopped {} after {}",
                session.activity(),
                format_elapsed(session.duration())
            )?,
            Err(e) => print_error(output, &e)?,
        },
        ConsoleCommand::Export => match controller.export().await {
            Ok(path) => writeln!(output, "CSV saved successfully at {}", path.display())?,
            Err(e) => print_error(output, &format!("Failed to save CSV: {e}"))?,
        },
        ConsoleCommand::Status => print_status(output, &controller.status().await)?,
        ConsoleCommand::List => {
            let sessions = controller.sessions().await;
            if sessions.is_empty() {
                writeln!(output, "No sessions recorded yet")?;
            }
            for (index, session) in sessions.iter().enumerate() {
                writeln!(
                    output,
                    "{}\t{}\t{}\t{}",
                    index + 1,
                    session.start().with_timezone(&Local).format("%x %H:%M:%S"),
                    format_elapsed(session.duration()),
                    session.activity()
                )?;
            }
        }
        ConsoleCommand::Help => print_help(output)?,
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn print_status(output: &mut impl Write, status: &TrackerStatus) -> Result<()> {
    match status {
        TrackerStatus::Idle {
            selected,
            completed,
        } => writeln!(
            output,
            "Activity: {} | Recorded: {completed} | {}",
            selected.map_or("none", |v| v.title()),
            Colour::Green.paint("[Start Activity]")
        )?,
        TrackerStatus::Open {
            activity,
            start,
            completed,
        } => writeln!(
            output,
            "Activity: {} since {} | Recorded: {completed} | {}",
            activity.title(),
            start.with_timezone(&Local).format("%H:%M:%S"),
            Colour::Red.paint("[Stop Activity]")
        )?,
    }
    Ok(())
}

fn print_error(output: &mut impl Write, error: &impl ToString) -> Result<()> {
    writeln!(output, "{}", Colour::Red.paint(error.to_string()))?;
    Ok(())
}

fn print_help(output: &mut impl Write) -> Result<()> {
    writeln!(output, "{}", Colour::Blue.bold().paint("Activity Logger"))?;
    for (index, activity) in Activity::SELECTABLE.iter().enumerate() {
        writeln!(output, "  {}  select {}", index + 1, activity.title())?;
    }
    writeln!(output, "  t, toggle        start or stop the activity")?;
    writeln!(output, "  start [activity] start the activity")?;
    writeln!(output, "  stop             stop the activity")?;
    writeln!(output, "  e, export        export recorded sessions to CSV")?;
    writeln!(output, "  status, list     show state or recorded sessions")?;
    writeln!(output, "  q, quit          exit")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use anyhow::Result;
    use chrono::Utc;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    use super::{run_console, ConsoleCommand};
    use crate::{
        controller::Controller,
        export::CSV_HEADER,
        tracker::activity::Activity,
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "2".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Select(Activity::Talking)
        );
        assert_eq!(
            "select eating_drinking".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Select(Activity::EatingDrinking)
        );
        assert_eq!(" T ".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Toggle);
        assert_eq!(
            "start".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Start(None)
        );
        assert_eq!(
            "start others".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Start(Some(Activity::Others))
        );
        assert_eq!("e".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Export);
        assert_eq!("quit".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn test_parse_invalid_commands() {
        assert!("".parse::<ConsoleCommand>().is_err());
        assert!("select".parse::<ConsoleCommand>().is_err());
        assert!("select dancing".parse::<ConsoleCommand>().is_err());
        assert!("4".parse::<ConsoleCommand>().is_err());
        assert!("stop now".parse::<ConsoleCommand>().is_err());
        assert!("start talking loudly".parse::<ConsoleCommand>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_session() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let controller = Controller::new(
            Arc::new(TestClock::starting_at(Utc::now())),
            dir.path().to_path_buf(),
        );
        let input: &[u8] = b"2\ntoggle\nstop\nstop\ndance\nexport\nlist\nquit\nstart\n";
        let mut output = Vec::<u8>::new();

        run_console(controller, input, &mut output, CancellationToken::new()).await?;

        let output = String::from_utf8(output)?;
        assert!(output.contains("Started Talking"));
        assert!(output.contains("Stopped Talking after 00:00:00"));
        assert!(output.contains("No session is running"));
        assert!(output.contains("Unknown command \"dance\""));
        assert!(output.contains("CSV saved successfully"));
        assert!(!output.contains("not exported"));
        // Nothing after quit is executed.
        assert_eq!(output.matches("Started").count(), 1);

        let files = fs::read_dir(dir.path())?.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(files[0].path())?;
        assert!(content.starts_with(CSV_HEADER));
        assert!(content.contains("\nTalking,"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_warns_about_unexported() -> Result<()> {
        let dir = tempdir()?;
        let controller = Controller::new(
            Arc::new(TestClock::starting_at(Utc::now())),
            dir.path().to_path_buf(),
        );
        let input: &[u8] = b"start\nstop\n";
        let mut output = Vec::<u8>::new();

        run_console(controller, input, &mut output, CancellationToken::new()).await?;

        let output = String::from_utf8(output)?;
        assert!(output.contains("Started Unknown"));
        assert!(output.contains("1 sessions were not exported"));
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_stops_on_shutdown() -> Result<()> {
        let dir = tempdir()?;
        let controller = Controller::new(
            Arc::new(TestClock::starting_at(Utc::now())),
            dir.path().to_path_buf(),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let input: &[u8] = b"start\n";
        let mut output = Vec::<u8>::new();

        run_console(controller, input, &mut output, shutdown).await?;

        let output = String::from_utf8(output)?;
        assert!(!output.contains("Started"));
        Ok(())
    }
}
