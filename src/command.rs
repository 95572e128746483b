//! The line protocol spoken by the `ride_dispatch` binary.
//!
//! Each input line holds one command such as `Insert(1,5,10)` or
//! `Print(2,8)`. Each command writes at most one reply line:
//!
//! | Command              | Reply                                                   |
//! |----------------------|---------------------------------------------------------|
//! | `Insert(id,c,d)`     | nothing, or `Duplicate RideNumber` and the run halts     |
//! | `GetNextRide()`      | `(id,cost,duration)`, or `No active ride requests`       |
//! | `Print(id)`          | `(id,cost,duration)`, or `(0,0,0)`                       |
//! | `Print(lo,hi)`       | matches joined by `", "`, or `(0,0,0)`                   |
//! | `UpdateTrip(id,d)`   | nothing                                                 |
//! | `CancelRide(id)`     | nothing                                                 |
//!
//! # Examples
//!
//! ```
//! use ride_dispatch::Dispatcher;
//! use ride_dispatch::command::run;
//!
//! let script = "Insert(5,50,120)\nInsert(9,10,30)\nPrint(1,10)\nGetNextRide()\n";
//! let mut out = Vec::new();
//! let summary = run(&mut Dispatcher::new(), script.as_bytes(), &mut out).unwrap();
//!
//! assert!(!summary.halted);
//! assert_eq!(String::from_utf8(out).unwrap(), "(5,50,120), (9,10,30)\n(9,10,30)\n");
//! ```

use std::fmt;
use std::io::{self, BufRead, Write};
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;
use tracing::{trace, warn};

use crate::dispatcher::Dispatcher;
use crate::error::Error as DispatchError;
use crate::record::Record;

/// One parsed input line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Command {
    Insert(Record),
    GetNextRide,
    Print(u64),
    PrintRange(u64, u64),
    UpdateTrip { id: u64, duration: u64 },
    CancelRide(u64),
}

/// Why an input line is not a command.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` takes {expected} argument(s), found {found}")]
    Arity {
        command: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid {field} `{text}` in `{command}`")]
    InvalidNumber {
        command: &'static str,
        field: &'static str,
        text: String,
        #[source]
        source: ParseIntError,
    },
}

/// Errors that abort a [`run`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The dispatcher reported a contract violation.
    #[error("dispatcher failure: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Whether a run continues after a command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    /// A fatal reply was written; no further commands may run.
    Halt,
}

/// What a [`run`] did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Commands parsed and executed, including the one that halted the run.
    pub executed: usize,
    /// Non-blank lines that did not parse.
    pub skipped: usize,
    /// `true` if the run stopped at a fatal reply.
    pub halted: bool,
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once('(').unwrap_or((line, ""));
        let rest = rest.trim_end();
        let rest = rest.strip_suffix(')').unwrap_or(rest);
        let args: Vec<&str> = if rest.trim().is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        match (name.trim(), args.as_slice()) {
            ("", _) => Err(ParseError::Empty),
            ("Insert", &[id, cost, duration]) => Ok(Command::Insert(Record::new(
                number("Insert", "ride number", id)?,
                number("Insert", "ride cost", cost)?,
                number("Insert", "trip duration", duration)?,
            ))),
            ("Insert", _) => Err(arity("Insert", "3", &args)),
            ("GetNextRide", &[]) => Ok(Command::GetNextRide),
            ("GetNextRide", _) => Err(arity("GetNextRide", "0", &args)),
            ("Print", &[id]) => Ok(Command::Print(number("Print", "ride number", id)?)),
            ("Print", &[lo, hi]) => Ok(Command::PrintRange(
                number("Print", "lower ride number", lo)?,
                number("Print", "upper ride number", hi)?,
            )),
            ("Print", _) => Err(arity("Print", "1 or 2", &args)),
            ("UpdateTrip", &[id, duration]) => Ok(Command::UpdateTrip {
                id: number("UpdateTrip", "ride number", id)?,
                duration: number("UpdateTrip", "trip duration", duration)?,
            }),
            ("UpdateTrip", _) => Err(arity("UpdateTrip", "2", &args)),
            ("CancelRide", &[id]) => Ok(Command::CancelRide(number("CancelRide", "ride number", id)?)),
            ("CancelRide", _) => Err(arity("CancelRide", "1", &args)),
            (other, _) => Err(ParseError::UnknownCommand(other.to_owned())),
        }
    }
}

fn number(command: &'static str, field: &'static str, text: &str) -> Result<u64, ParseError> {
    text.parse().map_err(|source| ParseError::InvalidNumber {
        command,
        field,
        text: text.to_owned(),
        source,
    })
}

fn arity(command: &'static str, expected: &'static str, args: &[&str]) -> ParseError {
    ParseError::Arity {
        command,
        expected,
        found: args.len(),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Command::Insert(Record { id, cost, duration }) => write!(f, "Insert({id},{cost},{duration})"),
            Command::GetNextRide => f.write_str("GetNextRide()"),
            Command::Print(id) => write!(f, "Print({id})"),
            Command::PrintRange(lo, hi) => write!(f, "Print({lo},{hi})"),
            Command::UpdateTrip { id, duration } => write!(f, "UpdateTrip({id},{duration})"),
            Command::CancelRide(id) => write!(f, "CancelRide({id})"),
        }
    }
}

impl Command {
    /// Applies the command to `rides` and writes its reply, if any, to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Io`] if `out` fails, and [`RunError::Dispatch`] if
    /// the dispatcher reports a contract violation. A duplicate ride number is
    /// not an error here: it is written to `out` and reported as [`Flow::Halt`].
    pub fn execute<W: Write>(&self, rides: &mut Dispatcher, out: &mut W) -> Result<Flow, RunError> {
        match *self {
            Command::Insert(record) => match rides.insert(record) {
                Ok(()) => {}
                Err(err @ DispatchError::DuplicateKey { .. }) => {
                    writeln!(out, "{err}")?;
                    return Ok(Flow::Halt);
                }
                Err(err) => return Err(err.into()),
            },
            Command::GetNextRide => match rides.extract_next() {
                Ok(record) => writeln!(out, "{record}")?,
                Err(err @ DispatchError::EmptyStore) => writeln!(out, "{err}")?,
                Err(err) => return Err(err.into()),
            },
            Command::Print(id) => writeln!(out, "{}", rides.lookup(id).unwrap_or_default())?,
            Command::PrintRange(lo, hi) => {
                let found = rides.lookup_range(lo, hi);
                if found.is_empty() {
                    writeln!(out, "{}", Record::default())?;
                } else {
                    for (n, record) in found.iter().enumerate() {
                        if n > 0 {
                            out.write_all(b", ")?;
                        }
                        write!(out, "{record}")?;
                    }
                    writeln!(out)?;
                }
            }
            Command::UpdateTrip { id, duration } => {
                rides.update_priority(id, duration)?;
            }
            Command::CancelRide(id) => {
                rides.cancel(id)?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Executes every command read from `input`, writing replies to `out`.
///
/// Blank lines are ignored. Lines that do not parse are logged and skipped.
/// The run stops after the first command that halts it. `out` is flushed
/// before returning.
///
/// # Errors
///
/// Returns [`RunError::Io`] if reading `input` or writing `out` fails, and
/// [`RunError::Dispatch`] if the dispatcher reports a contract violation.
pub fn run<R: BufRead, W: Write>(rides: &mut Dispatcher, input: R, mut out: W) -> Result<Summary, RunError> {
    let mut summary = Summary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                warn!(line = index + 1, %err, "skipping malformed command");
                summary.skipped += 1;
                continue;
            }
        };

        trace!(line = index + 1, %command, "executing");
        summary.executed += 1;
        if command.execute(rides, &mut out)? == Flow::Halt {
            summary.halted = true;
            break;
        }
    }

    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn replay(script: &str) -> (String, Summary) {
        let mut out = Vec::new();
        let summary = run(&mut Dispatcher::new(), script.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn parses_every_command() {
        assert_eq!("Insert(1,5,10)".parse(), Ok(Command::Insert(Record::new(1, 5, 10))));
        assert_eq!("GetNextRide()".parse(), Ok(Command::GetNextRide));
        assert_eq!("GetNextRide".parse(), Ok(Command::GetNextRide));
        assert_eq!("Print(3)".parse(), Ok(Command::Print(3)));
        assert_eq!("Print(2,8)".parse(), Ok(Command::PrintRange(2, 8)));
        assert_eq!("UpdateTrip(7,15)".parse(), Ok(Command::UpdateTrip { id: 7, duration: 15 }));
        assert_eq!("CancelRide(4)".parse(), Ok(Command::CancelRide(4)));
    }

    #[test]
    fn tolerates_whitespace() {
        assert_eq!("  Insert( 1, 5 ,10 )\r".parse(), Ok(Command::Insert(Record::new(1, 5, 10))));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!("".parse::<Command>(), Err(ParseError::Empty));
        assert_eq!("(1)".parse::<Command>(), Err(ParseError::Empty));
        assert_eq!("Launch(1)".parse::<Command>(), Err(ParseError::UnknownCommand("Launch".into())));
        assert_eq!(
            "Insert(1,2)".parse::<Command>(),
            Err(ParseError::Arity {
                command: "Insert",
                expected: "3",
                found: 2
            })
        );
        assert_eq!(
            "Print(1,2,3)".parse::<Command>(),
            Err(ParseError::Arity {
                command: "Print",
                expected: "1 or 2",
                found: 3
            })
        );
        let err = "CancelRide(-4)".parse::<Command>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { field: "ride number", .. }));
        assert_eq!(err.to_string(), "invalid ride number `-4` in `CancelRide`");
    }

    #[test]
    fn display_matches_the_input_syntax() {
        for line in ["Insert(1,5,10)", "GetNextRide()", "Print(3)", "Print(2,8)", "UpdateTrip(7,15)", "CancelRide(4)"] {
            assert_eq!(line.parse::<Command>().unwrap().to_string(), line);
        }
    }

    #[test]
    fn print_reports_missing_rides_as_zeroes() {
        let (out, _) = replay("Print(1)\nPrint(1,100)\n");
        assert_eq!(out, "(0,0,0)\n(0,0,0)\n");
    }

    #[test]
    fn empty_extraction_is_reported_and_the_run_continues() {
        let (out, summary) = replay("GetNextRide()\nInsert(1,1,1)\nGetNextRide()\n");
        assert_eq!(out, "No active ride requests\n(1,1,1)\n");
        assert!(!summary.halted);
        assert_eq!(summary.executed, 3);
    }

    #[test]
    fn duplicate_insert_halts_the_run() {
        let (out, summary) = replay("Insert(1,1,1)\nInsert(1,2,2)\nPrint(1)\n");
        assert_eq!(out, "Duplicate RideNumber\n");
        assert!(summary.halted);
        assert_eq!(summary.executed, 2);
    }

    #[test]
    fn malformed_and_blank_lines_are_skipped() {
        let (out, summary) = replay("\nFly(1)\nInsert(1,x,1)\n   \nInsert(2,2,2)\nPrint(2)\n");
        assert_eq!(out, "(2,2,2)\n");
        assert_eq!(
            summary,
            Summary {
                executed: 2,
                skipped: 2,
                halted: false
            }
        );
    }

    #[test]
    fn update_and_cancel_are_silent() {
        let (out, _) = replay("Insert(7,10,10)\nUpdateTrip(7,15)\nPrint(7)\nCancelRide(7)\nCancelRide(7)\nUpdateTrip(7,1)\nPrint(7)\n");
        assert_eq!(out, "(7,20,15)\n(0,0,0)\n");
    }
}
