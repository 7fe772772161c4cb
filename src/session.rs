//! Interactive stop lookup and arrivals console.
//!
//! The conversation is an explicit state machine. Each call to
//! [`Session::step`] asks one question, reads one answer and returns the next
//! state. Input, output, the station table, the feed source and the clock are
//! all injected, so a scripted reader and an in-memory writer can drive a
//! complete session.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::arrivals::extract_arrivals;
use crate::error::FetchError;
use crate::fetch::FeedSource;
use crate::matcher::{Candidate, DEFAULT_LIMIT, fuzzy_match};
use crate::output::{write_arrivals, write_banner};
use crate::parser::parse_feed;
use crate::stations::StopDirectory;

pub const QUERY_PROMPT: &str =
    "\nEnter the name of the stop you want to look up (or 'q' to quit): ";
pub const SELECTION_PROMPT: &str =
    "\nEnter the number of your choice (or 'n' for a new search): ";
pub const ROUTE_PROMPT: &str = "Enter the route ID (e.g., F): ";
pub const DIRECTION_PROMPT: &str = "Northbound or Southbound? (e.g., N): ";

/// Time zone the MTA publishes schedules in.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// A stop identifier waiting for its route and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTarget {
    pub stop_id: String,
    pub daytime_routes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    AwaitingQuery,
    AwaitingSelection {
        candidates: Vec<Candidate>,
    },
    AwaitingRoute {
        target: StopTarget,
        remaining: VecDeque<StopTarget>,
    },
    AwaitingDirection {
        target: StopTarget,
        route_id: String,
        remaining: VecDeque<StopTarget>,
    },
    Done,
}

pub struct Session<'a, D, F, R, W> {
    stations: &'a D,
    feeds: &'a F,
    stop_names: Vec<String>,
    tz: Tz,
    clock: fn() -> DateTime<Utc>,
    input: R,
    output: W,
}

impl<'a, D, F, R, W> Session<'a, D, F, R, W>
where
    D: StopDirectory,
    F: FeedSource,
    R: BufRead,
    W: Write,
{
    /// `stop_names` is the candidate set offered to the matcher; it is
    /// loaded once at startup while `stations` is consulted on every lookup.
    pub fn new(stations: &'a D, feeds: &'a F, stop_names: Vec<String>, input: R, output: W) -> Self {
        Self {
            stations,
            feeds,
            stop_names,
            tz: DEFAULT_TIMEZONE,
            clock: Utc::now,
            input,
            output,
        }
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Drives the conversation until the user quits or input runs out.
    ///
    /// # Errors
    ///
    /// Only I/O failures on the console end the session; lookup, fetch and
    /// decode failures are reported and the conversation carries on.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut state = State::AwaitingQuery;
        while !matches!(state, State::Done) {
            state = self.step(state).await?;
        }
        Ok(())
    }

    /// Handles one prompt/answer exchange.
    pub async fn step(&mut self, state: State) -> std::io::Result<State> {
        match state {
            State::AwaitingQuery => self.on_query(),
            State::AwaitingSelection { candidates } => self.on_selection(candidates),
            State::AwaitingRoute { target, remaining } => {
                let Some(answer) = self.read_answer(ROUTE_PROMPT)? else {
                    return Ok(State::Done);
                };
                Ok(State::AwaitingDirection {
                    target,
                    route_id: answer.to_uppercase(),
                    remaining,
                })
            }
            State::AwaitingDirection {
                target,
                route_id,
                remaining,
            } => {
                let Some(answer) = self.read_answer(DIRECTION_PROMPT)? else {
                    return Ok(State::Done);
                };
                let stop_id = format!("{}{}", target.stop_id, answer.to_uppercase());
                self.report_arrivals(&route_id, &stop_id).await?;
                self.next_target(remaining)
            }
            State::Done => Ok(State::Done),
        }
    }

    fn on_query(&mut self) -> std::io::Result<State> {
        let Some(query) = self.read_answer(QUERY_PROMPT)? else {
            return Ok(State::Done);
        };
        if query.eq_ignore_ascii_case("q") {
            return Ok(State::Done);
        }
        if query.is_empty() {
            return Ok(State::AwaitingQuery);
        }

        let candidates = fuzzy_match(&query, &self.stop_names, DEFAULT_LIMIT);
        debug!(query = %query, candidates = candidates.len(), "Stop names ranked");

        writeln!(self.output, "\nDid you mean one of these stops?")?;
        for (idx, candidate) in candidates.iter().enumerate() {
            writeln!(
                self.output,
                "{}. {} (Match score: {})",
                idx + 1,
                candidate.name,
                candidate.score
            )?;
        }

        Ok(State::AwaitingSelection { candidates })
    }

    fn on_selection(&mut self, candidates: Vec<Candidate>) -> std::io::Result<State> {
        let Some(choice) = self.read_answer(SELECTION_PROMPT)? else {
            return Ok(State::Done);
        };
        if choice.eq_ignore_ascii_case("n") {
            return Ok(State::AwaitingQuery);
        }

        let Ok(number) = choice.parse::<i64>() else {
            writeln!(
                self.output,
                "Invalid input. Please enter a number or 'n' for a new search."
            )?;
            return Ok(State::AwaitingSelection { candidates });
        };

        let selected = usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| candidates.get(idx));
        let Some(selected) = selected else {
            writeln!(self.output, "Invalid choice. Please try again.")?;
            return Ok(State::AwaitingSelection { candidates });
        };
        let name = selected.name.clone();

        let records = match self.stations.find_stop(&name) {
            Ok(records) => records,
            Err(e) => {
                debug!(stop = %name, error = %e, "Station lookup failed");
                writeln!(self.output, "Error reading station table: {e}")?;
                return Ok(State::AwaitingQuery);
            }
        };

        if records.is_empty() {
            writeln!(self.output, "\nNo GTFS Stop ID found for {name}")?;
            return Ok(State::AwaitingQuery);
        }

        writeln!(
            self.output,
            "\nGTFS Stop ID(s) and Daytime Routes for {name}:"
        )?;
        let targets = records
            .into_iter()
            .flat_map(|record| {
                let routes = record.daytime_routes;
                record.stop_ids.into_iter().map(move |stop_id| StopTarget {
                    stop_id,
                    daytime_routes: routes.clone(),
                })
            })
            .collect();

        self.next_target(targets)
    }

    /// Announces the next pending stop id, or goes back to searching.
    fn next_target(&mut self, mut remaining: VecDeque<StopTarget>) -> std::io::Result<State> {
        let Some(target) = remaining.pop_front() else {
            return Ok(State::AwaitingQuery);
        };

        writeln!(
            self.output,
            "Stop ID: {}, Daytime Routes: {}",
            target.stop_id, target.daytime_routes
        )?;
        Ok(State::AwaitingRoute { target, remaining })
    }

    async fn report_arrivals(&mut self, route_id: &str, stop_id: &str) -> std::io::Result<()> {
        let feeds = self.feeds;

        let bytes = match feeds.fetch_feed(route_id).await {
            Ok(bytes) => bytes,
            Err(FetchError::InvalidRoute(e)) => {
                debug!(route_id, "Route not served by any feed");
                return writeln!(self.output, "{e}");
            }
            Err(e) => {
                debug!(route_id, error = %e, "Feed fetch failed");
                return writeln!(self.output, "Error fetching feed: {e}");
            }
        };

        let feed = match parse_feed(&bytes) {
            Ok(feed) => feed,
            Err(e) => {
                debug!(route_id, error = %e, "Feed parse failed");
                return writeln!(self.output, "Error parsing protobuf: {e:#}");
            }
        };

        let now = (self.clock)().with_timezone(&self.tz);
        let arrivals = extract_arrivals(&feed, route_id, stop_id, now);
        info!(route_id, stop_id, count = arrivals.len(), "Arrivals extracted");

        write_banner(&mut self.output, &now)?;
        write_arrivals(&mut self.output, route_id, &arrivals)
    }

    /// Prompts and reads one trimmed line. `None` once input is exhausted.
    fn read_answer(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
