//! Interactive line-oriented front end
//!
//! Reads commands from stdin while applying stats replies as they arrive.
//! The session is owned by this loop; nothing else mutates it.

use crate::commands::{parse_command, Command, HELP};
use crate::render;
use anyhow::Result;
use lineage_common::{Error, LineageSession, ScoringService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

enum Flow {
    Continue,
    Quit,
}

struct Repl<S: ScoringService + 'static> {
    session: LineageSession<S>,
    /// Filter of the open picker
    query: String,
}

pub async fn run<S: ScoringService + 'static>(session: LineageSession<S>) -> Result<()> {
    let mut repl = Repl {
        session,
        query: String::new(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", render::lineage(repl.session.store()));
    println!("Type 'help' for commands.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(command) => {
                        if let Flow::Quit = repl.execute(command).await {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
            Some(reply) = repl.session.next_stats_reply() => {
                if repl.session.apply_stats_reply(reply) {
                    println!("{}", render::stats(repl.session.display_stats()));
                }
            }
        }
    }

    debug!("REPL finished");
    Ok(())
}

impl<S: ScoringService + 'static> Repl<S> {
    async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Show => self.show_lineage(),
            Command::Open(slot) => {
                self.query.clear();
                match self.session.open_picker(slot).await {
                    Ok(picker) => println!("{}", render::picker(picker, "")),
                    Err(e) => report(&e),
                }
            }
            Command::OpenPool => {
                self.query.clear();
                match self.session.open_pool_picker().await {
                    Ok(picker) => println!("{}", render::picker(picker, "")),
                    Err(e) => report(&e),
                }
            }
            Command::Search(query) => {
                self.query = query;
                self.show_picker();
            }
            Command::Pick(name) => self.edit_picker(|p| p.select(&name)),
            Command::Toggle(name) => self.edit_picker(|p| p.toggle(&name)),
            Command::All(query) => {
                if !query.is_empty() {
                    self.query = query;
                }
                let query = self.query.clone();
                self.edit_picker(|p| p.toggle_all_visible(&query));
            }
            Command::SelectNone => self.edit_picker(|p| {
                p.clear_selection();
                true
            }),
            Command::Ok => match self.session.commit_picker() {
                Ok(_) => {
                    self.query.clear();
                    self.show_lineage();
                }
                Err(e) => report(&e),
            },
            Command::Back => {
                if self.session.cancel_picker() {
                    self.query.clear();
                    self.show_lineage();
                }
            }
            Command::Recommend => match self.session.recommend().await {
                Ok(outcome) => {
                    if outcome.filled.is_empty() {
                        println!("Nothing to fill.");
                    }
                    self.show_lineage();
                }
                Err(e) => report(&e),
            },
            Command::Clear(slot) => {
                if self.session.clear_slot(slot) {
                    self.show_lineage();
                }
            }
            Command::Reset => {
                self.session.reset();
                self.show_lineage();
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn show_lineage(&self) {
        println!("{}", render::lineage(self.session.store()));
    }

    fn show_picker(&self) {
        match self.session.picker() {
            Some(picker) => println!("{}", render::picker(picker, &self.query)),
            None => println!("No picker is open."),
        }
    }

    fn edit_picker<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut lineage_common::PickerSession) -> bool,
    {
        match self.session.picker_mut() {
            Some(picker) => {
                if !edit(picker) {
                    println!("Nothing changed.");
                }
                self.show_picker();
            }
            None => println!("No picker is open."),
        }
    }
}

/// Precondition and constraint errors are expected user mistakes
fn report(error: &Error) {
    match error {
        Error::PreconditionNotMet(_) | Error::ConstraintViolation { .. } => {
            debug!(error = %error, "Command ignored");
            println!("{}", error);
        }
        _ => println!("Failed: {}", error),
    }
}
