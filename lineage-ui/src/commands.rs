//! REPL command parsing

use lineage_common::SlotKey;

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    /// Open a single-select picker for a slot
    Open(SlotKey),
    /// Open the candidate pool picker
    OpenPool,
    /// Filter the open picker's list
    Search(String),
    Pick(String),
    Toggle(String),
    /// Select or deselect everything matching the query
    All(String),
    SelectNone,
    Ok,
    Back,
    Recommend,
    Clear(SlotKey),
    Reset,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  show                 Show the lineage, bubbles and stats
  child                Pick the child
  open <slot|pool>     Pick for a slot (p1 p2 gp1..gp4) or edit the candidate pool
  search <text>        Filter the open picker (empty clears the filter)
  pick <name>          Choose a candidate
  toggle <name>        Flip a candidate in or out of the selection
  all [text]           Select all visible candidates, or deselect if all are selected
  none                 Clear the picker selection
  ok                   Commit the picker
  back                 Close the picker without changes
  recommend            Fill empty slots from the optimizer
  clear <slot>         Empty a slot (clearing the child resets everything)
  reset                Clear the whole lineage and the candidate pool
  quit                 Exit";

/// Parse one input line; `Err` carries a message for the user
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Err("Type 'help' for commands".to_string()),
        "show" | "s" => Command::Show,
        "child" => Command::Open(SlotKey::Child),
        "open" | "o" => match rest.to_ascii_lowercase().as_str() {
            "" => return Err("Usage: open <slot|pool>".to_string()),
            "pool" => Command::OpenPool,
            slot => Command::Open(parse_slot(slot)?),
        },
        "search" | "/" => Command::Search(rest.to_string()),
        "pick" | "p" => Command::Pick(required(rest, "pick <name>")?),
        "toggle" | "t" => Command::Toggle(required(rest, "toggle <name>")?),
        "all" => Command::All(rest.to_string()),
        "none" => Command::SelectNone,
        "ok" => Command::Ok,
        "back" | "cancel" => Command::Back,
        "recommend" | "r" => Command::Recommend,
        "clear" => Command::Clear(parse_slot(&required(rest, "clear <slot>")?)?),
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{}', type 'help'", other)),
    };
    Ok(command)
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_slot(text: &str) -> Result<SlotKey, String> {
    text.parse::<SlotKey>().map_err(|e| e.to_string())
}
