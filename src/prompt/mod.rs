//! Interactive command surface. One command per input line; parsing is pure
//! so the event loop stays in charge of all I/O.

use crate::topology::NodeAddress;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `join <net>` — assisted join through the rendezvous server
    Join { network: String },
    /// `direct join <net> <ip> <port>` — dial a known member directly
    DirectJoin {
        network: String,
        peer: NodeAddress,
    },
    /// `show topology`
    ShowTopology,
    /// `help`
    Help,
    /// `exit` / `quit`
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    Usage(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(cmd) => write!(f, "unknown command '{}'", cmd),
            CommandError::Usage(usage) => write!(f, "usage: {}", usage),
        }
    }
}

impl std::error::Error for CommandError {}

pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Err(CommandError::Empty),
        ["join", network] => Ok(Command::Join {
            network: network.to_string(),
        }),
        ["join", ..] => Err(CommandError::Usage("join <net>")),
        ["direct", "join", network, host, port] => {
            let port: u16 = port
                .parse()
                .map_err(|_| CommandError::Usage("direct join <net> <ip> <port>"))?;
            Ok(Command::DirectJoin {
                network: network.to_string(),
                peer: NodeAddress::new(*host, port),
            })
        }
        ["direct", ..] => Err(CommandError::Usage("direct join <net> <ip> <port>")),
        ["show", "topology"] => Ok(Command::ShowTopology),
        ["show", ..] => Err(CommandError::Usage("show topology")),
        ["help"] => Ok(Command::Help),
        ["exit"] | ["quit"] => Ok(Command::Exit),
        [first, ..] => Err(CommandError::Unknown(first.to_string())),
    }
}

pub fn help_text() -> String {
    [
        "Available commands:",
        "  join <net>                     Join <net> via the rendezvous server",
        "  direct join <net> <ip> <port>  Join <net> through a known member",
        "                                 (use 0.0.0.0 0 to found a new network)",
        "  show topology                  Print neighbors",
        "  help                           Show this help",
        "  exit                           Unregister and quit",
    ]
    .join("\n")
}
