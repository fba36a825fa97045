//! Wire format of the real-time channel.
//!
//! Every frame is a flat string split on [`DELIMITER`]. Field 0 is the
//! case-sensitive kind tag, the rest are positional arguments.

use crate::types::{CategoryId, SelectionId};

pub const DELIMITER: &str = "+++";
pub const PING: &str = "__ping__";
pub const PONG: &str = "__pong__";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{kind}: expected at least {expected} argument(s), got {got}")]
    MissingArgument {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{kind}: argument {value:?} is not a decimal integer")]
    InvalidNumber { kind: &'static str, value: String },
}

/// Typed classification of an inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Legacy free-form score update
    SetScore { args: Vec<String> },
    LockPredictions,
    UnlockPredictions,
    SetCurrentAward { category: Option<CategoryId> },
    SelectWinner {
        category: CategoryId,
        selection: SelectionId,
    },
    Ping,
    /// Anything else is relayed untouched
    PassThrough,
}

/// One inbound frame: the raw text kept verbatim for re-broadcast, plus its command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub raw: String,
    pub command: Command,
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let mut fields = raw.split(DELIMITER);
        let kind = fields.next().unwrap_or_default();
        let args: Vec<&str> = fields.collect();

        let command = match kind {
            "setScore" => Command::SetScore {
                args: args.iter().map(|a| a.to_string()).collect(),
            },
            "lockPredictions" => Command::LockPredictions,
            "unlockPredictions" => Command::UnlockPredictions,
            "setCurrentAward" => {
                let category = match args.first() {
                    Some(arg) if !arg.is_empty() => Some(parse_id("setCurrentAward", arg)?),
                    _ => None,
                };
                Command::SetCurrentAward { category }
            }
            "selectWinner" => {
                if args.len() < 2 {
                    return Err(ProtocolError::MissingArgument {
                        kind: "selectWinner",
                        expected: 2,
                        got: args.len(),
                    });
                }
                Command::SelectWinner {
                    category: parse_id("selectWinner", args[0])?,
                    selection: parse_id("selectWinner", args[1])?,
                }
            }
            PING => Command::Ping,
            _ => Command::PassThrough,
        };

        Ok(Self {
            raw: raw.to_string(),
            command,
        })
    }
}

fn parse_id(kind: &'static str, value: &str) -> Result<i64, ProtocolError> {
    value
        .parse::<i64>()
        .map_err(|_| ProtocolError::InvalidNumber {
            kind,
            value: value.to_string(),
        })
}
