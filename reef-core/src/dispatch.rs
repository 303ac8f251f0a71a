//! Command registration and dispatch.
//!
//! Protocol parsing produces a canonical command frame; a registry resolves and
//! executes the matching handler against the keyspace. Handlers run to completion
//! before the next command — the dispatcher is single-threaded by design of the
//! surrounding event loop.

use reef_wire::{ErrCode, Value};

#[path = "dispatch/parse_numbers.rs"]
mod parse_numbers;
#[path = "dispatch/state.rs"]
mod state;
#[path = "dispatch/handlers_string.rs"]
mod handlers_string;
#[path = "dispatch/handlers_zset.rs"]
mod handlers_zset;
#[path = "dispatch/registry.rs"]
mod registry;

pub use registry::CommandRegistry;
pub use state::{DispatchState, Entry, Keyspace, StoredValue};

/// Handler function signature used by command registry entries.
pub type CommandHandler = fn(&CommandFrame, &mut DispatchState) -> Value;

/// Canonical parsed command: name plus raw byte arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Command name exactly as it appeared on the wire.
    pub name: String,
    /// Raw argument payload, command name excluded.
    pub args: Vec<Vec<u8>>,
}

impl CommandFrame {
    /// Splits a request string list into name and arguments. `None` for an empty list.
    #[must_use]
    pub fn from_strings(mut strings: Vec<Vec<u8>>) -> Option<Self> {
        if strings.is_empty() {
            return None;
        }
        let args = strings.split_off(1);
        let name = String::from_utf8_lossy(&strings[0]).into_owned();
        Some(Self { name, args })
    }
}

/// Metadata and callback for one command table entry.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Canonical uppercase command name.
    pub name: &'static str,
    /// Exact argument count, command name excluded.
    pub arity: usize,
    /// Handler callback.
    pub handler: CommandHandler,
}

pub(crate) fn bad_arg(message: &str) -> Value {
    Value::Err(ErrCode::BadArg, message.to_owned())
}

pub(crate) fn not_found(message: &str) -> Value {
    Value::Err(ErrCode::NotFound, message.to_owned())
}
