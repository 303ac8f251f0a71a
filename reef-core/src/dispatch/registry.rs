use reef_wire::{ErrCode, Value};

use super::handlers_string::{handle_del, handle_get, handle_keys, handle_set};
use super::handlers_zset::{
    handle_zadd, handle_zquery, handle_zrank, handle_zrem, handle_zscore,
};
use super::state::DispatchState;
use super::{CommandFrame, CommandSpec};
use crate::containers::HotMap as HashMap;

/// Runtime command registry.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    entries: HashMap<String, CommandSpec>,
}

impl CommandRegistry {
    /// Builds an empty command registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Builds a registry preloaded with every served command.
    #[must_use]
    pub fn with_builtin_commands() -> Self {
        let mut registry = Self::new();
        registry.register_string_commands();
        registry.register_zset_commands();
        registry
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register_string_commands(&mut self) {
        self.register(CommandSpec {
            name: "GET",
            arity: 1,
            handler: handle_get,
        });
        self.register(CommandSpec {
            name: "SET",
            arity: 2,
            handler: handle_set,
        });
        self.register(CommandSpec {
            name: "DEL",
            arity: 1,
            handler: handle_del,
        });
        self.register(CommandSpec {
            name: "KEYS",
            arity: 0,
            handler: handle_keys,
        });
    }

    fn register_zset_commands(&mut self) {
        self.register(CommandSpec {
            name: "ZADD",
            arity: 3,
            handler: handle_zadd,
        });
        self.register(CommandSpec {
            name: "ZREM",
            arity: 2,
            handler: handle_zrem,
        });
        self.register(CommandSpec {
            name: "ZRANK",
            arity: 2,
            handler: handle_zrank,
        });
        self.register(CommandSpec {
            name: "ZSCORE",
            arity: 2,
            handler: handle_zscore,
        });
        self.register(CommandSpec {
            name: "ZQUERY",
            arity: 5,
            handler: handle_zquery,
        });
    }

    /// Registers or replaces one command in the table.
    pub fn register(&mut self, spec: CommandSpec) {
        self.entries.insert(spec.name.to_owned(), spec);
    }

    /// Validates command existence and arity without executing handler logic.
    ///
    /// # Errors
    ///
    /// Returns user-facing error text for unknown command names or invalid argument
    /// count.
    pub fn validate_frame(&self, frame: &CommandFrame) -> Result<(), String> {
        let command_name = frame.name.to_ascii_uppercase();
        let Some(spec) = self.entries.get(&command_name) else {
            return Err(format!("unknown command '{}'", frame.name));
        };
        if frame.args.len() != spec.arity {
            return Err(format!(
                "wrong number of arguments for '{}' command",
                spec.name
            ));
        }
        Ok(())
    }

    /// Dispatches one request string list to its registered handler.
    #[must_use]
    pub fn dispatch_request(&self, strings: Vec<Vec<u8>>, state: &mut DispatchState) -> Value {
        let Some(frame) = CommandFrame::from_strings(strings) else {
            return Value::Err(ErrCode::Unknown, "empty command".to_owned());
        };
        self.dispatch(&frame, state)
    }

    /// Dispatches one canonical command frame to its registered handler.
    #[must_use]
    pub fn dispatch(&self, frame: &CommandFrame, state: &mut DispatchState) -> Value {
        if let Err(message) = self.validate_frame(frame) {
            return Value::Err(ErrCode::Unknown, message);
        }
        let command_name = frame.name.to_ascii_uppercase();
        let Some(spec) = self.entries.get(&command_name) else {
            return Value::Err(ErrCode::Unknown, format!("unknown command '{}'", frame.name));
        };
        (spec.handler)(frame, state)
    }
}
