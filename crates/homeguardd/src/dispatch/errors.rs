//! Error types for command dispatch.
//!
//! None of these end a session: each is logged and answered with an error
//! reply, and the session goes on to read its next frame.

use homeguard_protocol::FrameError;
use thiserror::Error;

use super::command::CommandName;

/// Reasons a frame could not be turned into a domain operation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The frame was blank, not JSON, or neither a string nor a list of
    /// booleans, integers and strings.
    #[error("malformed frame: {source}")]
    MalformedFrame {
        /// Decoding failure.
        #[source]
        source: FrameError,
    },

    /// A structured frame held an empty list.
    #[error("empty command list")]
    EmptyCommand,

    /// The first list element was not a string.
    #[error("command name must be a string, found {found}")]
    CommandNameType {
        /// Type of the offending element.
        found: &'static str,
    },

    /// The command name is not in the catalogue.
    #[error("unknown command: {command}")]
    UnknownCommand {
        /// Name as sent by the client.
        command: String,
    },

    /// The command received the wrong number of arguments.
    #[error("{command} expects {expected} argument(s), found {found}")]
    ArgumentCount {
        /// Command being decoded.
        command: CommandName,
        /// Required arity.
        expected: usize,
        /// Arguments received.
        found: usize,
    },

    /// An argument had the wrong type.
    #[error("{command} argument {position}: expected {expected}, found {found}")]
    ArgumentType {
        /// Command being decoded.
        command: CommandName,
        /// One-based argument position.
        position: usize,
        /// Required type.
        expected: &'static str,
        /// Type received.
        found: &'static str,
    },

    /// A legacy string did not split into exactly a device id and a command.
    #[error("legacy command must be '<deviceId> <COMMAND>', got {text:?}")]
    LegacyFormat {
        /// Text as sent by the client.
        text: String,
    },
}

impl DispatchError {
    /// Wraps a frame decoding failure.
    pub fn malformed(source: FrameError) -> Self {
        Self::MalformedFrame { source }
    }

    /// Non-string command name.
    pub const fn command_name_type(found: &'static str) -> Self {
        Self::CommandNameType { found }
    }

    /// Unknown command name.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Arity mismatch for `command`.
    pub const fn argument_count(command: CommandName, found: usize) -> Self {
        Self::ArgumentCount {
            command,
            expected: command.arity(),
            found,
        }
    }

    /// Type mismatch for an argument of `command`.
    pub const fn argument_type(
        command: CommandName,
        position: usize,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::ArgumentType {
            command,
            position,
            expected,
            found,
        }
    }

    /// Badly shaped legacy command.
    pub fn legacy_format(text: impl Into<String>) -> Self {
        Self::LegacyFormat { text: text.into() }
    }
}
