//! Client-to-server message shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::FrameError;
use super::framing::trim_ascii_whitespace;

/// One positional value inside a structured command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Int(i64),
    /// JSON string.
    Text(String),
}

impl WireValue {
    /// Name of the value's type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "string",
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Int(value) => write!(formatter, "{value}"),
            Self::Text(value) => write!(formatter, "{value:?}"),
        }
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// Legacy `"<deviceId> <COMMAND>"` string.
    Legacy(String),
    /// Structured `[NAME, args...]` list.
    Command(Vec<WireValue>),
}

impl ClientMessage {
    /// Builds a structured command from a name and its arguments.
    pub fn command<I, V>(name: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<WireValue>,
    {
        let mut values = vec![WireValue::from(name)];
        values.extend(arguments.into_iter().map(Into::into));
        Self::Command(values)
    }

    /// Builds a legacy device command such as `light1 ON`.
    pub fn legacy(text: impl Into<String>) -> Self {
        Self::Legacy(text.into())
    }

    /// Decodes a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Empty`] for blank frames and
    /// [`FrameError::Decode`] when the JSON is invalid or is neither a string
    /// nor a list of booleans, integers and strings.
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        let trimmed = trim_ascii_whitespace(frame);
        if trimmed.is_empty() {
            return Err(FrameError::Empty);
        }
        serde_json::from_slice(trimmed).map_err(FrameError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn decodes_structured_commands() {
        let message = ClientMessage::decode(br#"["toggle_light", 1, true]"#).expect("decode");
        assert_eq!(
            message,
            ClientMessage::Command(vec![
                WireValue::Text("toggle_light".to_owned()),
                WireValue::Int(1),
                WireValue::Bool(true),
            ])
        );
    }

    #[rstest]
    fn decodes_legacy_strings() {
        let message = ClientMessage::decode(b"\"light1 ON\"\r").expect("decode");
        assert_eq!(message, ClientMessage::legacy("light1 ON"));
    }

    #[rstest]
    #[case(&b"{\"command\":\"GET_LOGS\"}"[..])]
    #[case(&b"[\"SET_LIGHT_BRIGHTNESS\", 1, 4.5]"[..])]
    #[case(&b"not json"[..])]
    fn rejects_other_shapes(#[case] frame: &[u8]) {
        let error = ClientMessage::decode(frame).expect_err("decode should fail");
        assert!(matches!(error, FrameError::Decode(_)));
        assert!(!error.is_fatal());
    }

    #[rstest]
    fn rejects_blank_frames() {
        assert!(matches!(ClientMessage::decode(b"  "), Err(FrameError::Empty)));
    }

    #[rstest]
    fn command_builder_prefixes_the_name() {
        let message = ClientMessage::command("TOGGLE_LOCK", [WireValue::Int(2), WireValue::Bool(false)]);
        let encoded = serde_json::to_string(&message).expect("encode");
        assert_eq!(encoded, r#"["TOGGLE_LOCK",2,false]"#);
    }
}
