//! Command catalogue and argument decoding.
//!
//! A structured frame is a list whose first element names the command and
//! whose remaining elements are positional arguments. Arity and argument
//! types are fixed per command; anything else is rejected before the command
//! reaches a handler.

use homeguard_protocol::{AuthKind, WireValue};
use strum::{Display, EnumString, IntoStaticStr};

use super::errors::DispatchError;

/// Every command a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CommandName {
    /// `LOGIN username password`
    Login,
    /// `SIGNUP name email username password`
    Signup,
    /// `TOGGLE_LIGHT id on`
    ToggleLight,
    /// `SET_LIGHT_BRIGHTNESS id value`
    SetLightBrightness,
    /// `SET_LIGHT_COLOR id r g b`
    SetLightColor,
    /// `SET_LIGHT_TIMEOUT id minutes`
    SetLightTimeout,
    /// `SET_LIGHT_MOTION_LINK id on`
    SetLightMotionLink,
    /// `TOGGLE_LOCK id locked`
    ToggleLock,
    /// `SET_LOCK_DURATION id minutes`
    SetLockDuration,
    /// `LINK_LOCK_TO_ALARM lockId alarmId on`
    LinkLockToAlarm,
    /// `TOGGLE_CAMERA id on`
    ToggleCamera,
    /// `TOGGLE_CAMERA_RECORDING id on`
    ToggleCameraRecording,
    /// `TOGGLE_CAMERA_MOTION id on`
    ToggleCameraMotion,
    /// `REQUEST_CAMERA_FOOTAGE id range`
    RequestCameraFootage,
    /// `TOGGLE_ALARM id on`
    ToggleAlarm,
    /// `TOGGLE_ALARM_MOTION id on`
    ToggleAlarmMotion,
    /// `TOGGLE_ALARM_RECORD_ON_CAM alarmId camId on`
    ToggleAlarmRecordOnCam,
    /// `SET_MOTION_SENSITIVITY value`
    SetMotionSensitivity,
    /// `GET_LOGS`
    GetLogs,
}

impl CommandName {
    /// Number of arguments the command takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::GetLogs => 0,
            Self::SetMotionSensitivity => 1,
            Self::Login
            | Self::ToggleLight
            | Self::SetLightBrightness
            | Self::SetLightTimeout
            | Self::SetLightMotionLink
            | Self::ToggleLock
            | Self::SetLockDuration
            | Self::ToggleCamera
            | Self::ToggleCameraRecording
            | Self::ToggleCameraMotion
            | Self::RequestCameraFootage
            | Self::ToggleAlarm
            | Self::ToggleAlarmMotion => 2,
            Self::LinkLockToAlarm | Self::ToggleAlarmRecordOnCam => 3,
            Self::Signup | Self::SetLightColor => 4,
        }
    }

    /// Reply kind for authentication commands, which always answer with a
    /// three-element reply.
    #[must_use]
    pub const fn auth_kind(self) -> Option<AuthKind> {
        match self {
            Self::Login => Some(AuthKind::LoginResult),
            Self::Signup => Some(AuthKind::SignupResult),
            _ => None,
        }
    }

    /// Splits a structured frame into its command name and arguments.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty, the first element is not a string or
    /// the string names no known command.
    pub fn split(values: &[WireValue]) -> Result<(Self, &[WireValue]), DispatchError> {
        let (first, arguments) = values.split_first().ok_or(DispatchError::EmptyCommand)?;
        let WireValue::Text(name) = first else {
            return Err(DispatchError::command_name_type(first.type_name()));
        };
        let command = name
            .trim()
            .parse::<Self>()
            .map_err(|_| DispatchError::unknown_command(name))?;
        Ok((command, arguments))
    }
}

/// A fully decoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Authenticate.
    Login {
        /// Account name.
        username: String,
        /// Clear-text password.
        password: String,
    },
    /// Register a guest account.
    Signup {
        /// Display name.
        name: String,
        /// Contact address.
        email: String,
        /// Requested account name.
        username: String,
        /// Clear-text password.
        password: String,
    },
    /// Power a light.
    ToggleLight {
        /// Light number.
        light: i64,
        /// Target power state.
        on: bool,
    },
    /// Dim a light.
    SetLightBrightness {
        /// Light number.
        light: i64,
        /// Requested percentage, clamped later.
        value: i64,
    },
    /// Colour a light.
    SetLightColor {
        /// Light number.
        light: i64,
        /// Red channel, clamped later.
        red: i64,
        /// Green channel, clamped later.
        green: i64,
        /// Blue channel, clamped later.
        blue: i64,
    },
    /// Auto-off timeout.
    SetLightTimeout {
        /// Light number.
        light: i64,
        /// Timeout in minutes.
        minutes: i64,
    },
    /// Follow the motion sensor.
    SetLightMotionLink {
        /// Light number.
        light: i64,
        /// Link or unlink.
        on: bool,
    },
    /// Lock or unlock.
    ToggleLock {
        /// Lock number.
        lock: i64,
        /// Target bolt state.
        locked: bool,
    },
    /// Auto-lock duration.
    SetLockDuration {
        /// Lock number.
        lock: i64,
        /// Duration in minutes.
        minutes: i64,
    },
    /// Link a lock to an alarm.
    LinkLockToAlarm {
        /// Lock number.
        lock: i64,
        /// Alarm number.
        alarm: i64,
        /// Link or unlink.
        on: bool,
    },
    /// Power a camera.
    ToggleCamera {
        /// Camera number.
        camera: i64,
        /// Target power state.
        on: bool,
    },
    /// Start or stop recording.
    ToggleCameraRecording {
        /// Camera number.
        camera: i64,
        /// Recording state.
        on: bool,
    },
    /// Motion-triggered recording.
    ToggleCameraMotion {
        /// Camera number.
        camera: i64,
        /// Enabled state.
        on: bool,
    },
    /// Ask for recorded footage.
    RequestCameraFootage {
        /// Camera number.
        camera: i64,
        /// Free-form range label, e.g. `last hour`.
        range: String,
    },
    /// Arm or disarm.
    ToggleAlarm {
        /// Alarm number.
        alarm: i64,
        /// Armed state.
        on: bool,
    },
    /// Link an alarm to the motion sensor.
    ToggleAlarmMotion {
        /// Alarm number.
        alarm: i64,
        /// Link or unlink.
        on: bool,
    },
    /// Record on a camera when the alarm fires.
    ToggleAlarmRecordOnCam {
        /// Alarm number.
        alarm: i64,
        /// Camera number.
        camera: i64,
        /// Enabled state.
        on: bool,
    },
    /// Motion sensitivity for every light.
    SetMotionSensitivity {
        /// Requested percentage, clamped later.
        value: i64,
    },
    /// Fetch the activity log.
    GetLogs,
}

impl Command {
    /// Decodes the arguments of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ArgumentCount`] on an arity mismatch and
    /// [`DispatchError::ArgumentType`] when an argument has the wrong type.
    pub fn decode(name: CommandName, arguments: &[WireValue]) -> Result<Self, DispatchError> {
        if arguments.len() != name.arity() {
            return Err(DispatchError::argument_count(name, arguments.len()));
        }
        let args = Arguments {
            command: name,
            values: arguments,
        };
        let command = match name {
            CommandName::Login => Self::Login {
                username: args.text(0)?,
                password: args.text(1)?,
            },
            CommandName::Signup => Self::Signup {
                name: args.text(0)?,
                email: args.text(1)?,
                username: args.text(2)?,
                password: args.text(3)?,
            },
            CommandName::ToggleLight => Self::ToggleLight {
                light: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::SetLightBrightness => Self::SetLightBrightness {
                light: args.int(0)?,
                value: args.int(1)?,
            },
            CommandName::SetLightColor => Self::SetLightColor {
                light: args.int(0)?,
                red: args.int(1)?,
                green: args.int(2)?,
                blue: args.int(3)?,
            },
            CommandName::SetLightTimeout => Self::SetLightTimeout {
                light: args.int(0)?,
                minutes: args.int(1)?,
            },
            CommandName::SetLightMotionLink => Self::SetLightMotionLink {
                light: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::ToggleLock => Self::ToggleLock {
                lock: args.int(0)?,
                locked: args.flag(1)?,
            },
            CommandName::SetLockDuration => Self::SetLockDuration {
                lock: args.int(0)?,
                minutes: args.int(1)?,
            },
            CommandName::LinkLockToAlarm => Self::LinkLockToAlarm {
                lock: args.int(0)?,
                alarm: args.int(1)?,
                on: args.flag(2)?,
            },
            CommandName::ToggleCamera => Self::ToggleCamera {
                camera: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::ToggleCameraRecording => Self::ToggleCameraRecording {
                camera: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::ToggleCameraMotion => Self::ToggleCameraMotion {
                camera: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::RequestCameraFootage => Self::RequestCameraFootage {
                camera: args.int(0)?,
                range: args.text(1)?,
            },
            CommandName::ToggleAlarm => Self::ToggleAlarm {
                alarm: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::ToggleAlarmMotion => Self::ToggleAlarmMotion {
                alarm: args.int(0)?,
                on: args.flag(1)?,
            },
            CommandName::ToggleAlarmRecordOnCam => Self::ToggleAlarmRecordOnCam {
                alarm: args.int(0)?,
                camera: args.int(1)?,
                on: args.flag(2)?,
            },
            CommandName::SetMotionSensitivity => Self::SetMotionSensitivity {
                value: args.int(0)?,
            },
            CommandName::GetLogs => Self::GetLogs,
        };
        Ok(command)
    }

    /// Name of the command.
    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::Login { .. } => CommandName::Login,
            Self::Signup { .. } => CommandName::Signup,
            Self::ToggleLight { .. } => CommandName::ToggleLight,
            Self::SetLightBrightness { .. } => CommandName::SetLightBrightness,
            Self::SetLightColor { .. } => CommandName::SetLightColor,
            Self::SetLightTimeout { .. } => CommandName::SetLightTimeout,
            Self::SetLightMotionLink { .. } => CommandName::SetLightMotionLink,
            Self::ToggleLock { .. } => CommandName::ToggleLock,
            Self::SetLockDuration { .. } => CommandName::SetLockDuration,
            Self::LinkLockToAlarm { .. } => CommandName::LinkLockToAlarm,
            Self::ToggleCamera { .. } => CommandName::ToggleCamera,
            Self::ToggleCameraRecording { .. } => CommandName::ToggleCameraRecording,
            Self::ToggleCameraMotion { .. } => CommandName::ToggleCameraMotion,
            Self::RequestCameraFootage { .. } => CommandName::RequestCameraFootage,
            Self::ToggleAlarm { .. } => CommandName::ToggleAlarm,
            Self::ToggleAlarmMotion { .. } => CommandName::ToggleAlarmMotion,
            Self::ToggleAlarmRecordOnCam { .. } => CommandName::ToggleAlarmRecordOnCam,
            Self::SetMotionSensitivity { .. } => CommandName::SetMotionSensitivity,
            Self::GetLogs => CommandName::GetLogs,
        }
    }
}

/// Typed positional access to the arguments of one command.
struct Arguments<'a> {
    command: CommandName,
    values: &'a [WireValue],
}

impl Arguments<'_> {
    fn value(&self, position: usize) -> Result<&WireValue, DispatchError> {
        self.values
            .get(position)
            .ok_or_else(|| DispatchError::argument_count(self.command, self.values.len()))
    }

    fn int(&self, position: usize) -> Result<i64, DispatchError> {
        match self.value(position)? {
            WireValue::Int(value) => Ok(*value),
            other => Err(self.mismatch(position, "int", other)),
        }
    }

    fn flag(&self, position: usize) -> Result<bool, DispatchError> {
        match self.value(position)? {
            WireValue::Bool(value) => Ok(*value),
            other => Err(self.mismatch(position, "bool", other)),
        }
    }

    fn text(&self, position: usize) -> Result<String, DispatchError> {
        match self.value(position)? {
            WireValue::Text(value) => Ok(value.clone()),
            other => Err(self.mismatch(position, "string", other)),
        }
    }

    fn mismatch(&self, position: usize, expected: &'static str, found: &WireValue) -> DispatchError {
        DispatchError::argument_type(self.command, position + 1, expected, found.type_name())
    }
}
