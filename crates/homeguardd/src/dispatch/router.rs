//! Routes decoded commands to the device facade and the auth gateway.

use std::sync::Arc;

use homeguard_protocol::{AuthKind, AuthReply, ClientMessage, Reply, WireValue};
use tracing::{debug, warn};

use crate::activity::{ActionType, ActivityEntry, ActivitySink};
use crate::home::{DeviceFacade, DeviceKind};

use super::auth::{AuthGateway, Signup};
use super::command::{Command, CommandName};
use super::errors::DispatchError;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Turns one client frame into exactly one reply.
#[derive(Clone)]
pub struct CommandRouter {
    devices: Arc<dyn DeviceFacade>,
    auth: AuthGateway,
    activity: Arc<dyn ActivitySink>,
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandRouter")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl CommandRouter {
    /// Builds a router over the given collaborators.
    pub fn new(
        devices: Arc<dyn DeviceFacade>,
        auth: AuthGateway,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        Self {
            devices,
            auth,
            activity,
        }
    }

    /// Decodes and executes one frame.
    pub fn dispatch(&self, frame: &[u8]) -> Reply {
        match ClientMessage::decode(frame) {
            Ok(message) => self.route(message),
            Err(error) => self.reject(&DispatchError::malformed(error)),
        }
    }

    /// Executes an already decoded message.
    pub fn route(&self, message: ClientMessage) -> Reply {
        match message {
            ClientMessage::Legacy(text) => self.route_legacy(&text),
            ClientMessage::Command(values) => self.route_command(&values),
        }
    }

    fn route_legacy(&self, text: &str) -> Reply {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [device_id, command] = tokens.as_slice() else {
            return self.reject(&DispatchError::legacy_format(text));
        };
        debug!(target: DISPATCH_TARGET, device_id, command, "dispatching legacy command");
        let applied = self.devices.control_device(device_id, command);
        if !applied {
            warn!(target: DISPATCH_TARGET, device_id, command, "legacy command failed");
        }
        Reply::from_success(applied)
    }

    fn route_command(&self, values: &[WireValue]) -> Reply {
        let (name, arguments) = match CommandName::split(values) {
            Ok(split) => split,
            Err(error) => return self.reject(&error),
        };
        debug!(
            target: DISPATCH_TARGET,
            command = %name,
            arguments = arguments.len(),
            "dispatching command"
        );
        match Command::decode(name, arguments) {
            Ok(command) => self.execute(command),
            Err(error) => {
                let reply = self.reject(&error);
                match name.auth_kind() {
                    Some(kind) => Reply::Auth(AuthReply::error(kind, error.to_string())),
                    None => reply,
                }
            }
        }
    }

    fn execute(&self, command: Command) -> Reply {
        let command_name = command.name();
        let devices = &self.devices;
        let applied = match command {
            Command::Login { username, password } => return self.login(&username, &password),
            Command::Signup {
                name,
                email,
                username,
                password,
            } => {
                return self.signup(Signup {
                    name: &name,
                    email: &email,
                    username: &username,
                    password: &password,
                });
            }
            Command::GetLogs => return Reply::Logs(self.activity.records()),
            Command::ToggleLight { light, on } => devices.toggle_light(&light_id(light), on),
            Command::SetLightBrightness { light, value } => {
                devices.set_light_brightness(&light_id(light), value)
            }
            Command::SetLightColor {
                light,
                red,
                green,
                blue,
            } => devices.set_light_color(&light_id(light), red, green, blue),
            Command::SetLightTimeout { light, minutes } => {
                devices.set_light_timeout(&light_id(light), minutes)
            }
            Command::SetLightMotionLink { light, on } => {
                devices.set_light_motion_link(&light_id(light), on)
            }
            Command::ToggleLock { lock, locked } => devices.toggle_lock(&lock_id(lock), locked),
            Command::SetLockDuration { lock, minutes } => {
                devices.set_lock_duration(&lock_id(lock), minutes)
            }
            Command::LinkLockToAlarm { lock, alarm, on } => {
                devices.link_lock_to_alarm(&lock_id(lock), &alarm_id(alarm), on)
            }
            Command::ToggleCamera { camera, on } => devices.toggle_camera(&camera_id(camera), on),
            Command::ToggleCameraRecording { camera, on } => {
                devices.toggle_camera_recording(&camera_id(camera), on)
            }
            Command::ToggleCameraMotion { camera, on } => {
                devices.toggle_camera_motion(&camera_id(camera), on)
            }
            Command::RequestCameraFootage { camera, range } => {
                devices.request_camera_footage(&camera_id(camera), &range)
            }
            Command::ToggleAlarm { alarm, on } => devices.toggle_alarm(&alarm_id(alarm), on),
            Command::ToggleAlarmMotion { alarm, on } => {
                devices.toggle_alarm_motion(&alarm_id(alarm), on)
            }
            Command::ToggleAlarmRecordOnCam { alarm, camera, on } => {
                devices.toggle_alarm_record_on_cam(&alarm_id(alarm), &camera_id(camera), on)
            }
            Command::SetMotionSensitivity { value } => devices.set_motion_sensitivity(value),
        };
        if !applied {
            warn!(target: DISPATCH_TARGET, command = %command_name, "command failed");
        }
        Reply::from_success(applied)
    }

    fn login(&self, username: &str, password: &str) -> Reply {
        let reply = match self.auth.login(username, password) {
            Some(account) => AuthReply::success(
                AuthKind::LoginResult,
                format!("Welcome, {}", account.name),
            ),
            None => AuthReply::error(AuthKind::LoginResult, "Invalid username or password"),
        };
        Reply::Auth(reply)
    }

    fn signup(&self, request: Signup<'_>) -> Reply {
        let reply = match self.auth.signup(request) {
            Ok(account) => AuthReply::success(
                AuthKind::SignupResult,
                format!("Account '{}' created", account.username),
            ),
            Err(error) => AuthReply::error(AuthKind::SignupResult, error.to_string()),
        };
        Reply::Auth(reply)
    }

    /// Logs a frame that could not be executed and builds the error reply.
    fn reject(&self, error: &DispatchError) -> Reply {
        warn!(target: DISPATCH_TARGET, %error, "rejected frame");
        self.activity.record(ActivityEntry::new(
            ActionType::Protocol,
            format!("Rejected client frame: {error}"),
        ));
        Reply::ERROR
    }
}

fn light_id(number: i64) -> String {
    DeviceKind::Light.device_id(number)
}

fn lock_id(number: i64) -> String {
    DeviceKind::Lock.device_id(number)
}

fn alarm_id(number: i64) -> String {
    DeviceKind::Alarm.device_id(number)
}

fn camera_id(number: i64) -> String {
    DeviceKind::Camera.device_id(number)
}

#[cfg(test)]
mod tests;
