//! Device models.
//!
//! Each kind is a plain state holder. Setters that accept client-supplied
//! numbers clamp them into the device's range instead of rejecting them.

use std::collections::BTreeSet;
use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

/// Highest brightness, volume or sensitivity percentage.
pub const MAX_PERCENT: u8 = 100;

const DEFAULT_LEVEL: u8 = 50;

/// Device category. The lowercase name prefixes every device id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    /// Dimmable colour light.
    Light,
    /// Door lock.
    Lock,
    /// Siren.
    Alarm,
    /// Security camera.
    Camera,
    /// Presence detector.
    #[strum(serialize = "motion")]
    MotionSensor,
}

impl DeviceKind {
    /// Builds the id of the `number`th device of this kind, e.g. `light1`.
    #[must_use]
    pub fn device_id(self, number: i64) -> String {
        format!("{self}{number}")
    }
}

/// Clamps a client-supplied percentage to `0..=100`.
#[must_use]
pub fn clamp_percent(value: i64) -> u8 {
    u8::try_from(value.clamp(0, i64::from(MAX_PERCENT))).unwrap_or(MAX_PERCENT)
}

/// Clamps a client-supplied colour channel to `0..=255`.
#[must_use]
pub fn clamp_channel(value: i64) -> u8 {
    u8::try_from(value.clamp(0, i64::from(u8::MAX))).unwrap_or(u8::MAX)
}

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Full-intensity white.
    pub const WHITE: Self = Self::new(u8::MAX, u8::MAX, u8::MAX);

    /// Builds a colour from already valid channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Builds a colour, clamping each channel to `0..=255`.
    #[must_use]
    pub fn clamped(red: i64, green: i64, blue: i64) -> Self {
        Self::new(clamp_channel(red), clamp_channel(green), clamp_channel(blue))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Smart light state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartLight {
    /// Powered on.
    pub on: bool,
    /// Brightness percentage.
    pub brightness: u8,
    /// Current colour.
    pub color: Rgb,
    /// Follows the motion sensor.
    pub motion_linked: bool,
    /// Motion sensitivity percentage.
    pub motion_sensitivity: u8,
}

impl Default for SmartLight {
    fn default() -> Self {
        Self {
            on: false,
            brightness: MAX_PERCENT,
            color: Rgb::WHITE,
            motion_linked: false,
            motion_sensitivity: DEFAULT_LEVEL,
        }
    }
}

impl SmartLight {
    /// Sets the brightness, clamped to `0..=100`, and returns the stored value.
    pub fn set_brightness(&mut self, value: i64) -> u8 {
        self.brightness = clamp_percent(value);
        self.brightness
    }

    /// Sets the colour, clamping each channel, and returns the stored value.
    pub fn set_color(&mut self, red: i64, green: i64, blue: i64) -> Rgb {
        self.color = Rgb::clamped(red, green, blue);
        self.color
    }
}

/// Smart lock state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartLock {
    /// Bolt engaged.
    pub locked: bool,
    /// Triggers the linked alarm when forced.
    pub alarm_linked: bool,
}

impl Default for SmartLock {
    fn default() -> Self {
        Self {
            locked: true,
            alarm_linked: false,
        }
    }
}

/// Alarm state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    /// Armed and ready to sound.
    pub armed: bool,
    /// Siren volume percentage.
    pub volume: u8,
    /// Siren tone name.
    pub tone: String,
    /// Arms itself when the motion sensor fires.
    pub motion_linked: bool,
}

impl Default for Alarm {
    fn default() -> Self {
        Self {
            armed: false,
            volume: DEFAULT_LEVEL,
            tone: "default".to_owned(),
            motion_linked: false,
        }
    }
}

impl Alarm {
    /// Sets the volume, clamped to `0..=100`.
    pub fn set_volume(&mut self, value: i64) -> u8 {
        self.volume = clamp_percent(value);
        self.volume
    }
}

/// Security camera state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityCamera {
    /// Powered on.
    pub on: bool,
    /// Recording to storage.
    pub recording: bool,
    /// Starts recording when motion is detected.
    pub motion_triggered: bool,
}

/// Motion sensor state. Sensors report motion from installation until
/// switched off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionSensor {
    /// Reporting motion events.
    pub active: bool,
    /// Motion currently detected.
    pub motion_detected: bool,
    /// Lights switched on by motion.
    pub linked_lights: BTreeSet<String>,
    /// Alarms armed by motion.
    pub linked_alarms: BTreeSet<String>,
}

impl Default for MotionSensor {
    fn default() -> Self {
        Self {
            active: true,
            motion_detected: false,
            linked_lights: BTreeSet::new(),
            linked_alarms: BTreeSet::new(),
        }
    }
}

/// Kind-specific state of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// See [`SmartLight`].
    Light(SmartLight),
    /// See [`SmartLock`].
    Lock(SmartLock),
    /// See [`Alarm`].
    Alarm(Alarm),
    /// See [`SecurityCamera`].
    Camera(SecurityCamera),
    /// See [`MotionSensor`].
    MotionSensor(MotionSensor),
}

impl DeviceState {
    /// Default state for a device kind.
    #[must_use]
    pub fn for_kind(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Light => Self::Light(SmartLight::default()),
            DeviceKind::Lock => Self::Lock(SmartLock::default()),
            DeviceKind::Alarm => Self::Alarm(Alarm::default()),
            DeviceKind::Camera => Self::Camera(SecurityCamera::default()),
            DeviceKind::MotionSensor => Self::MotionSensor(MotionSensor::default()),
        }
    }

    /// Category of the state.
    #[must_use]
    pub const fn kind(&self) -> DeviceKind {
        match self {
            Self::Light(_) => DeviceKind::Light,
            Self::Lock(_) => DeviceKind::Lock,
            Self::Alarm(_) => DeviceKind::Alarm,
            Self::Camera(_) => DeviceKind::Camera,
            Self::MotionSensor(_) => DeviceKind::MotionSensor,
        }
    }
}

/// Text command accepted on the legacy `"<deviceId> <COMMAND>"` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LegacyCommand {
    /// Power on or arm.
    On,
    /// Power off or disarm.
    Off,
    /// Engage a lock.
    Lock,
    /// Release a lock.
    Unlock,
}

/// A registered device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: String,
    name: String,
    state: DeviceState,
}

impl Device {
    /// Builds a device of `kind` in its default state.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: DeviceState::for_kind(kind),
        }
    }

    /// Unique identifier such as `light1`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category of the device.
    #[must_use]
    pub const fn kind(&self) -> DeviceKind {
        self.state.kind()
    }

    /// Kind-specific state.
    #[must_use]
    pub const fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Light state, if this is a light.
    #[must_use]
    pub const fn as_light(&self) -> Option<&SmartLight> {
        match &self.state {
            DeviceState::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Lock state, if this is a lock.
    #[must_use]
    pub const fn as_lock(&self) -> Option<&SmartLock> {
        match &self.state {
            DeviceState::Lock(lock) => Some(lock),
            _ => None,
        }
    }

    /// Alarm state, if this is an alarm.
    #[must_use]
    pub const fn as_alarm(&self) -> Option<&Alarm> {
        match &self.state {
            DeviceState::Alarm(alarm) => Some(alarm),
            _ => None,
        }
    }

    /// Camera state, if this is a camera.
    #[must_use]
    pub const fn as_camera(&self) -> Option<&SecurityCamera> {
        match &self.state {
            DeviceState::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Motion sensor state, if this is a motion sensor.
    #[must_use]
    pub const fn as_motion_sensor(&self) -> Option<&MotionSensor> {
        match &self.state {
            DeviceState::MotionSensor(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub(crate) fn light_mut(&mut self) -> Option<&mut SmartLight> {
        match &mut self.state {
            DeviceState::Light(light) => Some(light),
            _ => None,
        }
    }

    pub(crate) fn lock_mut(&mut self) -> Option<&mut SmartLock> {
        match &mut self.state {
            DeviceState::Lock(lock) => Some(lock),
            _ => None,
        }
    }

    pub(crate) fn alarm_mut(&mut self) -> Option<&mut Alarm> {
        match &mut self.state {
            DeviceState::Alarm(alarm) => Some(alarm),
            _ => None,
        }
    }

    pub(crate) fn camera_mut(&mut self) -> Option<&mut SecurityCamera> {
        match &mut self.state {
            DeviceState::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub(crate) fn motion_sensor_mut(&mut self) -> Option<&mut MotionSensor> {
        match &mut self.state {
            DeviceState::MotionSensor(sensor) => Some(sensor),
            _ => None,
        }
    }

    /// Applies a legacy text command.
    ///
    /// Returns a description of the new state, or `None` when the command
    /// does not apply to this kind of device.
    pub fn apply_legacy(&mut self, command: LegacyCommand) -> Option<String> {
        let description = match (&mut self.state, command) {
            (DeviceState::Light(light), LegacyCommand::On | LegacyCommand::Off) => {
                light.on = command == LegacyCommand::On;
                on_off(light.on)
            }
            (DeviceState::Camera(camera), LegacyCommand::On | LegacyCommand::Off) => {
                camera.on = command == LegacyCommand::On;
                on_off(camera.on)
            }
            (DeviceState::MotionSensor(sensor), LegacyCommand::On | LegacyCommand::Off) => {
                sensor.active = command == LegacyCommand::On;
                on_off(sensor.active)
            }
            (DeviceState::Alarm(alarm), LegacyCommand::On | LegacyCommand::Off) => {
                alarm.armed = command == LegacyCommand::On;
                armed_disarmed(alarm.armed)
            }
            (DeviceState::Lock(lock), LegacyCommand::Lock | LegacyCommand::Unlock) => {
                lock.locked = command == LegacyCommand::Lock;
                locked_unlocked(lock.locked)
            }
            _ => return None,
        };
        Some(description.to_owned())
    }
}

pub(crate) const fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

pub(crate) const fn armed_disarmed(armed: bool) -> &'static str {
    if armed { "ARMED" } else { "DISARMED" }
}

pub(crate) const fn locked_unlocked(locked: bool) -> &'static str {
    if locked { "LOCKED" } else { "UNLOCKED" }
}

pub(crate) const fn enabled_disabled(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(-5, 0)]
    #[case(150, 100)]
    #[case(42, 42)]
    #[case(i64::MIN, 0)]
    fn brightness_is_clamped(#[case] requested: i64, #[case] stored: u8) {
        let mut light = SmartLight::default();
        assert_eq!(light.set_brightness(requested), stored);
        assert_eq!(light.brightness, stored);
    }

    #[rstest]
    fn colour_channels_are_clamped_independently() {
        let mut light = SmartLight::default();
        assert_eq!(light.set_color(300, -10, 128), Rgb::new(255, 0, 128));
    }

    #[rstest]
    fn defaults_match_a_fresh_installation() {
        let light = SmartLight::default();
        assert!(!light.on);
        assert_eq!(light.brightness, 100);
        assert_eq!(light.color, Rgb::WHITE);
        assert!(SmartLock::default().locked);
        let alarm = Alarm::default();
        assert!(!alarm.armed);
        assert_eq!(alarm.volume, 50);
        assert_eq!(alarm.tone, "default");
        let camera = SecurityCamera::default();
        assert!(!camera.on && !camera.recording);
    }

    #[rstest]
    #[case(DeviceKind::Light, 1, "light1")]
    #[case(DeviceKind::Lock, 2, "lock2")]
    #[case(DeviceKind::MotionSensor, 1, "motion1")]
    fn builds_device_ids(#[case] kind: DeviceKind, #[case] number: i64, #[case] expected: &str) {
        assert_eq!(kind.device_id(number), expected);
    }

    #[rstest]
    #[case("on", LegacyCommand::On)]
    #[case("UNLOCK", LegacyCommand::Unlock)]
    fn parses_legacy_commands_case_insensitively(
        #[case] text: &str,
        #[case] expected: LegacyCommand,
    ) {
        assert_eq!(text.parse::<LegacyCommand>().expect("parse"), expected);
    }

    #[rstest]
    fn legacy_lock_commands_only_apply_to_locks() {
        let mut light = Device::new("light1", "Lamp", DeviceKind::Light);
        assert!(light.apply_legacy(LegacyCommand::Lock).is_none());

        let mut lock = Device::new("lock1", "Door", DeviceKind::Lock);
        assert!(lock.apply_legacy(LegacyCommand::On).is_none());
        assert_eq!(lock.apply_legacy(LegacyCommand::Unlock).as_deref(), Some("UNLOCKED"));
        assert_eq!(lock.as_lock().map(|lock| lock.locked), Some(false));
    }

    #[rstest]
    fn legacy_on_arms_alarms() {
        let mut alarm = Device::new("alarm1", "Siren", DeviceKind::Alarm);
        assert_eq!(alarm.apply_legacy(LegacyCommand::On).as_deref(), Some("ARMED"));
        assert_eq!(alarm.as_alarm().map(|alarm| alarm.armed), Some(true));
    }
}
