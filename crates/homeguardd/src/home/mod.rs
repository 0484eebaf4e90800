//! The simulated home and the device operations clients can invoke.
//!
//! [`DeviceFacade`] is the narrow surface the dispatcher talks to. Every
//! operation reports success as a boolean; the reason for a failure (unknown
//! device, wrong kind, unsupported command) goes to the activity log rather
//! than back to the client.

mod devices;
mod seed;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::activity::{ActivityEntry, ActivitySink};

pub use self::devices::{
    Alarm, Device, DeviceKind, DeviceState, LegacyCommand, MAX_PERCENT, MotionSensor, Rgb,
    SecurityCamera, SmartLight, SmartLock, clamp_channel, clamp_percent,
};
use self::devices::{armed_disarmed, enabled_disabled, locked_unlocked, on_off};
pub use self::seed::{DEMO_DEVICES, seed_demo_home};

pub(crate) const HOME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::home");

/// Device operations exposed to clients.
///
/// Ids are full device ids such as `light1`. Each method returns `true` when
/// the operation was applied.
pub trait DeviceFacade: Send + Sync {
    /// Applies a legacy text command such as `ON` or `UNLOCK`.
    fn control_device(&self, device_id: &str, command: &str) -> bool;

    /// Powers a light on or off.
    fn toggle_light(&self, light_id: &str, on: bool) -> bool;
    /// Sets a light's brightness, clamped to `0..=100`.
    fn set_light_brightness(&self, light_id: &str, value: i64) -> bool;
    /// Sets a light's colour, clamping each channel to `0..=255`.
    fn set_light_color(&self, light_id: &str, red: i64, green: i64, blue: i64) -> bool;
    /// Records an auto-off timeout. Has no effect on state.
    fn set_light_timeout(&self, light_id: &str, minutes: i64) -> bool;
    /// Links or unlinks a light and the motion sensor.
    fn set_light_motion_link(&self, light_id: &str, on: bool) -> bool;

    /// Engages or releases a lock.
    fn toggle_lock(&self, lock_id: &str, locked: bool) -> bool;
    /// Records an auto-lock duration. Has no effect on state.
    fn set_lock_duration(&self, lock_id: &str, minutes: i64) -> bool;
    /// Sets or clears a lock's alarm link. Both devices must exist.
    fn link_lock_to_alarm(&self, lock_id: &str, alarm_id: &str, on: bool) -> bool;

    /// Powers a camera on or off.
    fn toggle_camera(&self, camera_id: &str, on: bool) -> bool;
    /// Starts or stops recording.
    fn toggle_camera_recording(&self, camera_id: &str, on: bool) -> bool;
    /// Sets whether motion triggers recording.
    fn toggle_camera_motion(&self, camera_id: &str, on: bool) -> bool;
    /// Logs a footage request for the camera.
    fn request_camera_footage(&self, camera_id: &str, range: &str) -> bool;

    /// Arms or disarms an alarm.
    fn toggle_alarm(&self, alarm_id: &str, armed: bool) -> bool;
    /// Links or unlinks an alarm and the motion sensor.
    fn toggle_alarm_motion(&self, alarm_id: &str, on: bool) -> bool;
    /// Logs a record-on-alarm request. Both devices must exist.
    fn toggle_alarm_record_on_cam(&self, alarm_id: &str, camera_id: &str, on: bool) -> bool;

    /// Applies a motion sensitivity, clamped to `0..=100`, to every light.
    fn set_motion_sensitivity(&self, value: i64) -> bool;
}

/// In-memory home holding every registered device.
pub struct Home {
    devices: Mutex<BTreeMap<String, Device>>,
    activity: Arc<dyn ActivitySink>,
}

impl std::fmt::Debug for Home {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Home")
            .field("devices", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl Home {
    /// Creates an empty home that reports to `activity`.
    pub fn new(activity: Arc<dyn ActivitySink>) -> Self {
        Self {
            devices: Mutex::new(BTreeMap::new()),
            activity,
        }
    }

    /// Registers a device. Returns `false` if the id is already taken.
    pub fn add_device(&self, device: Device) -> bool {
        let entry = ActivityEntry::device(
            device.id(),
            device.name(),
            format!("New device added: {} ({})", device.name(), device.id()),
        );
        {
            let mut devices = self.lock();
            if devices.contains_key(device.id()) {
                debug!(target: HOME_TARGET, device_id = device.id(), "duplicate device id");
                return false;
            }
            devices.insert(device.id().to_owned(), device);
        }
        self.activity.record(entry);
        true
    }

    /// Unregisters a device and drops it from any motion links.
    pub fn remove_device(&self, device_id: &str) -> bool {
        let removed = {
            let mut devices = self.lock();
            let removed = devices.remove(device_id);
            if removed.is_some() {
                for sensor in devices.values_mut().filter_map(Device::motion_sensor_mut) {
                    sensor.linked_lights.remove(device_id);
                    sensor.linked_alarms.remove(device_id);
                }
            }
            removed
        };
        match removed {
            Some(device) => {
                self.activity.record(ActivityEntry::device(
                    device.id(),
                    device.name(),
                    format!("Device removed: {} ({})", device.name(), device.id()),
                ));
                true
            }
            None => {
                self.record_missing(device_id, "remove device");
                false
            }
        }
    }

    /// Snapshot of one device.
    #[must_use]
    pub fn device(&self, device_id: &str) -> Option<Device> {
        self.lock().get(device_id).cloned()
    }

    /// Snapshot of every device, ordered by id.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.lock().values().cloned().collect()
    }

    /// Reports motion on a sensor: linked lights switch on and linked alarms
    /// arm. Inactive sensors ignore motion.
    pub fn detect_motion(&self, sensor_id: &str) -> bool {
        let outcome = {
            let mut devices = self.lock();
            let Some(sensor) = devices.get_mut(sensor_id).and_then(Device::motion_sensor_mut)
            else {
                drop(devices);
                self.record_missing(sensor_id, "detect motion");
                return false;
            };
            if sensor.active {
                sensor.motion_detected = true;
                let lights = sensor.linked_lights.clone();
                let alarms = sensor.linked_alarms.clone();
                for id in &lights {
                    if let Some(light) = devices.get_mut(id).and_then(Device::light_mut) {
                        light.on = true;
                    }
                }
                for id in &alarms {
                    if let Some(alarm) = devices.get_mut(id).and_then(Device::alarm_mut) {
                        alarm.armed = true;
                    }
                }
                Some((lights.len(), alarms.len()))
            } else {
                None
            }
        };
        let name = self.name_of(sensor_id);
        match outcome {
            Some((lights, alarms)) => {
                self.activity.record(ActivityEntry::device(
                    sensor_id,
                    &name,
                    format!("Motion detected: {lights} light(s) on, {alarms} alarm(s) armed"),
                ));
                true
            }
            None => {
                self.activity.record(ActivityEntry::device(
                    sensor_id,
                    &name,
                    "Motion ignored: sensor inactive",
                ));
                false
            }
        }
    }

    /// Clears a sensor's motion flag.
    pub fn clear_motion(&self, sensor_id: &str) -> bool {
        self.update(sensor_id, Device::motion_sensor_mut, |sensor| {
            sensor.motion_detected = false;
            "Motion cleared".to_owned()
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Device>> {
        // Each mutation completes before the guard drops, so recover on poison.
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name_of(&self, device_id: &str) -> String {
        self.lock()
            .get(device_id)
            .map_or_else(|| device_id.to_owned(), |device| device.name().to_owned())
    }

    /// Applies `apply` to the kind-specific state selected by `select`.
    fn update<S>(
        &self,
        device_id: &str,
        select: fn(&mut Device) -> Option<&mut S>,
        apply: impl FnOnce(&mut S) -> String,
    ) -> bool {
        let mut devices = self.lock();
        let Some(device) = devices.get_mut(device_id) else {
            drop(devices);
            self.record_missing(device_id, "update");
            return false;
        };
        let name = device.name().to_owned();
        let kind = device.kind();
        let Some(state) = select(device) else {
            drop(devices);
            self.activity.record(ActivityEntry::device(
                device_id,
                &name,
                format!("Operation not supported by {kind} {device_id}"),
            ));
            return false;
        };
        let message = apply(state);
        drop(devices);
        self.activity
            .record(ActivityEntry::device(device_id, &name, message));
        true
    }

    /// Checks that a device of the given kind exists and logs `message`.
    fn log_only(&self, device_id: &str, kind: DeviceKind, message: String) -> bool {
        let name = {
            let devices = self.lock();
            match devices.get(device_id) {
                Some(device) if device.kind() == kind => device.name().to_owned(),
                _ => {
                    drop(devices);
                    self.record_missing(device_id, &kind.to_string());
                    return false;
                }
            }
        };
        self.activity
            .record(ActivityEntry::device(device_id, &name, message));
        true
    }

    fn record_missing(&self, device_id: &str, operation: &str) {
        debug!(target: HOME_TARGET, device_id, operation, "device not found");
        self.activity.record(
            ActivityEntry::device(
                device_id,
                crate::activity::NOT_APPLICABLE,
                format!("Device with ID {device_id} can't be found ({operation})"),
            ),
        );
    }

    /// Links or unlinks `device_id` with the first motion sensor.
    fn relink_motion(
        devices: &mut BTreeMap<String, Device>,
        device_id: &str,
        kind: DeviceKind,
        on: bool,
    ) {
        let Some(sensor) = devices.values_mut().find_map(Device::motion_sensor_mut) else {
            return;
        };
        let links = match kind {
            DeviceKind::Alarm => &mut sensor.linked_alarms,
            _ => &mut sensor.linked_lights,
        };
        if on {
            links.insert(device_id.to_owned());
        } else {
            links.remove(device_id);
        }
    }

    /// Sets a motion-link flag and mirrors it on the motion sensor. Fails
    /// without a motion sensor to link to.
    fn set_motion_link(&self, device_id: &str, kind: DeviceKind, on: bool) -> bool {
        let mut devices = self.lock();
        if !devices.values().any(|device| device.as_motion_sensor().is_some()) {
            drop(devices);
            self.record_missing(&DeviceKind::MotionSensor.device_id(1), "motion link");
            return false;
        }
        let Some(device) = devices.get_mut(device_id) else {
            drop(devices);
            self.record_missing(device_id, "motion link");
            return false;
        };
        let name = device.name().to_owned();
        let flag = match kind {
            DeviceKind::Light => device.light_mut().map(|light| &mut light.motion_linked),
            DeviceKind::Alarm => device.alarm_mut().map(|alarm| &mut alarm.motion_linked),
            _ => None,
        };
        let Some(flag) = flag else {
            drop(devices);
            self.record_missing(device_id, "motion link");
            return false;
        };
        let was_linked = std::mem::replace(flag, on);
        Self::relink_motion(&mut devices, device_id, kind, on);
        drop(devices);

        let message = if was_linked == on {
            format!("Motion link already {}", enabled_disabled(on))
        } else {
            format!("Motion link {}", enabled_disabled(on))
        };
        self.activity
            .record(ActivityEntry::device(device_id, &name, message));
        true
    }

    fn both_exist(&self, first: (&str, DeviceKind), second: (&str, DeviceKind)) -> bool {
        let devices = self.lock();
        let matches = |(id, kind): (&str, DeviceKind)| {
            devices.get(id).is_some_and(|device| device.kind() == kind)
        };
        let (first_ok, second_ok) = (matches(first), matches(second));
        drop(devices);
        if !first_ok {
            self.record_missing(first.0, &first.1.to_string());
        }
        if !second_ok {
            self.record_missing(second.0, &second.1.to_string());
        }
        first_ok && second_ok
    }
}

impl DeviceFacade for Home {
    fn control_device(&self, device_id: &str, command: &str) -> bool {
        let Ok(parsed) = command.parse::<LegacyCommand>() else {
            self.activity.record(ActivityEntry::device(
                device_id,
                &self.name_of(device_id),
                format!("Unsupported command '{command}'"),
            ));
            return false;
        };

        let outcome = {
            let mut devices = self.lock();
            devices
                .get_mut(device_id)
                .map(|device| (device.name().to_owned(), device.apply_legacy(parsed)))
        };
        match outcome {
            None => {
                self.record_missing(device_id, "control");
                false
            }
            Some((name, Some(state))) => {
                self.activity.record(ActivityEntry::device(
                    device_id,
                    &name,
                    format!("Command '{parsed}' executed: now {state}"),
                ));
                true
            }
            Some((name, None)) => {
                self.activity.record(ActivityEntry::device(
                    device_id,
                    &name,
                    format!("Failed to execute command '{parsed}' on {device_id}"),
                ));
                false
            }
        }
    }

    fn toggle_light(&self, light_id: &str, on: bool) -> bool {
        self.update(light_id, Device::light_mut, |light| {
            light.on = on;
            format!("Light turned {}", on_off(on))
        })
    }

    fn set_light_brightness(&self, light_id: &str, value: i64) -> bool {
        self.update(light_id, Device::light_mut, |light| {
            let stored = light.set_brightness(value);
            format!("Brightness set to {stored}%")
        })
    }

    fn set_light_color(&self, light_id: &str, red: i64, green: i64, blue: i64) -> bool {
        self.update(light_id, Device::light_mut, |light| {
            let stored = light.set_color(red, green, blue);
            format!("Colour set to {stored}")
        })
    }

    fn set_light_timeout(&self, light_id: &str, minutes: i64) -> bool {
        self.log_only(
            light_id,
            DeviceKind::Light,
            format!("Auto-off timeout set to {minutes} minute(s)"),
        )
    }

    fn set_light_motion_link(&self, light_id: &str, on: bool) -> bool {
        self.set_motion_link(light_id, DeviceKind::Light, on)
    }

    fn toggle_lock(&self, lock_id: &str, locked: bool) -> bool {
        self.update(lock_id, Device::lock_mut, |lock| {
            lock.locked = locked;
            format!("Lock {}", locked_unlocked(locked))
        })
    }

    fn set_lock_duration(&self, lock_id: &str, minutes: i64) -> bool {
        self.log_only(
            lock_id,
            DeviceKind::Lock,
            format!("Auto-lock duration set to {minutes} minute(s)"),
        )
    }

    fn link_lock_to_alarm(&self, lock_id: &str, alarm_id: &str, on: bool) -> bool {
        if !self.both_exist((lock_id, DeviceKind::Lock), (alarm_id, DeviceKind::Alarm)) {
            return false;
        }
        self.update(lock_id, Device::lock_mut, |lock| {
            lock.alarm_linked = on;
            format!("Alarm link to {alarm_id} {}", enabled_disabled(on))
        })
    }

    fn toggle_camera(&self, camera_id: &str, on: bool) -> bool {
        self.update(camera_id, Device::camera_mut, |camera| {
            camera.on = on;
            format!("Camera turned {}", on_off(on))
        })
    }

    fn toggle_camera_recording(&self, camera_id: &str, on: bool) -> bool {
        self.update(camera_id, Device::camera_mut, |camera| {
            camera.recording = on;
            if on { "Recording started" } else { "Recording stopped" }.to_owned()
        })
    }

    fn toggle_camera_motion(&self, camera_id: &str, on: bool) -> bool {
        self.update(camera_id, Device::camera_mut, |camera| {
            camera.motion_triggered = on;
            format!("Motion-triggered recording {}", enabled_disabled(on))
        })
    }

    fn request_camera_footage(&self, camera_id: &str, range: &str) -> bool {
        self.log_only(
            camera_id,
            DeviceKind::Camera,
            format!("Footage requested for range '{range}'"),
        )
    }

    fn toggle_alarm(&self, alarm_id: &str, armed: bool) -> bool {
        self.update(alarm_id, Device::alarm_mut, |alarm| {
            alarm.armed = armed;
            format!("Alarm {}", armed_disarmed(armed))
        })
    }

    fn toggle_alarm_motion(&self, alarm_id: &str, on: bool) -> bool {
        self.set_motion_link(alarm_id, DeviceKind::Alarm, on)
    }

    fn toggle_alarm_record_on_cam(&self, alarm_id: &str, camera_id: &str, on: bool) -> bool {
        if !self.both_exist((alarm_id, DeviceKind::Alarm), (camera_id, DeviceKind::Camera)) {
            return false;
        }
        self.log_only(
            alarm_id,
            DeviceKind::Alarm,
            format!("Record on {camera_id} when triggered {}", enabled_disabled(on)),
        )
    }

    fn set_motion_sensitivity(&self, value: i64) -> bool {
        let stored = clamp_percent(value);
        let updated = {
            let mut devices = self.lock();
            let mut updated = 0_usize;
            for light in devices.values_mut().filter_map(Device::light_mut) {
                light.motion_sensitivity = stored;
                updated += 1;
            }
            updated
        };
        self.activity.record(ActivityEntry::new(
            crate::activity::ActionType::Device,
            format!("Motion sensitivity set to {stored}% on {updated} light(s)"),
        ));
        true
    }
}
