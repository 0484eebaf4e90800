//! Demo installation loaded at startup.

use super::{Device, DeviceKind, Home};

/// Devices installed by [`seed_demo_home`] as `(id, name, kind)`.
pub const DEMO_DEVICES: [(&str, &str, DeviceKind); 5] = [
    ("light1", "Living Room Light", DeviceKind::Light),
    ("lock1", "Front Door Lock", DeviceKind::Lock),
    ("alarm1", "Home Alarm", DeviceKind::Alarm),
    ("camera1", "Door Camera", DeviceKind::Camera),
    ("motion1", "Hallway Motion Sensor", DeviceKind::MotionSensor),
];

/// Installs [`DEMO_DEVICES`]. Returns how many were newly added.
pub fn seed_demo_home(home: &Home) -> usize {
    DEMO_DEVICES
        .iter()
        .filter(|(id, name, kind)| home.add_device(Device::new(*id, *name, *kind)))
        .count()
}
