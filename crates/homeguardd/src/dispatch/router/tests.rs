//! Router behaviour tests for command dispatch.

use homeguard_protocol::{AuthStatus, Status};
use rstest::{fixture, rstest};

use super::*;
use crate::accounts::{AccountStore, seed_demo_accounts};
use crate::activity::ActivityLog;
use crate::home::{Device, Home, Rgb, seed_demo_home};

struct Harness {
    router: CommandRouter,
    home: Arc<Home>,
    log: Arc<ActivityLog>,
}

impl Harness {
    fn send(&self, frame: &str) -> Reply {
        self.router.dispatch(frame.as_bytes())
    }

    fn light_on(&self) -> bool {
        self.home
            .device("light1")
            .and_then(|device| device.as_light().map(|light| light.on))
            .expect("light1 exists")
    }
}

#[fixture]
fn harness() -> Harness {
    let log = Arc::new(ActivityLog::new());
    let activity: Arc<dyn ActivitySink> = log.clone();
    let home = Arc::new(Home::new(Arc::clone(&activity)));
    seed_demo_home(&home);
    let accounts = Arc::new(AccountStore::new());
    seed_demo_accounts(accounts.as_ref());
    let auth = AuthGateway::new(accounts, Arc::clone(&activity));
    Harness {
        router: CommandRouter::new(home.clone(), auth, activity),
        home,
        log,
    }
}

#[rstest]
#[case(r#"["TOGGLE_LIGHT", 1, true]"#, true)]
#[case(r#"["toggle_light", 1, false]"#, false)]
fn toggle_light_reflects_request(harness: Harness, #[case] frame: &str, #[case] on: bool) {
    assert_eq!(harness.send(frame), Reply::OK);
    assert_eq!(harness.light_on(), on);
}

#[rstest]
#[case(-5, 0)]
#[case(150, 100)]
#[case(42, 42)]
fn brightness_is_clamped(harness: Harness, #[case] requested: i64, #[case] stored: u8) {
    let frame = format!(r#"["SET_LIGHT_BRIGHTNESS", 1, {requested}]"#);
    assert_eq!(harness.send(&frame), Reply::OK);
    let light = harness.home.device("light1").expect("light1");
    assert_eq!(light.as_light().map(|light| light.brightness), Some(stored));
}

#[rstest]
fn colour_is_clamped(harness: Harness) {
    assert_eq!(harness.send(r#"["SET_LIGHT_COLOR", 1, 300, -10, 128]"#), Reply::OK);
    let light = harness.home.device("light1").expect("light1");
    assert_eq!(light.as_light().map(|light| light.color), Some(Rgb::new(255, 0, 128)));
}

#[rstest]
#[case(r#"["TOGGLE_LOCK", 1, false]"#)]
#[case(r#"["SET_LOCK_DURATION", 1, 10]"#)]
#[case(r#"["LINK_LOCK_TO_ALARM", 1, 1, true]"#)]
#[case(r#"["TOGGLE_CAMERA", 1, true]"#)]
#[case(r#"["TOGGLE_CAMERA_RECORDING", 1, true]"#)]
#[case(r#"["TOGGLE_CAMERA_MOTION", 1, true]"#)]
#[case(r#"["REQUEST_CAMERA_FOOTAGE", 1, "last hour"]"#)]
#[case(r#"["TOGGLE_ALARM", 1, true]"#)]
#[case(r#"["TOGGLE_ALARM_MOTION", 1, true]"#)]
#[case(r#"["TOGGLE_ALARM_RECORD_ON_CAM", 1, 1, true]"#)]
#[case(r#"["SET_LIGHT_TIMEOUT", 1, 30]"#)]
#[case(r#"["SET_LIGHT_MOTION_LINK", 1, true]"#)]
#[case(r#"["SET_MOTION_SENSITIVITY", 75]"#)]
#[case(r#""light1 ON""#)]
#[case(r#""lock1 unlock""#)]
fn catalogue_commands_succeed_on_demo_home(harness: Harness, #[case] frame: &str) {
    assert_eq!(harness.send(frame), Reply::OK);
}

#[rstest]
#[case(r#"["TOGGLE_LIGHT", 9, true]"#)]
#[case(r#"["LINK_LOCK_TO_ALARM", 1, 4, true]"#)]
#[case(r#"["TOGGLE_ALARM_RECORD_ON_CAM", 1, 2, true]"#)]
#[case(r#""lock1 ON""#)]
#[case(r#""nothing9 OFF""#)]
fn domain_failures_reply_error(harness: Harness, #[case] frame: &str) {
    assert_eq!(harness.send(frame), Reply::ERROR);
}

#[rstest]
#[case(r#"["FLY_TO_MOON"]"#)]
#[case("[]")]
#[case("[1, 2]")]
#[case(r#"["TOGGLE_LIGHT", 1]"#)]
#[case(r#"["TOGGLE_LIGHT", "1", true]"#)]
#[case(r#"["GET_LOGS", 1]"#)]
#[case(r#"{"command": "GET_LOGS"}"#)]
#[case("not json")]
#[case("")]
#[case(r#""light1""#)]
#[case(r#""light1 ON now""#)]
fn protocol_errors_reply_error(harness: Harness, #[case] frame: &str) {
    assert_eq!(harness.send(frame), Reply::ERROR);
    let last = harness.log.records().pop().expect("rejection logged");
    assert_eq!(last.action_type, "Protocol");
}

#[rstest]
fn login_replies_with_three_elements(harness: Harness) {
    let Reply::Auth(reply) = harness.send(r#"["LOGIN", "admin1", "hash123"]"#) else {
        panic!("expected auth reply");
    };
    assert_eq!(reply.kind(), AuthKind::LoginResult);
    assert_eq!(reply.status(), AuthStatus::Success);

    let Reply::Auth(reply) = harness.send(r#"["LOGIN", "admin1", "wrong"]"#) else {
        panic!("expected auth reply");
    };
    assert_eq!(reply.status(), AuthStatus::Error);
    assert_eq!(reply.message(), "Invalid username or password");
}

#[rstest]
#[case(r#"["LOGIN", "admin1"]"#, AuthKind::LoginResult)]
#[case(r#"["login", 1, 2]"#, AuthKind::LoginResult)]
#[case(r#"["SIGNUP", "a", "b", "c"]"#, AuthKind::SignupResult)]
fn auth_decode_failures_still_reply_with_auth_shape(
    harness: Harness,
    #[case] frame: &str,
    #[case] kind: AuthKind,
) {
    let Reply::Auth(reply) = harness.send(frame) else {
        panic!("expected auth reply");
    };
    assert_eq!(reply.kind(), kind);
    assert_eq!(reply.status(), AuthStatus::Error);
}

#[rstest]
fn signup_then_login(harness: Harness) {
    let reply = harness.send(r#"["SIGNUP", "Ann", "ann@example.com", "ann", "pw"]"#);
    assert_eq!(
        reply,
        Reply::Auth(AuthReply::success(AuthKind::SignupResult, "Account 'ann' created"))
    );
    let reply = harness.send(r#"["SIGNUP", "Other", "o@example.com", "ann", "pw2"]"#);
    assert_eq!(
        reply,
        Reply::Auth(AuthReply::error(
            AuthKind::SignupResult,
            "username 'ann' is already taken"
        ))
    );
    let Reply::Auth(login) = harness.send(r#"["LOGIN", "ann", "pw"]"#) else {
        panic!("expected auth reply");
    };
    assert_eq!(login.status(), AuthStatus::Success);
}

#[rstest]
fn get_logs_returns_the_whole_log(harness: Harness) {
    assert_eq!(harness.send(r#"["TOGGLE_LIGHT", 1, true]"#), Reply::OK);
    let Reply::Logs(records) = harness.send(r#"["GET_LOGS"]"#) else {
        panic!("expected log payload");
    };
    assert_eq!(records, harness.log.records());
    assert!(records.iter().any(|record| record.message == "Light turned ON"));
    let ids: Vec<u64> = records.iter().map(|record| record.log_id).collect();
    assert_eq!(ids, (1..=ids.len() as u64).collect::<Vec<_>>());
}

#[rstest]
fn status_replies_use_wire_strings() {
    assert_eq!(Reply::OK, Reply::Status(Status::Ok));
}

#[rstest]
#[case(r#"["SET_LIGHT_MOTION_LINK", 1, true]"#)]
#[case(r#"["TOGGLE_ALARM_MOTION", 1, true]"#)]
fn motion_links_fail_without_a_sensor(#[case] frame: &str) {
    let log = Arc::new(ActivityLog::new());
    let activity: Arc<dyn ActivitySink> = log.clone();
    let home = Arc::new(Home::new(Arc::clone(&activity)));
    assert!(home.add_device(Device::new("light1", "Lamp", DeviceKind::Light)));
    assert!(home.add_device(Device::new("alarm1", "Siren", DeviceKind::Alarm)));
    let auth = AuthGateway::new(Arc::new(AccountStore::new()), Arc::clone(&activity));
    let router = CommandRouter::new(home, auth, activity);

    assert_eq!(router.dispatch(frame.as_bytes()), Reply::ERROR);
    let last = log.records().pop().expect("failure logged");
    assert_eq!(last.message, "Device with ID motion1 can't be found (motion link)");
}
