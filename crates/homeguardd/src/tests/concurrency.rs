//! Many clients against one server.

use std::thread;

use homeguard_protocol::{AuthStatus, Reply, WireValue};
use rstest::{fixture, rstest};

use super::support::{RunningHome, login};
use crate::activity::ActivitySink;
use crate::transport::wait_until;

#[fixture]
fn home() -> RunningHome {
    RunningHome::start()
}

#[rstest]
fn concurrent_logins_each_get_their_own_result(home: RunningHome) {
    let passwords: Vec<&str> = ["hash123", "wrong", "hash123"]
        .into_iter()
        .cycle()
        .take(16)
        .collect();
    let outcomes: Vec<bool> = thread::scope(|scope| {
        let workers: Vec<_> = passwords
            .iter()
            .map(|password| {
                let home = &home;
                scope.spawn(move || {
                    let mut client = home.connect();
                    login(&mut client, "admin1", password)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("login worker"))
            .collect()
    });
    let expected: Vec<bool> = passwords
        .iter()
        .map(|password| *password == "hash123")
        .collect();
    assert_eq!(outcomes, expected);

    let records = home.services.activity.records();
    let count = |message: &str| records.iter().filter(|record| record.message == message).count();
    let successes = expected.iter().filter(|succeeded| **succeeded).count();
    assert_eq!(count("User 'admin1' logged in as primary admin"), successes);
    assert_eq!(
        count("Failed login for user 'admin1': wrong password"),
        passwords.len() - successes
    );
}

#[rstest]
fn racing_signups_register_one_account(home: RunningHome) {
    let winners = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|index| {
                let home = &home;
                scope.spawn(move || {
                    let mut client = home.connect();
                    let reply = client
                        .command(
                            "SIGNUP",
                            [
                                WireValue::from("Racer"),
                                WireValue::from("racer@example.com"),
                                WireValue::from("racer"),
                                WireValue::from(format!("pw{index}")),
                            ],
                        )
                        .expect("signup reply");
                    matches!(reply, Reply::Auth(auth) if auth.status() == AuthStatus::Success)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("signup worker"))
            .filter(|won| *won)
            .count()
    });
    assert_eq!(winners, 1);
    assert_eq!(home.services.accounts.len(), 3);
}

#[rstest]
fn pipelined_frames_are_answered_in_order(home: RunningHome) {
    let mut client = home.connect();
    let frames: [&[u8]; 4] = [
        br#"["TOGGLE_LIGHT", 1, true]"#,
        br#"["FLY_TO_MOON"]"#,
        br#""lock1 UNLOCK""#,
        br#"["GET_LOGS"]"#,
    ];
    for frame in frames {
        client.send_raw(frame).expect("send frame");
    }
    assert_eq!(client.read_reply().expect("first"), Reply::OK);
    assert_eq!(client.read_reply().expect("second"), Reply::ERROR);
    assert_eq!(client.read_reply().expect("third"), Reply::OK);
    assert!(matches!(client.read_reply().expect("fourth"), Reply::Logs(_)));
}

#[rstest]
fn log_ids_stay_consecutive_under_load(home: RunningHome) {
    thread::scope(|scope| {
        for light in 1_i64..=4 {
            let home = &home;
            scope.spawn(move || {
                let mut client = home.connect();
                let mut on = true;
                for _ in 0..10 {
                    let reply = client
                        .command(
                            "TOGGLE_LIGHT",
                            [WireValue::from(light), WireValue::from(on)],
                        )
                        .expect("toggle reply");
                    assert!(matches!(reply, Reply::Status(_)));
                    on = !on;
                }
            });
        }
    });
    let Reply::Logs(records) = home
        .connect()
        .command("GET_LOGS", [])
        .expect("logs reply")
    else {
        panic!("expected log payload");
    };
    let ids: Vec<u64> = records.iter().map(|record| record.log_id).collect();
    let expected: Vec<u64> = (1..=ids.len() as u64).collect();
    assert_eq!(ids, expected);
}

#[rstest]
fn closing_the_server_disconnects_every_client(home: RunningHome) {
    let mut clients: Vec<_> = (0..3).map(|_| home.connect()).collect();
    for client in &mut clients {
        assert!(login(client, "guest1", "hash456"));
    }
    assert_eq!(home.server.session_count(), 3);

    home.server.close().expect("close server");

    assert!(home.server.registry().is_empty());
    for client in &mut clients {
        assert!(client.read_reply().is_err(), "session should be closed");
    }
    assert!(wait_until(|| home.services.activity.records().iter().any(
        |record| record.message == "Server stopped"
    )));
}
