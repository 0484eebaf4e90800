//! Harness that runs a seeded server on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use homeguard_config::{Config, ListenAddress};
use homeguard_protocol::{AuthStatus, Client, Reply, WireValue};

use crate::process::Services;
use crate::transport::Server;

/// A started server together with the collaborators behind it.
pub struct RunningHome {
    pub services: Services,
    pub server: Server,
    pub address: SocketAddr,
}

impl RunningHome {
    /// Seeds the demo installation and starts listening on loopback.
    pub fn start() -> Self {
        let services = Services::from_config(&Config::default());
        let server = Server::new(
            ListenAddress::new("127.0.0.1", 0),
            Arc::new(services.hooks()),
        );
        let address = server.start().expect("start server");
        Self {
            services,
            server,
            address,
        }
    }

    /// Opens a client with a bounded read timeout.
    pub fn connect(&self) -> Client {
        let client = Client::connect_timeout(self.address, Duration::from_secs(2)).expect("connect");
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("read timeout");
        client
    }
}

/// Sends `LOGIN` and reports whether it succeeded.
pub fn login(client: &mut Client, username: &str, password: &str) -> bool {
    let reply = client
        .command(
            "LOGIN",
            [WireValue::from(username), WireValue::from(password)],
        )
        .expect("login reply");
    match reply {
        Reply::Auth(auth) => auth.status() == AuthStatus::Success,
        other => panic!("expected auth reply, got {other:?}"),
    }
}
