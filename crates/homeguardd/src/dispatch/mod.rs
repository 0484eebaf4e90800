//! Command dispatch for client sessions.
//!
//! Frames arrive either as a legacy string or as a structured list:
//!
//! ```json
//! "light1 ON"
//! ["SET_LIGHT_BRIGHTNESS", 1, 80]
//! ```
//!
//! The dispatcher decodes the frame into a [`Command`], routes it to the
//! device facade or the auth gateway and answers with exactly one reply:
//! `"OK"`/`"ERROR"` for device commands, `[kind, status, message]` for
//! `LOGIN`/`SIGNUP` and the activity log for `GET_LOGS`.

mod auth;
mod command;
mod errors;
mod handler;
mod router;

pub use self::auth::{AuthGateway, Signup, SignupError};
pub use self::command::{Command, CommandName};
pub use self::errors::DispatchError;
pub use self::handler::HomeServer;
pub use self::router::CommandRouter;
