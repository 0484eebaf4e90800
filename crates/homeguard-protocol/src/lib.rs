//! Wire protocol shared by the HomeGuard server and its clients.
//!
//! Every frame is one line of UTF-8 JSON terminated by `\n`. Clients send
//! either a structured command, a JSON array whose first element names the
//! command:
//!
//! ```json
//! ["SET_LIGHT_BRIGHTNESS", 1, 75]
//! ```
//!
//! or a legacy device command, a single JSON string:
//!
//! ```json
//! "light1 ON"
//! ```
//!
//! The server answers every frame with exactly one reply frame: `"OK"`,
//! `"ERROR"`, a three-element authentication result such as
//! `["loginResult","success","Welcome back, Admin User"]`, or the activity log
//! as an array of record objects.

mod client;
mod errors;
mod framing;
mod message;
mod reply;

pub use client::Client;
pub use errors::{ClientError, FrameError};
pub use framing::{FrameReader, FrameWriter, MAX_FRAME_BYTES};
pub use message::{ClientMessage, WireValue};
pub use reply::{ActivityRecord, AuthKind, AuthReply, AuthStatus, Reply, Status};
