//! End-to-end suites that drive the server over TCP.

mod concurrency;
mod support;
