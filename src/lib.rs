//! Setpoint bridge pushes three bounded setpoints (target, minimum, maximum) to a microcontroller
//! through the character device exposed by the `rpi_uart` kernel driver.
//!
//! It is highly recommended to familiarize yourself with the following crates:
//! * [Tokio](https://docs.rs/tokio/latest/tokio)
//! * [Log](https://docs.rs/log/latest/log)
//!
//! The heart of the crate is the [bridge::Bridge]. It owns the handle to the device file and
//! the current setpoints. Callers (the `panel` binary, or any other front end) mutate the setpoints
//! and ask the bridge to execute; the bridge encodes `SP:<target>,SM:<maximum>,Sm:<minimum>`,
//! writes it with bounded retries, and reads back whatever the microcontroller answers.
//!
//! Failures never escape the bridge as errors. A missing device leaves the bridge disconnected
//! and every send simply tries to reopen it.

/// Constants and the runtime configuration loaded from toml.
pub mod config;
/// The three setpoints and the clamp rules that keep them ordered.
pub mod setpoint;
/// Encoding and decoding of the line based wire commands.
pub mod command;
/// The traits at the I/O seam and the device file implementation behind them.
pub mod link;
/// Lifecycle of the device handle: open, invalidate, close.
pub mod connection;
/// Bounded retry and reply timing.
pub mod retry;
/// Writes commands with retries and reads replies within a bounded window.
pub mod transport;
/// Csv history and state snapshot written after every execute.
pub mod journal;
/// The bridge object handed to callers.
pub mod bridge;
/// The operator console used by the `panel` binary.
pub mod console;
