//! `sentra-kernel` — contract crate for the Sentra orchestration gateway.
//!
//! This crate defines the *trait interfaces and data model* shared by the
//! gateway runtime and any plugin crates.  No network I/O happens here;
//! concrete implementations live in `sentra-gateway`.

pub mod orchestration;
