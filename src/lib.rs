//! Pure Rust async implementation of the [Source RCON protocol](https://developer.valvesoftware.com/wiki/Source_RCON_Protocol),
//! plus a collector for the UDP log stream Source servers emit once pointed
//! at us with `logaddress_add`. Decoded log records are broadcast through a
//! small dispatcher to whichever handlers the service configuration names.
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod logstream;
pub mod packet;
pub mod parser;
pub mod util;
