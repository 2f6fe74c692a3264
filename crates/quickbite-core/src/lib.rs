//! quickbite-core: order status progression, order board and console adapter.

pub mod config;
pub mod errors;

pub mod application;

pub use quickbite_types::{domain, ports};

pub mod inbound; // console adapter (command parsing + rendering)
pub mod outbound; // notifier and in-memory gateway
