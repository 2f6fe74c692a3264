//! quickbite-types: restaurant order domain and the ports the core talks through.

pub mod domain;
pub mod ports;
