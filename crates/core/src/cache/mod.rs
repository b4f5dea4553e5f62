//! Cache backend ports

pub mod ports;
