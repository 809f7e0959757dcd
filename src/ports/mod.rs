//! Port traits: the seams between domain logic and files/configuration.

pub mod config_port;
pub mod data_port;
pub mod grid_port;
