//! Port traits at the boundaries with external collaborators.

pub mod config_port;
pub mod data_port;
