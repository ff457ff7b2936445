//! HTTP request handlers for the fleet API

pub mod actions;
pub mod devices;
pub mod events;
