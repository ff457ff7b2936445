//! Data models shared by the registry, the simulator and the API layer

pub mod action;
pub mod device;
pub mod event;

pub use action::*;
pub use device::*;
pub use event::*;
