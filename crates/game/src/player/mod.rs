mod controller;
mod registry;

pub use controller::PlayerController;
pub use registry::{ConnectionRegistry, EntityHandle, EntitySink, PlayerEntity};
