//! Sensor subsystem: the real potentiometer input and the simulated
//! motor temperature / current model.

pub mod model;
pub mod potentiometer;

pub use model::PhysicalModel;
pub use potentiometer::Potentiometer;
