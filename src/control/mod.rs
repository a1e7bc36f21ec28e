//! Pure control arithmetic: input scaling, servo pulse conversion and the
//! sweep position update.

pub mod mapping;
pub mod sweep;
