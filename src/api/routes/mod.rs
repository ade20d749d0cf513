//! API route modules.

pub mod meetings;
pub mod stages;
pub mod upload;
