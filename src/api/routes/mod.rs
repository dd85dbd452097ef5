//! API route modules.

pub mod process;
pub mod transcribe;
