// FileMill - util/mod.rs
//
// Cross-cutting utilities: constants, error types, logging, memory sampling.

pub mod constants;
pub mod error;
pub mod logging;
pub mod memory;
