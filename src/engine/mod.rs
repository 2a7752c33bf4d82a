//! Dynamic CLI generation and request execution: the two halves of the
//! runtime that turn a parsed spec into a working command-line tool.

pub mod executor;
pub mod generator;
