//! CliForge: a runtime that synthesizes a full-featured CLI from an
//! `OpenAPI` 3.x spec extended with `x-cli-*` vendor fields.
//!
//! [`spec`] parses and validates the spec into a [`spec::RuntimeSpec`];
//! [`engine`] turns that into a `clap` command tree and executes whichever
//! operation the user invoked; [`auth`], [`secret`], [`resilience`],
//! [`preflight`], [`confirmation`], [`deprecation`] and [`async_poll`] are
//! the supporting subsystems each operation's gates and request lifecycle
//! draw on.

pub mod async_poll;
pub mod atomic;
pub mod auth;
pub mod cli;
pub mod confirmation;
pub mod config;
pub mod constants;
pub mod deprecation;
pub mod duration;
pub mod engine;
pub mod error;
pub mod fs;
pub mod interactive;
pub mod invocation;
pub mod logging;
pub mod output;
pub mod preflight;
pub mod request_builder;
pub mod resilience;
pub mod secret;
pub mod spec;
pub mod utils;
