//! qs: a brace-call macro language.
//!
//! The library exposes the evaluator ([`script::Machine`]) together with its
//! name table ([`env::Env`]) and output buffer ([`outbuf::OutBuf`]); the
//! `qs` binary is a thin front end over it.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod outbuf;
pub mod script;

pub use error::{Error, Result};
