//! qs evaluator.
//!
//! Source text mixes literal text with brace-delimited calls,
//! `{name:arg1:arg2>arg3}`.  Evaluating it copies the literal text and
//! replaces each call with its expansion, resolved against one flat,
//! mutable name table:
//!
//! - [`scan`] splits text into literal runs and calls,
//! - [`machine`] binds arguments, dispatches calls and owns the table,
//! - [`builtins`] is the standard library, most of which works by writing
//!   new call text and evaluating it.
//!
//! # Quick start
//!
//! ```rust
//! use qs::script::Machine;
//!
//! let mut m = Machine::with_stdlib();
//! let out = m.eval("{def:x:6}{clc:{v:x}:*:7}").unwrap();
//! assert_eq!(out, "42");
//! ```

pub mod builtins;
pub mod machine;
pub mod scan;

// Re-exports for convenience.
pub use machine::{Console, FileLoader, Machine, NativeFn};
pub use scan::Scanner;
