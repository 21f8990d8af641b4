//! The name table shared by every evaluation.
//!
//! There is no scoping: one flat table holds builtins, macros, plain
//! variables and the `<callee>-N` argument bindings that every call leaves
//! behind.

use std::collections::HashMap;
use std::fmt;

use crate::script::NativeFn;

/// A name's current payload.
#[derive(Clone)]
pub enum Binding {
    /// Macro body or plain variable value.
    Text(String),
    /// A registered builtin.
    Native(NativeFn),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Binding::Native(_) => f.write_str("Native(..)"),
        }
    }
}

impl From<&str> for Binding {
    fn from(s: &str) -> Self {
        Binding::Text(s.to_owned())
    }
}

impl From<String> for Binding {
    fn from(s: String) -> Self {
        Binding::Text(s)
    }
}

impl From<NativeFn> for Binding {
    fn from(f: NativeFn) -> Self {
        Binding::Native(f)
    }
}

/// Flat, mutable name → [`Binding`] table.
#[derive(Debug, Default)]
pub struct Env {
    bindings: HashMap<String, Binding>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the binding for `name`.
    ///
    /// Defining empty text removes the binding instead of storing `""`.
    pub fn define(&mut self, name: impl Into<String>, payload: impl Into<Binding>) {
        let name = name.into();
        match payload.into() {
            Binding::Text(text) if text.is_empty() => {
                self.bindings.remove(&name);
            }
            payload => {
                self.bindings.insert(name, payload);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Text payload of `name`; `None` when unset or bound to a builtin.
    pub fn lookup_text(&self, name: &str) -> Option<&str> {
        match self.bindings.get(name)? {
            Binding::Text(s) => Some(s),
            Binding::Native(_) => None,
        }
    }

    pub fn lookup_native(&self, name: &str) -> Option<NativeFn> {
        match self.bindings.get(name)? {
            Binding::Native(f) => Some(*f),
            Binding::Text(_) => None,
        }
    }

    /// Text payload of `name` read as an integer; see [`parse_int`].
    pub fn lookup_int(&self, name: &str) -> i64 {
        self.lookup_text(name).map_or(0, parse_int)
    }

    /// `base-index`, the element convention used for call arguments.
    pub fn array_lookup(&self, base: &str, index: usize) -> Option<&str> {
        self.lookup_text(&element_name(base, index))
    }

    pub fn array_lookup_int(&self, base: &str, index: usize) -> i64 {
        self.lookup_int(&element_name(base, index))
    }

    /// `base-len` as an integer.
    pub fn array_len(&self, base: &str) -> i64 {
        self.lookup_int(&format!("{base}-len"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// `base-index`.
pub fn element_name(base: &str, index: usize) -> String {
    format!("{base}-{index}")
}

/// Permissive decimal parse: `atoi` semantics over `i64`.
///
/// Leading whitespace and one sign are accepted, then as many digits as
/// follow.  Overflow saturates.  Anything unparsable is `0`.
pub fn parse_int(s: &str) -> i64 {
    let s = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut n: i64 = 0;
    for d in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(d - b'0');
        n = if negative {
            n.saturating_mul(10).saturating_sub(d)
        } else {
            n.saturating_mul(10).saturating_add(d)
        };
    }
    n
}

// ── Tests ─────────────────────────────────────────────────────────────────────
