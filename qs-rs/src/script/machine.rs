//! The qs virtual machine.
//!
//! A [`Machine`] owns the [`Env`] and evaluates source text against it.
//! Evaluation is a single pass over the text (see [`scan`](super::scan)):
//! literal runs are copied to the output, and each complete call
//!
//! 1. evaluates its eager arguments (each through a fresh, recursive
//!    [`Machine::eval`]),
//! 2. binds the arguments as `<callee>-0 … <callee>-(n-1)` plus
//!    `<callee>-len`,
//! 3. resolves the callee: a builtin is invoked through the native call
//!    protocol, a text binding is evaluated as a macro body, and an unbound
//!    name expands to nothing.
//!
//! Argument bindings live in the same flat table as everything else, so
//! they stay visible after the call returns and are overwritten by the next
//! call to the same name.
//!
//! Recursion depth follows call nesting.  Without a limit a self-calling
//! macro overflows the native stack; [`Machine::set_max_depth`] turns that
//! into [`Error::RecursionLimitExceeded`].

use std::io::Write;
use std::sync::Arc;

use crate::env::{Binding, Env};
use crate::error::{Error, Result};
use crate::outbuf::OutBuf;
use super::scan::{Piece, RawCall, Scanner};

// ── Native call protocol ──────────────────────────────────────────────────────

/// A builtin operation.
///
/// Invoked after its call's arguments are bound.  It reads them with
/// [`Machine::arg`] and friends (which resolve against the name it was
/// called under), appends results to `out`, and may re-enter
/// [`Machine::eval`].  Arguments are raw text unless the call site passed
/// them with `:`.
pub type NativeFn = fn(&mut Machine, &mut OutBuf) -> Result<()>;

// ── File loader callback ──────────────────────────────────────────────────────

/// Resolves a path to file contents.  Used by `use` and `io:r`.
pub type FileLoader = Arc<dyn Fn(&str) -> std::io::Result<String> + Send + Sync>;

fn fs_loader() -> FileLoader {
    Arc::new(|path: &str| std::fs::read_to_string(path))
}

// ── Console ───────────────────────────────────────────────────────────────────

/// Destination of `io:p`.
#[derive(Debug, Default)]
pub enum Console {
    /// Write straight to the process's stdout.
    #[default]
    Stdout,
    /// Accumulate in memory; drained with [`Machine::take_console`].
    Captured(String),
}

// ── Call frame ────────────────────────────────────────────────────────────────

/// The builtin currently being serviced.
#[derive(Debug)]
struct Frame {
    callee: String,
}

// ── Machine ───────────────────────────────────────────────────────────────────

/// Interpreter state: the name table plus evaluation context.
pub struct Machine {
    env: Env,
    /// Active builtin calls, innermost last.
    frames: Vec<Frame>,
    depth: usize,
    max_depth: Option<usize>,
    console: Console,
    file_loader: FileLoader,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// A machine with an empty name table.
    ///
    /// Use [`Machine::with_stdlib`] for one with the builtins registered.
    pub fn new() -> Self {
        Machine {
            env: Env::new(),
            frames: Vec::new(),
            depth: 0,
            max_depth: None,
            console: Console::default(),
            file_loader: fs_loader(),
        }
    }

    /// A machine with the standard builtins installed.
    pub fn with_stdlib() -> Self {
        let mut m = Self::new();
        super::builtins::install(&mut m);
        m
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    /// Bind `name` to text or a builtin; empty text unbinds it.
    pub fn define(&mut self, name: impl Into<String>, payload: impl Into<Binding>) {
        self.env.define(name, payload);
    }

    /// Limit call nesting; `None` disables the guard.
    pub fn set_max_depth(&mut self, limit: Option<usize>) {
        self.max_depth = limit;
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Route `io:p` output to an in-memory buffer.
    pub fn capture_console(&mut self) {
        self.console = Console::Captured(String::new());
    }

    /// Drain captured console output.  Empty when not capturing.
    pub fn take_console(&mut self) -> String {
        match &mut self.console {
            Console::Captured(s) => std::mem::take(s),
            Console::Stdout => String::new(),
        }
    }

    /// Print to the console without a trailing newline.
    pub fn print(&mut self, text: &str) {
        match &mut self.console {
            Console::Captured(s) => s.push_str(text),
            Console::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
                    tracing::warn!(error = %e, "console write failed");
                }
            }
        }
    }

    pub fn set_file_loader(&mut self, loader: FileLoader) {
        self.file_loader = loader;
    }

    /// Read a file through the configured loader.
    pub fn load_file(&self, path: &str) -> std::io::Result<String> {
        (self.file_loader)(path)
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Expand `expr`, returning the output text.
    pub fn eval(&mut self, expr: &str) -> Result<String> {
        let mut out = OutBuf::new();
        self.eval_into(expr, &mut out)?;
        out.finalize()
    }

    /// Expand `expr`, appending the output to `out`.
    pub fn eval_into(&mut self, expr: &str, out: &mut OutBuf) -> Result<()> {
        if let Some(limit) = self.max_depth {
            if self.depth >= limit {
                return Err(Error::RecursionLimitExceeded { limit });
            }
        }
        self.depth += 1;
        let r = self.expand(expr, out);
        self.depth -= 1;
        r
    }

    fn expand(&mut self, expr: &str, out: &mut OutBuf) -> Result<()> {
        for piece in Scanner::new(expr) {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Call(call) => self.call(&call, out)?,
            }
        }
        Ok(())
    }

    /// Evaluate arguments, bind them, then dispatch.
    fn call(&mut self, call: &RawCall<'_>, out: &mut OutBuf) -> Result<()> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(if arg.eager { self.eval(arg.text)? } else { arg.text.to_owned() });
        }
        let Some((name, params)) = args.split_first() else {
            return Ok(());
        };

        for (i, param) in params.iter().enumerate() {
            self.env.define(format!("{name}-{i}"), param.as_str());
        }
        self.env.define(format!("{name}-len"), params.len().to_string());

        self.dispatch(name, params.len(), out)
    }

    fn dispatch(&mut self, name: &str, argc: usize, out: &mut OutBuf) -> Result<()> {
        match self.env.get(name) {
            Some(Binding::Native(f)) => {
                let f = *f;
                tracing::trace!(callee = name, argc, "native call");
                self.frames.push(Frame { callee: name.to_owned() });
                let r = f(self, out);
                self.frames.pop();
                r
            }
            Some(Binding::Text(body)) => {
                let body = body.clone();
                tracing::trace!(callee = name, argc, "macro call");
                let text = self.eval(&body)?;
                out.push_str(&text);
                Ok(())
            }
            None => {
                tracing::trace!(callee = name, argc, "unresolved call");
                Ok(())
            }
        }
    }

    // ── Argument access for builtins ─────────────────────────────────────────

    /// Name of the builtin currently executing; empty outside a builtin.
    pub fn callee(&self) -> &str {
        self.frames.last().map_or("", |f| f.callee.as_str())
    }

    /// Argument `i` of the current builtin, or `None` if unbound.
    pub fn arg_text(&self, i: usize) -> Option<&str> {
        self.env.array_lookup(self.callee(), i)
    }

    /// Argument `i` of the current builtin; unbound reads as empty.
    pub fn arg(&self, i: usize) -> String {
        self.arg_text(i).unwrap_or_default().to_owned()
    }

    pub fn arg_int(&self, i: usize) -> i64 {
        self.env.array_lookup_int(self.callee(), i)
    }

    /// Argument count of the current builtin.
    pub fn arg_len(&self) -> i64 {
        self.env.array_len(self.callee())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
