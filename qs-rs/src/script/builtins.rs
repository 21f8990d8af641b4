//! Built-in qs operations.
//!
//! Every builtin follows the native call protocol: its arguments are already
//! bound as `<name>-N` / `<name>-len` when it runs, and it appends its
//! result to the output buffer it is handed.
//!
//! The control constructs (`def`, `priv`, `do`) build new call text from a
//! small template and hand it back to [`Machine::eval`]; `if`, `loop`, `e`
//! and `use` simply evaluate text they were given.  No control flow is
//! special-cased in the evaluator.
//!
//! | Call                          | Result                                          |
//! |-------------------------------|-------------------------------------------------|
//! | `{def:name:value}`            | bind `name` to `value` verbatim                 |
//! | `{def:name:p1:…>body}`        | bind `name` to a macro taking `p1…` positionally |
//! | `{use:path}`                  | evaluate a file, newlines/tabs removed          |
//! | `{priv>n1>…>expr}`            | evaluate `expr`, then rebind `n1…` to old values |
//! | `{clc:a:op:b:op:c…}`          | left-to-right integer arithmetic                |
//! | `{do:i:from:to>body}`         | evaluate `body` for `i` = `from`..=`to`         |
//! | `{if:l:op:r>then>else}`       | evaluate one branch                             |
//! | `{loop:var>body}`             | evaluate `body` while `var` is non-zero         |
//! | `{v:name}`                    | value of `name`                                 |
//! | `{e:text}`                    | evaluate `text`                                 |
//! | `{strlen:s}` `{chr:n}` `{asc:s:i}` | string helpers                             |
//! | `{sys:cmd}` `{io:op:…}`       | process and file I/O                            |

use std::path::Path;

use crate::error::Result;
use crate::outbuf::OutBuf;
use super::machine::{Machine, NativeFn};

/// Name → builtin table installed by [`install`].
pub const BUILTINS: &[(&str, NativeFn)] = &[
    ("def", def),
    ("use", use_file),
    ("priv", private),
    ("clc", clc),
    ("strlen", strlen),
    ("loop", loop_while),
    ("do", do_range),
    ("if", if_branch),
    ("chr", chr),
    ("asc", asc),
    ("v", v),
    ("e", e),
    ("io", io),
    ("sys", sys),
];

/// Register the standard builtins and the `os` variable.
pub fn install(m: &mut Machine) {
    for &(name, f) in BUILTINS {
        m.define(name, f);
    }
    m.define("os", os_name());
}

/// Platform tag exposed as `os`.
pub fn os_name() -> &'static str {
    if cfg!(target_os = "linux") {
        "__linux__"
    } else if cfg!(target_os = "windows") {
        "_WIN32"
    } else if cfg!(target_os = "macos") {
        "__APPLE__"
    } else {
        "unknown"
    }
}

/// Evaluate `src` and append the result.
fn eval_append(m: &mut Machine, out: &mut OutBuf, src: &str) -> Result<()> {
    let text = m.eval(src)?;
    out.push_str(&text);
    Ok(())
}

// ── Definitions & scoping ─────────────────────────────────────────────────────

/// `{def:name:value}` or `{def:name:param…>body}`.
///
/// `{def:name}` with no value unbinds `name`; it does not rebind it to a
/// macro that expands to its own name.
fn def(m: &mut Machine, _: &mut OutBuf) -> Result<()> {
    let len = m.arg_len();
    if len <= 0 {
        return Ok(());
    }
    let args: Vec<String> = (0..len as usize).map(|i| m.arg(i)).collect();
    match args.as_slice() {
        [name] => m.define(name.as_str(), ""),
        [name, value] => m.define(name.as_str(), value.as_str()),
        [name, params @ .., body] => {
            let wrapped = macro_body(name, params, body);
            m.define(name.as_str(), wrapped);
        }
        [] => {}
    }
    Ok(())
}

/// Wrap `body` so each call copies its positional arguments into `params`
/// for the duration of the body:
///
/// `{priv>p1>p2>{def>p1:{v>name-0}}{def>p2:{v>name-1}}body}`
pub fn macro_body(name: &str, params: &[String], body: &str) -> String {
    let mut src = String::from("{priv>");
    for p in params {
        src.push_str(p);
        src.push('>');
    }
    for (i, p) in params.iter().enumerate() {
        src.push_str(&format!("{{def>{p}:{{v>{name}-{i}}}}}"));
    }
    src.push_str(body);
    src.push('}');
    src
}

/// `{priv>n1>n2>…>expr}`.
///
/// Rebinding uses `{def>name>old}` text, so an old value containing a
/// top-level `:` or `>` is not restored faithfully.
fn private(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let len = m.arg_len();
    if len <= 0 {
        return Ok(());
    }
    let last = len as usize - 1;
    let mut restore = String::new();
    for i in 0..last {
        let name = m.arg(i);
        let old = m.env().lookup_text(&name).unwrap_or_default();
        restore.push_str(&format!("{{def>{name}>{old}}}"));
    }
    let expr = m.arg(last);
    // Restore even when the body fails, so the names are not left holding
    // their inner values after a recursion-limit error.
    let body = eval_append(m, out, &expr);
    let restored = m.eval(&restore);
    body?;
    restored?;
    Ok(())
}

/// `{use:path}`.
///
/// Relative paths that do not exist are retried under `QSLIBDIR`.  A file
/// that cannot be read produces no output.
fn use_file(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let path = m.arg(0);
    let Some(src) = read_source(m, &path) else {
        return Ok(());
    };
    eval_append(m, out, &src)
}

fn read_source(m: &Machine, path: &str) -> Option<String> {
    let mut candidates = vec![path.to_owned()];
    let is_relative = !path.is_empty()
        && !path.starts_with('/')
        && !path.starts_with('.')
        && !path.starts_with('~');
    if is_relative {
        if let Some(libdir) = m.env().lookup_text("QSLIBDIR") {
            candidates.push(Path::new(libdir).join(path).display().to_string());
        }
    }

    let mut last_err = None;
    for candidate in &candidates {
        match m.load_file(candidate) {
            Ok(src) => {
                tracing::debug!(path = %candidate, "use");
                return Some(strip_layout(&src));
            }
            Err(e) => last_err = Some(e),
        }
    }
    if let Some(e) = last_err {
        tracing::warn!(path, error = %e, "use: cannot read file");
    }
    None
}

/// Drop newlines, carriage returns and tabs so source files can be laid out
/// freely.
pub fn strip_layout(src: &str) -> String {
    src.chars().filter(|c| !matches!(c, '\n' | '\r' | '\t')).collect()
}

// ── Arithmetic & control ──────────────────────────────────────────────────────

/// `{clc:a:op:b:…}`, applied strictly left to right.
fn clc(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let count = m.arg_len().max(0) as usize;
    let mut acc = m.arg_int(0);
    let mut i = 1;
    while i < count {
        let op = m.arg(i);
        let operand = m.arg_int(i + 1);
        acc = apply_op(acc, &op, operand);
        i += 2;
    }
    out.push_str(&acc.to_string());
    Ok(())
}

/// One `clc` step.  Overflow wraps; division or modulo by zero leaves `acc`
/// unchanged.  Unknown operators are ignored.
pub fn apply_op(acc: i64, op: &str, operand: i64) -> i64 {
    match op.chars().next() {
        Some('+') => acc.wrapping_add(operand),
        Some('-') => acc.wrapping_sub(operand),
        Some('*') => acc.wrapping_mul(operand),
        Some('/' | '%') if operand == 0 => {
            tracing::warn!(acc, op, "clc: division by zero skipped");
            acc
        }
        Some('/') => acc.wrapping_div(operand),
        Some('%') => acc.wrapping_rem(operand),
        Some('&') => acc & operand,
        Some('|') => acc | operand,
        Some('^') => acc ^ operand,
        _ => acc,
    }
}

/// `{do:i:from:to>body}`.  Counts down when `from > to`.
fn do_range(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let iter = m.arg(0);
    let from = m.arg_int(1);
    let to = m.arg_int(2);
    let body = m.arg(3);
    let step = if from <= to { 1 } else { -1 };

    let mut i = from;
    loop {
        let src = format!("{{priv>{iter}>{{def>{iter}>{i}}}{body}}}");
        eval_append(m, out, &src)?;
        if i == to {
            break;
        }
        i += step;
    }
    Ok(())
}

/// `{if:l:op:r>then>else}`.
fn if_branch(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let left = m.arg_int(0);
    let right = m.arg_int(2);
    let taken = match m.arg(1).chars().next() {
        Some('~') => m.arg(0) == m.arg(2),
        Some(op) => compare(left, op, right),
        None => false,
    };
    let branch = m.arg(if taken { 3 } else { 4 });
    eval_append(m, out, &branch)
}

/// Integer comparison by operator code: `=` `(` `)` `[` `]` `!`.
pub fn compare(left: i64, op: char, right: i64) -> bool {
    match op {
        '=' => left == right,
        '(' => left < right,
        ')' => left > right,
        '[' => left <= right,
        ']' => left >= right,
        '!' => left != right,
        _ => false,
    }
}

/// `{loop:var>body}`.  No iteration cap.
fn loop_while(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let var = m.arg(0);
    let body = m.arg(1);
    while m.env().lookup_int(&var) != 0 {
        eval_append(m, out, &body)?;
    }
    Ok(())
}

/// `{e:text}`.
fn e(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let expr = m.arg(0);
    eval_append(m, out, &expr)
}

// ── Variables & strings ───────────────────────────────────────────────────────

/// `{v:name}`, one level of indirection.
fn v(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let name = m.arg(0);
    if let Some(value) = m.env().lookup_text(&name) {
        out.push_str(value);
    }
    Ok(())
}

fn strlen(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let n = m.arg_text(0).map_or(0, |s| s.chars().count());
    out.push_str(&n.to_string());
    Ok(())
}

/// `{chr:n}`.  Values that are not Unicode scalar values produce nothing.
fn chr(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    if let Some(c) = u32::try_from(m.arg_int(0)).ok().and_then(char::from_u32) {
        out.push(c);
    }
    Ok(())
}

/// `{asc:s:i}`, code of the `i`th character of `s`.
fn asc(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let Ok(idx) = usize::try_from(m.arg_int(1)) else {
        return Ok(());
    };
    if let Some(c) = m.arg_text(0).and_then(|s| s.chars().nth(idx)) {
        out.push_str(&u32::from(c).to_string());
    }
    Ok(())
}

// ── Processes & files ─────────────────────────────────────────────────────────

/// `{sys:cmd}`.
fn sys(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    if let Some(stdout) = run_shell(&m.arg(0)) {
        out.push_str(&stdout);
    }
    Ok(())
}

/// `{io:op:…}`.
///
/// | op  | Arguments     | Effect                                 |
/// |-----|---------------|----------------------------------------|
/// | `p` | text          | print `text` to the console            |
/// | `u` |               | append the Unix time in seconds        |
/// | `t` | cmd           | append the stdout of a shell command   |
/// | `r` | path          | append a file's contents               |
/// | `w` | path, text    | write `text` to a file                 |
/// | `a` | path, text    | append `text` to a file                |
fn io(m: &mut Machine, out: &mut OutBuf) -> Result<()> {
    let op = m.arg(0);
    match op.chars().next() {
        Some('p') => {
            let text = m.arg(1);
            m.print(&text);
        }
        Some('u') => {
            let secs = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            out.push_str(&secs.to_string());
        }
        Some('t') => {
            if let Some(stdout) = run_shell(&m.arg(1)) {
                out.push_str(&stdout);
            }
        }
        Some('r') => {
            let path = m.arg(1);
            match m.load_file(&path) {
                Ok(text) => out.push_str(&text),
                Err(e) => tracing::warn!(path, error = %e, "io: cannot read file"),
            }
        }
        Some(mode @ ('w' | 'a')) => {
            let path = m.arg(1);
            let text = m.arg(2);
            if let Err(e) = write_file(&path, &text, mode == 'a') {
                tracing::warn!(path, error = %e, "io: cannot write file");
            }
        }
        _ => tracing::warn!(op, "io: unknown operation"),
    }
    Ok(())
}

fn write_file(path: &str, text: &str, append: bool) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(text.as_bytes())
}

/// Run `cmd` through the platform shell and return its stdout.
///
/// Blocks until the command exits.  Spawn failures are logged and yield
/// `None`.
fn run_shell(cmd: &str) -> Option<String> {
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    tracing::debug!(cmd, "running shell command");
    match std::process::Command::new(shell).arg(flag).arg(cmd).output() {
        Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Err(e) => {
            tracing::warn!(cmd, error = %e, "cannot run shell command");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
