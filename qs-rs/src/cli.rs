//! Command-line argument parsing.
//!
//! Usage:
//!   qs [-L<dir>] [-D<n>] [-f[<file>]] [-c<expr>] [-d] <script> [<arg>...]
//!   qs [-L<dir>] [-D<n>] [-f[<file>]] -c<expr> [-d]
//!
//! Flags are only recognised before the script name; everything after it is
//! handed to the script as `args-0`, `args-1`, ….

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Library directory override (`-L<dir>`).
    pub libdir: Option<PathBuf>,
    /// Recursion depth limit (`-D<n>`).
    pub max_depth: Option<usize>,
    /// Which rc file to load.
    pub rc: RcFile,
    /// Expression to evaluate and print (`-c<expr>`).
    pub command: Option<String>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Script to run.
    pub script: Option<PathBuf>,
    /// Arguments passed through to the script.
    pub script_args: Vec<String>,
}

/// How to choose the rc file evaluated before the script.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum RcFile {
    /// Search `~/.qsrc`, then `./.qsrc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip the rc file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            break;
        }

        // First non-flag argument is the script.
        if !arg.starts_with('-') || arg == "-" {
            break;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.rc = RcFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        args.rc = RcFile::Skip;
                    }
                }

                // -c<expr>
                'c' => {
                    let expr = take_value(&chars, &mut j, argv, &mut i, "an expression")?;
                    args.command = Some(expr);
                }

                // -L<dir>
                'L' => {
                    let dir = take_value(&chars, &mut j, argv, &mut i, "a directory")?;
                    args.libdir = Some(PathBuf::from(dir));
                }

                // -D<n>
                'D' => {
                    let n = take_value(&chars, &mut j, argv, &mut i, "a depth")?;
                    let depth = n
                        .parse::<usize>()
                        .map_err(|_| format!("invalid depth limit: {n}"))?;
                    args.max_depth = Some(depth);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    // Positional arguments → script and its arguments.
    if let Some((script, rest)) = argv.get(i..).and_then(|p| p.split_first()) {
        args.script = Some(PathBuf::from(script));
        args.script_args = rest.to_vec();
    }

    if args.script.is_none() && args.command.is_none() {
        return Err("no script given".to_owned());
    }

    Ok(args)
}

/// Value of the flag at `chars[*j]`: the rest of the group if any,
/// otherwise the next argument.  Advances `j` or `i` past what it consumed.
fn take_value(
    chars: &[char],
    j: &mut usize,
    argv: &[String],
    i: &mut usize,
    what: &str,
) -> Result<String, String> {
    if *j + 1 < chars.len() {
        let value = chars[*j + 1..].iter().collect();
        *j = chars.len();
        Ok(value)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Ok(argv[*i].clone())
    } else {
        Err(format!("-{} requires {what} argument", chars[*j]))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
