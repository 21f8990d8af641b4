//! Brace-call scanner.
//!
//! Splits source text into maximal literal runs and complete calls.  A call
//! is `{` *arg* (`:`|`>` *arg*)* `}` where the delimiters only count at
//! nesting depth zero; anything inside nested braces belongs to the current
//! argument verbatim.
//!
//! The scanner knows nothing about the environment.  It reports each
//! argument's trimmed text together with whether it must be evaluated
//! before binding:
//!
//! | Position                         | Evaluated before binding? |
//! |----------------------------------|---------------------------|
//! | argument 0 (the callee name)     | always                    |
//! | argument after a `:` delimiter   | yes (eager)               |
//! | argument after a `>` delimiter   | no (lazy, raw text)       |
//!
//! Malformed input has fixed behaviour: a `}` outside a call is literal
//! text, and end of input inside a call closes it implicitly with the
//! remaining text as the last argument.

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Copying literal text.
    Text,
    /// Collecting the arguments of a call.
    Call,
}

/// One argument of a call as it appeared in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawArg<'a> {
    /// Argument text with ASCII space, tab and newline trimmed from both ends.
    pub text: &'a str,
    /// Whether the argument is evaluated before it is bound.
    pub eager: bool,
}

/// A complete call; `args[0]` is the callee-name slot and always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCall<'a> {
    pub args: Vec<RawArg<'a>>,
}

/// A unit of scanner output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<'a> {
    /// A maximal run of literal text.
    Text(&'a str),
    Call(RawCall<'a>),
}

/// Left-to-right scanner over a source string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    mode: Mode,
    depth: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, mode: Mode::Text, depth: 0 }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Brace nesting inside the call being scanned.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Copy literal text up to the next `{` or end of input.
    fn scan_text(&mut self) -> &'a str {
        let rest = &self.src[self.pos..];
        let run = rest.find('{').map_or(rest, |i| &rest[..i]);
        self.pos += run.len();
        if self.pos < self.src.len() {
            self.mode = Mode::Call;
        }
        run
    }

    /// Collect one call; `self.pos` is at its opening `{`.
    fn scan_call(&mut self) -> RawCall<'a> {
        let bytes = self.src.as_bytes();
        let mut args = Vec::new();
        let mut eager = true;
        self.depth = 0;
        self.pos += 1;
        let mut start = self.pos;

        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            self.pos += 1;
            match c {
                b':' | b'>' | b'}' if self.depth == 0 => {
                    args.push(RawArg { text: trim(&self.src[start..self.pos - 1]), eager });
                    if c == b'}' {
                        self.mode = Mode::Text;
                        return RawCall { args };
                    }
                    eager = c == b':';
                    start = self.pos;
                }
                b'{' => self.depth += 1,
                b'}' => self.depth -= 1,
                _ => {}
            }
        }

        // End of input inside a call: close it implicitly.
        args.push(RawArg { text: trim(&self.src[start..]), eager });
        self.depth = 0;
        self.mode = Mode::Text;
        RawCall { args }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Piece<'a>> {
        if self.pos >= self.src.len() {
            return None;
        }
        Some(match self.mode {
            Mode::Text => {
                let run = self.scan_text();
                if run.is_empty() {
                    Piece::Call(self.scan_call())
                } else {
                    Piece::Text(run)
                }
            }
            Mode::Call => Piece::Call(self.scan_call()),
        })
    }
}

/// Strip ASCII space, tab and newline from both ends.
pub fn trim(s: &str) -> &str {
    s.trim_matches([' ', '\t', '\n'])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(src: &str) -> Vec<Piece<'_>> {
        Scanner::new(src).collect()
    }

    fn call<'a>(args: &[(&'a str, bool)]) -> Piece<'a> {
        Piece::Call(RawCall {
            args: args.iter().map(|&(text, eager)| RawArg { text, eager }).collect(),
        })
    }

    #[test]
    fn plain_text_is_one_run() {
        assert_eq!(pieces("hello world"), vec![Piece::Text("hello world")]);
    }

    #[test]
    fn empty_source_yields_nothing() {
        assert!(pieces("").is_empty());
    }

    #[test]
    fn text_runs_around_call() {
        assert_eq!(
            pieces("ab{x}cd"),
            vec![Piece::Text("ab"), call(&[("x", true)]), Piece::Text("cd")]
        );
    }

    #[test]
    fn adjacent_calls() {
        assert_eq!(pieces("{a}{b}"), vec![call(&[("a", true)]), call(&[("b", true)])]);
    }

    #[test]
    fn colon_is_eager_angle_is_lazy() {
        assert_eq!(
            pieces("{f:1>2:3}"),
            vec![call(&[("f", true), ("1", true), ("2", false), ("3", true)])]
        );
    }

    #[test]
    fn name_slot_is_eager_even_before_angle() {
        assert_eq!(pieces("{v>x}"), vec![call(&[("v", true), ("x", false)])]);
    }

    #[test]
    fn arguments_are_trimmed() {
        assert_eq!(
            pieces("{ f :\t a b \n> c }"),
            vec![call(&[("f", true), ("a b", true), ("c", false)])]
        );
    }

    #[test]
    fn trim_leaves_carriage_return() {
        assert_eq!(trim(" \r\n"), "\r");
    }

    #[test]
    fn empty_arguments_are_kept() {
        assert_eq!(
            pieces("{f::}"),
            vec![call(&[("f", true), ("", true), ("", true)])]
        );
    }

    #[test]
    fn nested_delimiters_do_not_split() {
        assert_eq!(
            pieces("{if:{v:a}:=:1>{g:x>y}>no}"),
            vec![call(&[
                ("if", true),
                ("{v:a}", true),
                ("=", true),
                ("1", true),
                ("{g:x>y}", false),
                ("no", false),
            ])]
        );
    }

    #[test]
    fn stray_close_brace_is_literal() {
        assert_eq!(pieces("a}b"), vec![Piece::Text("a}b")]);
    }

    #[test]
    fn unterminated_call_closes_at_end() {
        assert_eq!(
            pieces("x{f:1>rest"),
            vec![Piece::Text("x"), call(&[("f", true), ("1", true), ("rest", false)])]
        );
    }

    #[test]
    fn unterminated_nested_call_keeps_inner_text() {
        assert_eq!(pieces("{f:{g:1"), vec![call(&[("f", true), ("{g:1", true)])]);
    }

    #[test]
    fn scanner_state_tracks_position_and_mode() {
        let mut s = Scanner::new("ab{x}");
        assert_eq!(s.mode(), Mode::Text);
        assert_eq!(s.next(), Some(Piece::Text("ab")));
        assert_eq!(s.mode(), Mode::Call);
        assert_eq!(s.position(), 2);
        assert!(matches!(s.next(), Some(Piece::Call(_))));
        assert_eq!(s.mode(), Mode::Text);
        assert_eq!(s.position(), 5);
        assert_eq!(s.depth(), 0);
        assert_eq!(s.next(), None);
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(
            pieces("ż{v:ł}ó"),
            vec![Piece::Text("ż"), call(&[("v", true), ("ł", true)]), Piece::Text("ó")]
        );
    }
}
