use qs::cli::{self, CliArgs};
use qs::config::{self, Config};
use qs::logging;
use qs::script::Machine;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("qs: {e}");
            eprintln!("Usage: qs [-L<dir>] [-D<n>] [-f[<file>]] [-c<expr>] [-d] <script> [<arg>...]");
            eprintln!("       qs [-L<dir>] [-D<n>] [-f[<file>]] -c<expr> [-d]");
            std::process::exit(1);
        }
    };

    logging::init_tracing(args.debug);

    let config = Config::resolve(&args);
    let mut machine = Machine::with_stdlib();
    config.apply(&mut machine);

    // ── Seed bindings visible to every script ─────────────────────────────────
    config::seed_args(&mut machine, &args.script_args);
    machine.define("version", env!("CARGO_PKG_VERSION"));

    // ── rc file (missing or failing rc is only a warning) ─────────────────────
    if let Some(rc) = &config.rc_file {
        if let Err(e) = config::run_script(&mut machine, rc) {
            eprintln!("qs: warning: {e}");
        }
    }

    if let Err(code) = run(&mut machine, &args) {
        std::process::exit(code);
    }
}

/// Run the script, then the `-c` expression.  Script output is discarded;
/// anything a script wants shown goes through `io`.
fn run(machine: &mut Machine, args: &CliArgs) -> Result<(), i32> {
    if let Some(script) = &args.script {
        match config::run_script(machine, script) {
            Ok(out) => tracing::debug!(bytes = out.len(), "discarding script output"),
            Err(e) => {
                eprintln!("qs: {e}");
                return Err(1);
            }
        }
    }

    if let Some(expr) = &args.command {
        match machine.eval(expr) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("qs: {e}");
                return Err(1);
            }
        }
    }

    Ok(())
}
