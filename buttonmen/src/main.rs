//! Entry point for the text-protocol driver: parses a handful of startup
//! flags, wires up logging, then hands stdin/stdout to a `Driver` until it
//! sees `quit` or EOF.

use std::io::{self, BufRead};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "buttonmen", about = "Button Men dice combat AI engine")]
struct Args {
    /// RNG seed for the session (0 draws a fresh one from OS entropy).
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// env_logger filter level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Suppress the `action` banner line `getaction` normally prints.
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    let mut driver = bm_protocol::Driver::new(args.seed);
    driver.set_quiet(args.quiet);

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = driver.run(stdin.lock(), stdout.lock()) {
        log::error!("driver exited with error: {e:#}");
        std::process::exit(1);
    }
}
