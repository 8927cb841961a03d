mod args;
mod audit;

use clap::Parser;
use log::debug;
use snafu::ErrorCompat;

use irv_assertions::ExplainOptions;

use crate::args::Args;
use crate::audit::{run_explain, OutputMode, RunSettings};

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("args: {:?}", args);

    let settings = RunSettings {
        input: args.input.clone(),
        out: args.out.clone(),
        reference: args.reference.clone(),
        mode: match args.lazy_depth {
            Some(depth) => OutputMode::Lazy(depth),
            None => OutputMode::Narrative,
        },
        options: ExplainOptions {
            expand_fully: args.expand_fully,
            hide_winner: args.hide_winner,
            max_exhaustive_candidates: args
                .max_exhaustive_candidates
                .unwrap_or(ExplainOptions::DEFAULT_OPTIONS.max_exhaustive_candidates),
        },
    };

    if let Err(e) = run_explain(&settings) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
