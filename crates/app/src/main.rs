use std::process::ExitCode;

use clap::Parser;

mod app;

fn main() -> ExitCode {
    let args = app::Args::parse();
    let wiring = app::build_app(args);
    app::run(wiring)
}
