mod bootstrap;
mod cli;
mod loop_runner;

pub(crate) use bootstrap::build_app;
pub(crate) use cli::Args;
pub(crate) use loop_runner::run;
