use clap::Parser;
use easy_cleanup::cli::{Cli, run_cli};
use easy_cleanup::logging::init_tracing;
use easy_cleanup::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run_cli(cli.command, cli.config.as_deref()) {
        OutputFormatter::error(&e);
        std::process::exit(1);
    }
}
