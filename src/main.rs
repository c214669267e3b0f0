use clap::Parser;
use pathtidy::cli::{Cli, run_cli};
use pathtidy::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(&cli) {
        OutputFormatter::error(&e);
        std::process::exit(1);
    }
}
