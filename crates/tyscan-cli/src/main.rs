mod args;
mod driver;
mod tracing_config;

use clap::Parser;
use colored::Colorize;

use crate::args::CliArgs;

fn main() {
    let args = CliArgs::parse();
    tracing_config::init_tracing(args.log_level);

    let code = match driver::run_scan(&args) {
        Ok(snapshot) => match driver::write_output(&args, &snapshot) {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("{} {error:#}", "error:".red().bold());
                1
            }
        },
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            error.exit_code()
        }
    };
    std::process::exit(code);
}
