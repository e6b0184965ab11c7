//! migconsole binary

use migconsole::cli::{self, Cli};
use migconsole::logging;

fn main() {
    let args = Cli::parse_args();
    logging::init(args.verbose);

    if let Err(e) = cli::run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(e.code().exit_code());
    }
}
