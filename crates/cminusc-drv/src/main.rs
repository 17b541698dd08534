use clap::Parser as ClapParser;
use cminusc_drv::{init_logging, run, Cli};
use cminusc_util::report_fatal;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        report_fatal(e.stage(), &e);
        std::process::exit(1);
    }
}
