pub mod cli;
pub mod error;
pub mod pipeline;

pub use cli::Cli;
pub use error::CminuscError;
pub use pipeline::run;

/// Initializes the `log`/`env_logger` facade. `-v` raises the default
/// filter to `debug`; otherwise only `warn`/`error` are shown unless
/// `RUST_LOG` says otherwise.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
