//! Songpsd command line tools

pub mod output;

/// Initialize logging: Info when verbose, silent otherwise so stdout stays
/// parseable JSON. `RUST_LOG` is still honoured for module filters.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
