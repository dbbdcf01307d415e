use env_logger::Builder;
use log::{LevelFilter, debug};

pub fn init_logging() {
    #[cfg(debug_assertions)]
    let default_level = LevelFilter::Debug;
    #[cfg(not(debug_assertions))]
    let default_level = LevelFilter::Info;
    Builder::new()
        .filter_level(LevelFilter::Off)
        .filter_module("feedback_review", default_level)
        .filter_module("feedback", default_level)
        .parse_default_env()
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    debug!("Logging system initialized");
}
