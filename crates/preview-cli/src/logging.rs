use env_logger::Env;

/// `RUST_LOG` wins when set; otherwise `--debug` picks the level.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}
