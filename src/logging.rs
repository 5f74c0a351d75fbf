#![forbid(unsafe_code)]

/// Installs the logger used by every binary. `verbosity` is the number of
/// `-v` flags: none shows warnings and errors, then info, debug, trace.
///
/// `RUST_LOG` is still honoured on top of the chosen level.
pub fn setup_logger(verbosity: u8) {
    let mut builder = pretty_env_logger::formatted_builder();

    builder.filter_level(level_for(verbosity));
    // ureq logs every request at debug; keep it quiet unless tracing.
    if verbosity < 3 {
        builder.filter_module("ureq", log::LevelFilter::Warn);
        builder.filter_module("rustls", log::LevelFilter::Warn);
    }
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // A second init in the same process is harmless.
    let _ = builder.try_init();
}

fn level_for(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
