use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging.
/// By default, it will only show warnings from our crate, so the plugin's stdout stays
/// limited to the lines it prints on purpose.
///
/// The log level can be overridden by setting the `CSP_LOG` environment variable.
/// If the `CSP_LOG_ALL` environment variable is set, it will show logs from all crates at the specified level.
/// The `DEBUG` environment variable, honoured by the cf CLI as well, and the `--debug` flag switch to debug.
pub fn setup_logging(debug: bool) {
    let debug = debug || std::env::var("DEBUG").is_ok_and(|value| !value.is_empty());
    let log_level = std::env::var("CSP_LOG").ok();
    let show_all_logs = std::env::var("CSP_LOG_ALL").is_ok();

    let filter = build_filter(log_level.as_deref(), debug, show_all_logs);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::new(filter))
        .init();
}

/// Build the filter directive.
/// This will ether be "log_level" or "cf_create_service_push=log_level".
fn build_filter(log_level: Option<&str>, debug: bool, show_all_logs: bool) -> String {
    let log_level = match (log_level, debug) {
        (Some(level), _) => level,
        (None, true) => "debug",
        (None, false) => "warn",
    };

    if show_all_logs {
        log_level.to_string()
    } else {
        format!("cf_create_service_push={log_level}")
    }
}
