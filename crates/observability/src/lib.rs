//! Tracing and logging setup shared by the binaries.

/// Initialize process-wide tracing/logging.
///
/// Output format comes from `SUBHUB_LOG_FORMAT` (`json` by default,
/// `pretty` for local runs); filtering from `RUST_LOG`. Safe to call multiple
/// times; subsequent calls become no-ops.
///
/// An unrecognised format falls back to JSON and is reported once the
/// subscriber is up.
pub fn init() {
    let setting = std::env::var("SUBHUB_LOG_FORMAT").ok();
    match LogFormat::from_setting(setting.as_deref()) {
        Ok(format) => tracing::init(format),
        Err(err) => {
            tracing::init(LogFormat::default());
            ::tracing::warn!(error = %err, "invalid SUBHUB_LOG_FORMAT, logging as json");
        }
    }
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::LogFormat;
