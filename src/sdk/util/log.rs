use env_logger::{Builder, Env};

/// Initializes `env_logger`, honouring `RUST_LOG` and falling back to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init();
}
