use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global `env_logger` once; later calls are ignored.
///
/// Filter precedence: `filter` (from `--log`), then `RUST_LOG`, then `info`
/// with wgpu's own chatter held at `warn`.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder
                .filter_level(log::LevelFilter::Info)
                .filter_module("wgpu_core", log::LevelFilter::Warn)
                .filter_module("wgpu_hal", log::LevelFilter::Warn)
                .filter_module("naga", log::LevelFilter::Warn);
        }

        builder.write_style(env_logger::WriteStyle::Auto);
        if builder.try_init().is_err() {
            // Someone else installed a logger first; keep theirs.
            return;
        }

        log::debug!("logging initialized");
    });
}
