use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; with `debug` set it is
/// `debug` and `RUST_LOG` may override it.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        // Keep wgpu and winit chatter out of the default output
        EnvFilter::new("info,wgpu_core=warn,wgpu_hal=warn,naga=warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
