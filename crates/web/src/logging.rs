use tracing_subscriber::EnvFilter;

/// Initializes tracing output. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: u8) {
    let default = match verbose {
        0 => "warn,consulta=info",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
