static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install the `tracing` subscriber once; `RUST_LOG` overrides the `info` default.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Parse an env var, warning (not failing) on bad values.
pub fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("{} is set but cannot be parsed: {}", name, raw);
            None
        }
    }
}
