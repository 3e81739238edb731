use std::io::Write;

/// Initialise env_logger on stderr. `RUST_LOG` or `--log-level` win over `--debug`.
pub fn init_logging(debug: bool, log_level: Option<&str>) {
    let default_filter = match log_level {
        Some(level) => level,
        None if debug => "debug",
        None => "info",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
