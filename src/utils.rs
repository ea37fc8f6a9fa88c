use env_logger::Env;

/// `numerator / denominator`, or 0 when the denominator is zero
pub fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Initialise `env_logger` with an `info` default filter; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
