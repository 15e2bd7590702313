use particle_playground::config::CONFIG_FILE;
use particle_playground::{window, AppConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = match AppConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = window::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
