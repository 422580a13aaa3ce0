mod api;
mod app;
mod record;
mod state;
mod store;
mod ui;
mod x11;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = app::run() {
        tracing::error!("fatal: {err:#}");
        std::process::exit(1);
    }
}
