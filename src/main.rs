use anyhow::Context;
use filmyverse_server::{app, config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::load()?;
	let addr = config.addr.clone();
	let state = AppState::connect(config)?;

	let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {}", addr))?;
	log::info!("listening on {}", addr);

	axum::serve(listener, app(state)).await?;
	Ok(())
}
