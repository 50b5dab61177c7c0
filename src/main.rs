use nutrilens::{app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    app::init_tracing();

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config)?;
    let config = app_state.config.clone();

    let app = app::build_app(app_state);
    app::serve(&config, app).await
}
