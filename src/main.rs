use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use flagquizbot::config::GameConfig;
use flagquizbot::registry::SessionRegistry;
use flagquizbot::schema::schema;
use flagquizbot::state::QuizState;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::fmt::format::FmtSpan;
use url::Url;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let rust_log = std::env::var("LOG_LEVEL").unwrap_or("error".into());
    let level = rust_log.parse::<LevelFilter>().unwrap_or(LevelFilter::ERROR);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    let config = match GameConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid game configuration: {err}");
            std::process::exit(1);
        }
    };
    info!(
        countries = config.pool.len(),
        rounds = config.rules.rounds_per_session,
        options = config.rules.options_per_round,
        delay = ?config.feedback_delay,
        "game configuration loaded"
    );
    let registry = Arc::new(SessionRegistry::new(config));

    let teloxide_token = std::env::var("TELOXIDE_TOKEN").expect("TELOXIDE_TOKEN should be set.");
    let bot = Bot::new(teloxide_token);
    info!("Starting bot...");

    let ngrok_url = std::env::var("NGROK_URL")
        .ok()
        .and_then(|d| d.parse::<Url>().ok());
    let ngrok_addr = std::env::var("NGROK_ADDR")
        .map(|d| d.parse::<SocketAddr>().expect("NGROK_ADDR can't be parsed."))
        .ok();

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![InMemStorage::<QuizState>::new(), registry])
        .enable_ctrlc_handler()
        .build();

    if let (Some(ngrok_url), Some(ngrok_addr)) = (ngrok_url, ngrok_addr) {
        let listener = webhooks::axum(bot, Options::new(ngrok_addr, ngrok_url))
            .await
            .expect("Failed to build a listener.");
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }
}
