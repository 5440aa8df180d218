//! `FitFinder` - conversational fashion stylist
//!
//! HTTP backend running a tool-augmented conversation loop against a hosted
//! reasoning engine.

mod api;
mod config;
mod conversation;
mod llm;
mod runtime;
mod session;
mod system_prompt;
mod tools;

use api::{create_router, AppState};
use config::Config;
use llm::{AnthropicService, LlmService, LoggingService, UnconfiguredService};
use runtime::{LoopConfig, ProductionLoop, ServiceLlmClient};
use session::SessionManager;
use std::sync::Arc;
use tools::ToolRegistry;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitfinder=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    // Engine
    let engine: Arc<dyn LlmService> = if let Some(api_key) = config.engine.api_key.clone() {
        Arc::new(AnthropicService::new(
            api_key,
            config.engine.model.clone(),
            config.engine.gateway.as_deref(),
        )?)
    } else {
        tracing::warn!("No engine credential configured. Set ANTHROPIC_API_KEY.");
        Arc::new(UnconfiguredService::new(config.engine.model.clone()))
    };
    let engine = ServiceLlmClient::new(Arc::new(LoggingService::new(engine)));

    // Tools
    let registry = Arc::new(ToolRegistry::standard(&config.search)?);
    if config.search.api_key.is_none() {
        tracing::warn!("SERPAPI_API_KEY is not set; search_tool calls will fail.");
    }

    let runtime = ProductionLoop::new(
        engine,
        registry,
        LoopConfig {
            instruction: system_prompt::STYLIST_INSTRUCTION.to_string(),
            mode: config.instruction_mode,
            max_tool_rounds: config.max_tool_rounds,
            max_tokens: Some(config.engine.max_tokens),
        },
    );
    tracing::info!(
        model = %config.engine.model,
        mode = ?config.instruction_mode,
        tools = ?runtime.tool_specs().iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "Conversation loop initialized"
    );

    let sessions = SessionManager::new(runtime).with_idle_ttl(config.session_idle_ttl);
    let state = AppState::new(sessions);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("FitFinder server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
