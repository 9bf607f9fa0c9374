use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use inspection_chatbot_backend::{
    app,
    config::AppConfig,
    llm::{GeminiClient, LanguageModel, OllamaClient},
    store::MongoInspectionStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    let local_model: Arc<dyn LanguageModel> = Arc::new(OllamaClient::new(
        config.ollama_url.clone(),
        config.ollama_model.clone(),
    ));
    let gemini_model: Option<Arc<dyn LanguageModel>> =
        config.gemini_api_key.clone().map(|key| {
            Arc::new(GeminiClient::new(key, config.gemini_model.clone()))
                as Arc<dyn LanguageModel>
        });
    if gemini_model.is_none() {
        info!("GEMINI_API_KEY not set, gemini requests will use the local model");
    }

    let store = Arc::new(MongoInspectionStore::connect(&config).await?);

    let state = AppState {
        config: config.clone(),
        local_model,
        gemini_model,
        store,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("inspection chatbot backend listening on http://{}", config.bind_addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
