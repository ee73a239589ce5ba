// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve`: wires the store, generator and dispatcher into the
//! ingestion coordinator and serves the webhook until a shutdown signal.

use std::sync::Arc;

use parley_agent::{CoordinatorParts, IngestionCoordinator, install_signal_handler};
use parley_config::ParleyConfig;
use parley_context::{AddressingClassifier, ContextAssembler, KeywordExtractor, RetrievalSettings};
use parley_core::{ConversationStore, ParleyError};
use parley_gateway::{GatewayState, start_server};
use parley_openrouter::OpenRouterGenerator;
use parley_storage::SqliteStore;
use parley_telegram::TelegramDispatcher;
use tracing::{info, warn};

pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    info!(bot = %config.bot.name, "starting parley serve");

    let webhook_token = config
        .telegram
        .webhook_token()
        .ok_or_else(|| {
            ParleyError::Config(
                "telegram.bot_token or telegram.webhook_secret is required to serve".into(),
            )
        })?
        .to_string();
    let persona = parley_config::resolve_persona(&config.bot)
        .map_err(|e| ParleyError::Config(e.to_string()))?;

    let generator = Arc::new(OpenRouterGenerator::new(&config.openrouter)?);
    let dispatcher = Arc::new(TelegramDispatcher::new(&config.telegram)?);

    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;
    let store: Arc<dyn ConversationStore> = Arc::new(store);

    let assembler = ContextAssembler::new(
        Arc::clone(&store),
        KeywordExtractor::from_config(&config.bot, &config.retrieval),
        RetrievalSettings::from(&config.retrieval),
    );
    let coordinator = Arc::new(IngestionCoordinator::new(CoordinatorParts {
        store: Arc::clone(&store),
        classifier: AddressingClassifier::from_config(&config.bot),
        assembler,
        generator,
        dispatcher,
        persona,
        deadline: config.turn.deadline(),
    }));

    let shutdown = install_signal_handler();
    let state = GatewayState::new(coordinator, Some(&webhook_token), shutdown);
    let served = start_server(&config.gateway, state).await;

    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close conversation store cleanly");
    }
    served?;
    info!("parley stopped");
    Ok(())
}
