//! Service construction from configuration

use crate::config::TripgraphConfig;
use crate::offline::OfflineModel;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tripgraph_checkpoint::FileStateStore;
use tripgraph_core::ChatModel;
use tripgraph_llm::OpenAiClient;
use tripgraph_travel::TravelChatService;

/// Which chat model backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// OpenAI-compatible provider from `[llm]`
    Remote,
    /// Built-in keyword rules, no network
    Offline,
}

impl ModelChoice {
    pub fn from_flag(offline: bool) -> Self {
        if offline {
            ModelChoice::Offline
        } else {
            ModelChoice::Remote
        }
    }
}

pub fn build_model(
    config: &TripgraphConfig,
    choice: ModelChoice,
) -> anyhow::Result<Arc<dyn ChatModel>> {
    Ok(match choice {
        ModelChoice::Offline => Arc::new(OfflineModel::new()),
        ModelChoice::Remote => {
            let client = OpenAiClient::new(config.remote_llm_config()?)
                .context("Failed to create chat model client")?;
            Arc::new(client)
        }
    })
}

/// Build a service persisting threads under the configured state directory
pub async fn build_service(
    config: &TripgraphConfig,
    choice: ModelChoice,
) -> anyhow::Result<TravelChatService> {
    let model = build_model(config, choice)?;

    let state_dir = config.state_dir();
    let store = FileStateStore::open(&state_dir)
        .await
        .with_context(|| format!("Failed to open state directory {}", state_dir.display()))?;

    info!(
        model = model.model_name(),
        state_dir = %state_dir.display(),
        "Travel service ready"
    );

    Ok(TravelChatService::new(
        model,
        Arc::new(store),
        config.execution_config(),
    )?)
}
