//! Dependency injection: builds the pipeline from the file configuration.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vaultpilot_application::{
    AgentRuntime, AllTools, CatalogExecutor, KeywordToolSelector, ModelCritic, PathResolver,
    SafetyGate, ShardedThreadStore, ThreadStore, ToolCatalog, ToolExecutorPort, ToolSelector,
    ToolServer, TurnOrchestrator, VaultListing,
};
use vaultpilot_domain::PathNormalizer;
use vaultpilot_infrastructure::config::FileOpenAiConfig;
use vaultpilot_infrastructure::http::build_client;
use vaultpilot_infrastructure::{
    FileConfig, FileThreadStore, HttpToolServer, HttpVaultListing, OpenAiAgentRuntime,
    OpenAiClient, OpenAiCompletionGateway, ToolSelectionMode, UnconfiguredVaultListing,
};

/// Everything the commands need, wired once at startup.
pub struct Pipeline {
    pub catalog: Arc<ToolCatalog>,
    pub resolver: Arc<PathResolver>,
    pub orchestrator: Arc<TurnOrchestrator>,
}

impl Pipeline {
    pub fn build(file: &FileConfig) -> Result<Self> {
        let config = file.to_pipeline_config();
        let http = build_client(Duration::from_secs(file.openai.request_timeout_secs))
            .context("failed to build HTTP client")?;

        // === Tool catalog ===
        let servers: Vec<Arc<dyn ToolServer>> = file
            .servers
            .iter()
            .map(|server| {
                Arc::new(HttpToolServer::new(&server.id, &server.url, http.clone()))
                    as Arc<dyn ToolServer>
            })
            .collect();
        if servers.is_empty() {
            warn!("No tool servers configured; the agent will have no tools");
        }
        let catalog = Arc::new(ToolCatalog::new(servers, config.catalog.clone()));

        // === Path resolution ===
        let listing: Arc<dyn VaultListing> = match &file.vault.listing_url {
            Some(url) => Arc::new(HttpVaultListing::new(url, http.clone())),
            None => Arc::new(UnconfiguredVaultListing),
        };
        let resolver = Arc::new(PathResolver::new(
            listing,
            PathNormalizer::new(&config.vault_extension),
        ));

        // === Models ===
        let openai = with_api_key(OpenAiClient::new(http, &file.openai.base_url), &file.openai);
        let gateway = Arc::new(
            OpenAiCompletionGateway::new(openai.clone()).with_max_tokens(file.agent.max_tokens),
        );
        let critic = Arc::new(ModelCritic::new(
            gateway,
            &file.critic.model,
            config.safety.critic_timeout,
        ));
        let threads_dir = file.threads.resolved_directory();
        let mut runtime = OpenAiAgentRuntime::new(openai, &file.agent.model)
            .with_max_tool_rounds(file.agent.max_tool_rounds)
            .with_max_tokens(file.agent.max_tokens);
        if let Some(dir) = &threads_dir {
            runtime = runtime.with_transcripts(dir.join("transcripts"));
        }
        let runtime: Arc<dyn AgentRuntime> = Arc::new(runtime);

        // === Safety gate ===
        let gate = Arc::new(
            SafetyGate::new(config.safety.policy(), critic, config.safety.pending_ttl)
                .with_card_retention(config.safety.card_retention)
                .with_path_resolver(resolver.clone()),
        );
        let executor: Arc<dyn ToolExecutorPort> = Arc::new(CatalogExecutor::new(catalog.clone()));

        // === Threads ===
        let threads: Arc<dyn ThreadStore> = match threads_dir {
            Some(dir) => {
                info!(directory = %dir.display(), "Using file thread store");
                Arc::new(FileThreadStore::new(dir))
            }
            None => Arc::new(ShardedThreadStore::new()),
        };

        let selector: Arc<dyn ToolSelector> = match file.agent.parse_tool_selection().0 {
            ToolSelectionMode::All => Arc::new(AllTools),
            ToolSelectionMode::Keyword => {
                Arc::new(KeywordToolSelector::new(file.agent.core_tools.iter()))
            }
        };

        let orchestrator = Arc::new(
            TurnOrchestrator::new(
                catalog.clone(),
                threads,
                runtime,
                gate,
                executor,
                config.turn.clone(),
            )
            .with_selector(selector),
        );

        Ok(Self {
            catalog,
            resolver,
            orchestrator,
        })
    }
}

fn with_api_key(client: OpenAiClient, file: &FileOpenAiConfig) -> OpenAiClient {
    if let Some(key) = &file.api_key {
        return client.with_api_key(key);
    }
    match client.clone().with_api_key_from_env(&file.api_key_env) {
        Ok(client) => client,
        Err(e) => {
            // Local OpenAI-compatible servers usually run without a key.
            warn!(error = %e, "Continuing without an API key");
            client
        }
    }
}
