//! Dependency wiring: builds every adapter from the file configuration.

use anyhow::{Context, Result};
use counsel_application::{
    AuditLogger, CaseContextStore, DeliberationOrchestrator, DeliberationTrigger,
    InMemoryCaseContextStore, ModelGateway, NoAuditLogger, VerificationLedger,
};
use counsel_domain::DataSchema;
use counsel_infrastructure::{
    DeliberationToolProvider, EntityToolProvider, FileCaseContextStore, FileConfig,
    HashingEmbedder, HttpModelGateway, InMemoryLedger, InMemoryRecordStore, JsonlAuditLogger,
    JsonlLedger, KnowledgeBase, KnowledgeToolProvider, MEMORY_ENTITY, MemoryToolProvider,
    SchemaLoader, ToolRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct App {
    pub config: FileConfig,
    pub gateway: Arc<dyn ModelGateway>,
    pub registry: Arc<ToolRegistry>,
    pub orchestrator: Arc<DeliberationOrchestrator>,
    pub ledger: Arc<dyn VerificationLedger>,
    pub contexts: Arc<dyn CaseContextStore>,
    pub audit: Arc<dyn AuditLogger>,
    /// Whether suspended deliberations outlive this process
    pub persistent: bool,
}

impl App {
    pub async fn build(config: FileConfig) -> Result<Self> {
        let execution = config.execution.to_params();
        let deliberation = config.deliberation.to_params();

        let schema = SchemaLoader::load(config.schema.path.as_deref())
            .context("Failed to load data schema")?;
        let store = Arc::new(InMemoryRecordStore::with_entities(entity_names(&schema)));
        if let Some(seed) = &config.store.seed {
            let rows = store
                .load_jsonl(seed)
                .with_context(|| format!("Failed to seed record store from {}", seed.display()))?;
            info!(rows, "Seeded record store");
        }
        let embedder = Arc::new(HashingEmbedder::new());
        let knowledge = Arc::new(KnowledgeBase::from_schema(
            &schema,
            store.clone(),
            embedder.clone(),
        ));

        let (ledger, contexts, persistent): (
            Arc<dyn VerificationLedger>,
            Arc<dyn CaseContextStore>,
            bool,
        ) = match (&config.ledger.path, config.ledger.contexts_dir()) {
            (Some(path), Some(dir)) => (
                Arc::new(JsonlLedger::open(path).context("Failed to open verification ledger")?),
                Arc::new(FileCaseContextStore::new(dir)),
                true,
            ),
            _ => (
                Arc::new(InMemoryLedger::new()),
                Arc::new(InMemoryCaseContextStore::new()),
                false,
            ),
        };

        let audit: Arc<dyn AuditLogger> = match &config.logging.audit_file {
            Some(path) => match JsonlAuditLogger::open(path) {
                Some(logger) => Arc::new(logger),
                None => {
                    warn!(path = %path.display(), "Audit log unavailable, continuing without it");
                    Arc::new(NoAuditLogger)
                }
            },
            None => Arc::new(NoAuditLogger),
        };

        let gateway: Arc<dyn ModelGateway> = Arc::new(
            HttpModelGateway::new(&config.model.name)
                .with_endpoint(&config.model.endpoint)
                .with_api_key(config.model.api_key())
                .with_timeout(execution.model_timeout)
                .context("Failed to build HTTP client")?,
        );

        let orchestrator = Arc::new(
            DeliberationOrchestrator::new(gateway.clone(), knowledge.clone(), ledger.clone())
                .with_params(deliberation)
                .with_execution_params(execution.clone())
                .with_audit_logger(audit.clone()),
        );
        let trigger = DeliberationTrigger::new(orchestrator.clone(), contexts.clone());

        let mut registry = ToolRegistry::new()
            .register(EntityToolProvider::new(schema, store.clone(), embedder.clone()))
            .register(KnowledgeToolProvider::new(knowledge))
            .register(MemoryToolProvider::new(store, embedder))
            .register(DeliberationToolProvider::new(Arc::new(trigger)));
        registry
            .discover()
            .await
            .context("Tool discovery failed")?;
        info!(tools = registry.stats().total_tools, "Tool registry ready");

        Ok(Self {
            config,
            gateway,
            registry: Arc::new(registry),
            orchestrator,
            ledger,
            contexts,
            audit,
            persistent,
        })
    }
}

fn entity_names(schema: &DataSchema) -> Vec<String> {
    schema
        .entities
        .iter()
        .map(|e| e.name.clone())
        .chain(std::iter::once(MEMORY_ENTITY.to_string()))
        .collect()
}
