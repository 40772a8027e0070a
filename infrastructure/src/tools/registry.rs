//! Tool Registry
//!
//! The [`ToolRegistry`] aggregates tool providers and implements
//! [`ToolExecutorPort`]. It owns everything that must hold for every tool,
//! whoever provides it:
//!
//! 1. the tool exists in the discovered catalog
//! 2. the caller has not smuggled a `tenant_id` into a tenant-scoped call
//! 3. the arguments match the descriptor
//!
//! Only then is the call routed to the provider that won discovery.
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = ToolRegistry::new()
//!     .register(EntityToolProvider::new(schema, store, embedder)) // priority: 0
//!     .register(KnowledgeToolProvider::new(knowledge));          // priority: 50
//!
//! registry.discover().await?;
//!
//! let call = ToolCall::new("insert_clients").with_arg("name", "Acme Corp");
//! let row = registry.execute(&TenantId::new("firm-a"), &call).await?;
//! ```
//!
//! # Priority-Based Resolution
//!
//! When several providers offer the same tool name, the provider with the
//! highest priority wins, so a hand-written tool can replace a generated one.

use async_trait::async_trait;
use counsel_application::ports::tool_executor::ToolExecutorPort;
use counsel_domain::tool::schema::TENANT_FIELD;
use counsel_domain::{
    DefaultToolValidator, ProviderError, TenantId, ToolCall, ToolCatalog, ToolError, ToolProvider,
    ToolValidator,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Tool registry that aggregates multiple providers
pub struct ToolRegistry {
    providers: Vec<Arc<dyn ToolProvider>>,
    /// Tool name -> provider ID (built by discovery)
    tool_mapping: HashMap<String, String>,
    catalog: ToolCatalog,
    discovered: bool,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            tool_mapping: HashMap::new(),
            catalog: ToolCatalog::new(),
            discovered: false,
        }
    }

    pub fn register<P: ToolProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self.discovered = false;
        self
    }

    /// Discover tools from all providers.
    ///
    /// A provider that is unavailable is skipped with a warning; a provider
    /// whose configuration is broken (e.g. an invalid data schema) fails
    /// discovery as a whole.
    pub async fn discover(&mut self) -> Result<(), ProviderError> {
        self.providers
            .sort_by_key(|p| std::cmp::Reverse(p.priority()));

        let mut catalog = ToolCatalog::new();
        let mut tool_mapping = HashMap::new();

        for provider in &self.providers {
            let tools = match provider.discover_tools().await {
                Ok(tools) => tools,
                Err(e @ ProviderError::ConfigurationError(_)) => return Err(e),
                Err(e) => {
                    warn!(provider = provider.id(), error = %e, "Failed to discover tools from provider");
                    continue;
                }
            };

            for tool in tools {
                if tool_mapping.contains_key(&tool.name) {
                    trace!(
                        tool = %tool.name,
                        provider = provider.id(),
                        "Tool already registered by higher priority provider"
                    );
                    continue;
                }
                debug!(tool = %tool.name, provider = provider.id(), "Registered tool");
                tool_mapping.insert(tool.name.clone(), provider.id().to_string());
                catalog.insert(tool);
            }
        }

        self.catalog = catalog;
        self.tool_mapping = tool_mapping;
        self.discovered = true;
        Ok(())
    }

    fn provider_for(&self, tool_name: &str) -> Option<&Arc<dyn ToolProvider>> {
        let provider_id = self.tool_mapping.get(tool_name)?;
        self.providers.iter().find(|p| p.id() == provider_id)
    }

    pub fn stats(&self) -> RegistryStats {
        let mut tools_per_provider = HashMap::new();
        for provider_id in self.tool_mapping.values() {
            *tools_per_provider.entry(provider_id.clone()).or_insert(0) += 1;
        }

        RegistryStats {
            total_providers: self.providers.len(),
            total_tools: self.tool_mapping.len(),
            tools_per_provider,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_providers: usize,
    pub total_tools: usize,
    pub tools_per_provider: HashMap<String, usize>,
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        if !self.discovered {
            return Err(ToolError::upstream(
                "Registry not initialized. Call discover() first.",
            ));
        }

        let Some(descriptor) = self.catalog.get(&call.tool_name) else {
            return Err(ToolError::not_found(format!("tool '{}'", call.tool_name)));
        };

        if tenant.as_str().trim().is_empty() {
            warn!(target: "security", tool = %call.tool_name, "Tool call without a tenant");
            return Err(ToolError::permission("a tenant is required"));
        }

        if descriptor.tenant_scoped && call.arguments.contains_key(TENANT_FIELD) {
            warn!(
                target: "security",
                tool = %call.tool_name,
                tenant = %tenant,
                "Rejected caller-supplied tenant_id"
            );
            return Err(ToolError::permission(format!(
                "'{}' is set by the engine and may not be supplied",
                TENANT_FIELD
            )));
        }

        DefaultToolValidator
            .validate(call, descriptor)
            .map_err(ToolError::validation)?;

        match self.provider_for(&call.tool_name) {
            Some(provider) => provider.execute(tenant, call).await,
            None => Err(ToolError::not_found(format!("tool '{}'", call.tool_name))),
        }
    }
}
