//! Hand-written port mocks shared by the use case tests.

use crate::ports::audit_logger::{AuditEvent, AuditLogger};
use crate::ports::event_sink::EventSink;
use crate::ports::ledger::{LedgerError, VerificationLedger};
use crate::ports::model_gateway::{GatewayError, ModelGateway};
use crate::ports::retrieval::{RetrievalError, RetrievalPort, SearchFilters};
use crate::ports::tool_executor::ToolExecutorPort;
use async_trait::async_trait;
use counsel_domain::{
    Completion, DeliberationRound, OrchestrationEvent, RoundRef, SearchHit, SessionId, TenantId,
    ToolCall, ToolCatalog, ToolDescriptor, ToolError,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// ==================== Model gateway ====================

/// Replays scripted completions in order and records every prompt.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<Completion, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
    offered_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGateway {
    pub fn new(responses: Vec<Result<Completion, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            offered_tools: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(Completion::text(*t))).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.offered_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(
        &self,
        prompt: &str,
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<Completion, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.offered_tools.lock().unwrap().push(
            tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        );
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Other("script exhausted".to_string())))
    }
}

type Route = Box<dyn Fn(&str) -> Result<Completion, GatewayError> + Send + Sync>;

/// Answers by matching on the prompt, for multi-stage flows.
pub struct RoutedGateway {
    route: Route,
    prompts: Mutex<Vec<String>>,
}

impl RoutedGateway {
    pub fn new(route: impl Fn(&str) -> Result<Completion, GatewayError> + Send + Sync + 'static) -> Self {
        Self {
            route: Box::new(route),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn prompts_containing(&self, needle: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(needle)).count()
    }
}

#[async_trait]
impl ModelGateway for RoutedGateway {
    async fn complete(
        &self,
        prompt: &str,
        _tools: Option<&[ToolDescriptor]>,
    ) -> Result<Completion, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.route)(prompt)
    }
}

// ==================== Tool executor ====================

/// Records every call; answers from per-tool scripts, echoing the
/// arguments with a generated id once a script runs dry.
pub struct RecordingToolExecutor {
    catalog: ToolCatalog,
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, ToolError>>>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(TenantId, ToolCall)>>,
}

impl RecordingToolExecutor {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        let mut catalog = ToolCatalog::new();
        for tool in tools {
            catalog.insert(tool);
        }
        Self {
            catalog,
            scripts: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, tool: &str, results: Vec<Result<Value, ToolError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(tool.to_string(), results.into());
        self
    }

    pub fn with_delay(mut self, tool: &str, delay: Duration) -> Self {
        self.delays.insert(tool.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<(TenantId, ToolCall)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, tool: &str) -> Vec<ToolCall> {
        self.calls()
            .into_iter()
            .filter(|(_, c)| c.tool_name == tool)
            .map(|(_, c)| c)
            .collect()
    }
}

#[async_trait]
impl ToolExecutorPort for RecordingToolExecutor {
    fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((tenant.clone(), call.clone()));
            calls.len()
        };
        if let Some(delay) = self.delays.get(&call.tool_name) {
            tokio::time::sleep(*delay).await;
        }
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&call.tool_name)
            .and_then(|q| q.pop_front());
        scripted.unwrap_or_else(|| {
            let mut echo = call.arguments.clone();
            echo.insert("id".to_string(), json!(format!("{}-{}", call.tool_name, call_number)));
            Ok(Value::Object(echo))
        })
    }
}

// ==================== Event sink ====================

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<OrchestrationEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OrchestrationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().iter().map(|e| e.name().to_string()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| *n == name).count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: OrchestrationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ==================== Audit ====================

#[derive(Default)]
pub struct RecordingAuditLogger {
    events: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl AuditLogger for RecordingAuditLogger {
    fn log(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}

// ==================== Retrieval ====================

/// Returns the same hits for every query; only those sources resolve.
pub struct StaticRetrieval {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
    failures: Mutex<u32>,
}

impl StaticRetrieval {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
            failures: Mutex::new(0),
        }
    }

    /// Fail the next `n` searches with a transient error.
    pub fn failing(self, n: u32) -> Self {
        *self.failures.lock().unwrap() = n;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalPort for StaticRetrieval {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(RetrievalError::Unavailable("index offline".to_string()));
            }
        }
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn resolve_source(
        &self,
        _tenant: &TenantId,
        source_id: &str,
    ) -> Result<Option<SearchHit>, RetrievalError> {
        Ok(self.hits.iter().find(|h| h.source_id == source_id).cloned())
    }
}

// ==================== Ledger ====================

#[derive(Default)]
pub struct MemoryLedger {
    rounds: Mutex<Vec<DeliberationRound>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<DeliberationRound> {
        self.rounds.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationLedger for MemoryLedger {
    async fn append(&self, round: DeliberationRound) -> Result<RoundRef, LedgerError> {
        let mut rounds = self.rounds.lock().unwrap();
        if let Some(last) = rounds
            .iter()
            .filter(|r| r.belongs_to(&round.tenant_id, &round.session_id))
            .map(|r| r.round_number)
            .max()
            && round.round_number <= last
        {
            return Err(LedgerError::OutOfOrder {
                session_id: round.session_id.clone(),
                round_number: round.round_number,
                last,
            });
        }
        let reference = round.reference();
        rounds.push(round);
        Ok(reference)
    }

    async fn read_all(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Vec<DeliberationRound>, LedgerError> {
        Ok(self
            .rounds
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.belongs_to(tenant, session))
            .cloned()
            .collect())
    }
}
