//! Conversational front end over the gateway
//!
//! Seeds each exchange from stored history, enriches the system prompt with
//! user preferences and retrieved travel knowledge, then runs the tool loop
//! and stores the reply.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use roam_config::ChatConfig;
use serde_json::Value;
use thiserror::Error;

use crate::error::LlmError;
use crate::gateway::Gateway;
use crate::tools::CallerIdentity;
use crate::types::{GenerationOptions, Role, Turn};

/// Words that mark a message as a travel query worth searching for
const TRAVEL_KEYWORDS: &[&str] = &["where", "plan", "visit", "how", "trip", "travel"];

/// Errors raised by the chat collaborators
#[derive(Debug, Error)]
pub enum ChatError {
    /// History store could not be read or written
    #[error("history store error: {0}")]
    Store(String),

    /// Knowledge search failed
    #[error("knowledge search error: {0}")]
    Search(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// One persisted chat message
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
}

impl StoredMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    fn to_turn(&self) -> Turn {
        match self.role {
            Role::User => Turn::user(&self.content),
            Role::Model | Role::ToolResult => Turn::model(&self.content),
        }
    }
}

/// Conversation persistence
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, conversation_id: &str, message: StoredMessage) -> Result<(), ChatError>;

    /// Up to `limit` most recent messages, oldest first
    async fn last_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<StoredMessage>, ChatError>;
}

/// Document returned by a knowledge search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub metadata: Value,
}

/// Retrieval over travel knowledge
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ChatError>;
}

/// Process-local history keyed by conversation id
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    conversations: DashMap<String, Vec<StoredMessage>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append(&self, conversation_id: &str, message: StoredMessage) -> Result<(), ChatError> {
        self.conversations
            .entry(conversation_id.to_owned())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn last_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<StoredMessage>, ChatError> {
        Ok(self
            .conversations
            .get(conversation_id)
            .map(|messages| {
                let start = messages.len().saturating_sub(limit);
                messages[start..].to_vec()
            })
            .unwrap_or_default())
    }
}

/// One user message to answer
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    /// Logical model; the gateway default when absent
    pub model: Option<String>,
    /// Conversation to seed from and store into; stateless when absent
    pub conversation_id: Option<String>,
    pub caller: CallerIdentity,
    /// Free-form user preferences, embedded in the system prompt as JSON
    pub preferences: Option<Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, caller: CallerIdentity) -> Self {
        Self {
            message: message.into(),
            model: None,
            conversation_id: None,
            caller,
            preferences: None,
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    #[must_use]
    pub fn preferences(mut self, preferences: Value) -> Self {
        self.preferences = Some(preferences);
        self
    }
}

/// Answer to a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// Model that produced the answer, if any did
    pub model: Option<String>,
}

/// Chat orchestration over a [`Gateway`]
pub struct ChatService {
    gateway: Arc<Gateway>,
    history: Arc<dyn HistoryStore>,
    search: Option<Arc<dyn KnowledgeSearch>>,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(gateway: Arc<Gateway>, history: Arc<dyn HistoryStore>, config: ChatConfig) -> Self {
        Self {
            gateway,
            history,
            search: None,
            config,
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn KnowledgeSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Answer `request`, reading and updating its conversation history
    ///
    /// History and search failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// [`ChatError::Llm`] when the requested model is unknown.
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        // Reject before touching history so no unanswered user turn is stored
        if let Some(model) = request.model.as_deref() {
            self.gateway.catalog().resolve(model)?;
        }

        let conversation_id = request.conversation_id.as_deref();

        let (history, context) = tokio::join!(self.load_history(conversation_id), self.lookup(&request.message));

        if let Some(id) = conversation_id {
            self.store(id, StoredMessage::new(Role::User, &request.message)).await;
        }

        let system_prompt = self.system_prompt(request.preferences.as_ref(), context.as_deref());
        let mut transcript: Vec<Turn> = history.iter().map(StoredMessage::to_turn).collect();
        transcript.push(Turn::user(&request.message));

        let outcome = self
            .gateway
            .run_with_tools(
                &mut transcript,
                request.model.as_deref(),
                Some(&system_prompt),
                GenerationOptions::default(),
                &request.caller,
            )
            .await?;

        if let Some(id) = conversation_id {
            self.store(id, StoredMessage::new(Role::Model, &outcome.text)).await;
        }

        Ok(ChatReply {
            text: outcome.text,
            model: outcome.served_by,
        })
    }

    async fn load_history(&self, conversation_id: Option<&str>) -> Vec<StoredMessage> {
        let Some(id) = conversation_id else {
            return Vec::new();
        };
        match self.history.last_messages(id, self.config.history_limit).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(conversation_id = id, error = %e, "failed to load chat history");
                Vec::new()
            }
        }
    }

    /// Retrieved context for travel queries, `None` when there is nothing useful
    async fn lookup(&self, message: &str) -> Option<String> {
        let search = self.search.as_ref()?;
        if !is_travel_query(message) {
            return None;
        }

        match search.search(message).await {
            Ok(hits) if !hits.is_empty() => {
                let docs: Vec<&str> = hits.iter().map(|hit| hit.content.as_str()).collect();
                Some(format!("\nRelevant Info:\n{}", docs.join("\n")))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "knowledge search failed, answering without context");
                None
            }
        }
    }

    async fn store(&self, conversation_id: &str, message: StoredMessage) {
        if let Err(e) = self.history.append(conversation_id, message).await {
            tracing::warn!(conversation_id, error = %e, "failed to store chat message");
        }
    }

    fn system_prompt(&self, preferences: Option<&Value>, context: Option<&str>) -> String {
        let mut prompt = self.config.persona.clone();
        if let Some(preferences) = preferences.filter(|p| !p.is_null()) {
            prompt.push_str(&format!(" User prefers: {preferences}."));
        }
        if let Some(context) = context {
            prompt.push_str(&format!(" Use this context for more accurate advice: {context}"));
        }
        prompt
    }
}

fn is_travel_query(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRAVEL_KEYWORDS.iter().any(|word| lower.contains(word))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use roam_config::{LlmConfig, ProviderKind};
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::catalog::ModelCatalog;
    use crate::credentials::ProviderClientPool;
    use crate::testing::ScriptedAdapter;
    use crate::types::DispatchResult;

    struct StaticSearch {
        hits: Vec<SearchHit>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KnowledgeSearch for StaticSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl KnowledgeSearch for BrokenSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ChatError> {
            Err(ChatError::Search("index offline".into()))
        }
    }

    struct BrokenHistory;

    #[async_trait]
    impl HistoryStore for BrokenHistory {
        async fn append(&self, _conversation_id: &str, _message: StoredMessage) -> Result<(), ChatError> {
            Err(ChatError::Store("disk full".into()))
        }

        async fn last_messages(&self, _conversation_id: &str, _limit: usize) -> Result<Vec<StoredMessage>, ChatError> {
            Err(ChatError::Store("disk full".into()))
        }
    }

    /// Gateway whose Google model echoes the system prompt it received
    fn echo_gateway(prompts: Arc<Mutex<Vec<String>>>) -> (Arc<Gateway>, Arc<ScriptedAdapter>) {
        let google = Arc::new(ScriptedAdapter::new(ProviderKind::Google, move |_, request| {
            prompts
                .lock()
                .unwrap()
                .push(request.system_prompt.unwrap_or_default().to_owned());
            Ok(DispatchResult::Text(format!("seen {} turns", request.transcript.len())))
        }));
        let mut pool = ProviderClientPool::new();
        pool.insert(ProviderKind::Google, Arc::<ScriptedAdapter>::clone(&google), vec![SecretString::from("key")]);
        let gateway = Gateway::from_parts(ModelCatalog::builtin(), pool, &LlmConfig::default()).unwrap();
        (Arc::new(gateway), google)
    }

    fn caller() -> CallerIdentity {
        CallerIdentity::new("user-7")
    }

    #[tokio::test]
    async fn history_is_replayed_and_extended() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let (gateway, google) = echo_gateway(Arc::clone(&prompts));
        let history = Arc::new(InMemoryHistory::new());
        let service = ChatService::new(gateway, Arc::<InMemoryHistory>::clone(&history), ChatConfig::default());

        let first = service
            .respond(ChatRequest::new("Hi there", caller()).conversation("c1"))
            .await
            .unwrap();
        let second = service
            .respond(ChatRequest::new("And again", caller()).conversation("c1"))
            .await
            .unwrap();

        assert_eq!(first.text, "seen 1 turns");
        assert_eq!(second.text, "seen 3 turns");
        assert_eq!(second.model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(google.transcript_lengths(), vec![1, 3]);

        let stored = history.last_messages("c1", 10).await.unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[3], StoredMessage::new(Role::Model, "seen 3 turns"));
    }

    #[tokio::test]
    async fn history_window_is_bounded() {
        let history = InMemoryHistory::new();
        for i in 0..15 {
            history
                .append("c1", StoredMessage::new(Role::User, format!("m{i}")))
                .await
                .unwrap();
        }

        let last = history.last_messages("c1", 10).await.unwrap();

        assert_eq!(last.len(), 10);
        assert_eq!(last[0].content, "m5");
        assert!(history.last_messages("other", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn travel_queries_pull_in_search_context() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let (gateway, _) = echo_gateway(Arc::clone(&prompts));
        let search = Arc::new(StaticSearch {
            hits: vec![SearchHit {
                content: "Kyoto is best in autumn.".into(),
                metadata: json!({"source": "guide"}),
            }],
            calls: AtomicUsize::new(0),
        });
        let service = ChatService::new(gateway, Arc::new(InMemoryHistory::new()), ChatConfig::default())
            .with_search(Arc::<StaticSearch>::clone(&search));

        service
            .respond(ChatRequest::new("When should I visit Kyoto?", caller()).preferences(json!({"budget": "mid"})))
            .await
            .unwrap();
        service
            .respond(ChatRequest::new("Thanks!", caller()))
            .await
            .unwrap();

        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        let prompts = prompts.lock().unwrap();
        assert!(prompts[0].starts_with("You are RoamIQ"));
        assert!(prompts[0].contains(r#"User prefers: {"budget":"mid"}."#));
        assert!(prompts[0].contains("Use this context for more accurate advice: \nRelevant Info:\nKyoto is best in autumn."));
        assert!(!prompts[1].contains("Relevant Info"));
    }

    #[tokio::test]
    async fn collaborator_failures_do_not_abort_the_reply() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let (gateway, _) = echo_gateway(prompts);
        let service =
            ChatService::new(gateway, Arc::new(BrokenHistory), ChatConfig::default()).with_search(Arc::new(BrokenSearch));

        let reply = service
            .respond(ChatRequest::new("Plan a trip to Peru", caller()).conversation("c1"))
            .await
            .unwrap();

        assert_eq!(reply.text, "seen 1 turns");
    }

    #[tokio::test]
    async fn unknown_model_is_reported() {
        let (gateway, _) = echo_gateway(Arc::new(Mutex::new(Vec::new())));
        let history = Arc::new(InMemoryHistory::new());
        let service = ChatService::new(gateway, history.clone(), ChatConfig::default());

        let err = service
            .respond(
                ChatRequest::new("hello", caller())
                    .model("gpt-5-ultra")
                    .conversation("c-unknown"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Llm(LlmError::UnknownModel { .. })));
        assert!(history.last_messages("c-unknown", 10).await.unwrap().is_empty());
    }

    #[test]
    fn travel_keywords_are_case_insensitive() {
        assert!(is_travel_query("WHERE should I go?"));
        assert!(!is_travel_query("Thanks a lot"));
    }
}
