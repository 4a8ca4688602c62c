//! Conversation orchestrator
//!
//! Runs the exchange pipeline: load the session, append the user turn,
//! retrieve knowledge, complete, append the reply, refresh the long-term
//! summary, save. The history window is re-trimmed around every append.
//! All mutation happens on the in-memory record until the single save at
//! the end, so a failure anywhere leaves the stored session as the last
//! exchange left it.
//!
//! Exchanges for the same identifier are serialized through a per-identifier
//! lock; different identifiers never contend.

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::prompt::{compose_system_message, flatten_transcript};
use crate::session::SessionRecord;
use crate::store::SessionStore;
use banter_knowledge::Retriever;
use banter_llm::{CompletionProvider, CompletionRequest, Message};
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Stream of reply fragments from a streaming exchange.
///
/// An `Err` item is terminal: the exchange was abandoned and the stored
/// session was left untouched. Dropping the stream mid-way abandons the
/// exchange the same way.
pub type ExchangeStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Conversation orchestrator
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn CompletionProvider>,
    retriever: Retriever,
    store: Arc<dyn SessionStore>,
    config: OrchestratorConfig,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    /// Create an orchestrator over the given provider, retriever and store
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        retriever: Retriever,
        store: Arc<dyn SessionStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            retriever,
            store,
            config,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// The settings this orchestrator runs with
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn identifier_lock(&self, identifier: &str) -> Arc<Mutex<()>> {
        self.locks.entry(identifier.to_string()).or_default().clone()
    }

    /// Run one exchange and return the whole reply at once
    #[instrument(skip(self, user_text), fields(identifier = %identifier))]
    pub async fn exchange(&self, identifier: &str, user_text: &str) -> Result<String> {
        let lock = self.identifier_lock(identifier);
        let _guard = lock.lock().await;

        let mut record = self.store.get_or_create(identifier).await?;

        record.push_user(user_text);
        record.truncate_to(self.config.chat_limit);

        let system = self.compose_system(&record, user_text).await?;
        let request = self.completion_request(system, &record);

        let response = self.provider.complete(request).await?;
        let reply = response.content;

        self.finish_exchange(&mut record, reply.clone()).await?;
        Ok(reply)
    }

    /// Run one exchange, surfacing reply fragments as they arrive.
    ///
    /// The session is appended to, summarized and saved only after the
    /// final fragment, immediately before the stream ends. A transport
    /// fault mid-reply surfaces as an `Err` item and abandons the
    /// exchange unsaved.
    pub fn exchange_streaming(&self, identifier: &str, user_text: &str) -> ExchangeStream {
        let orchestrator = self.clone();
        let lock = self.identifier_lock(identifier);
        let identifier = identifier.to_string();
        let user_text = user_text.to_string();

        Box::pin(async_stream::stream! {
            let _guard = lock.lock_owned().await;

            let mut record = match orchestrator.store.get_or_create(&identifier).await {
                Ok(record) => record,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            record.push_user(&user_text);
            record.truncate_to(orchestrator.config.chat_limit);

            let system = match orchestrator.compose_system(&record, &user_text).await {
                Ok(system) => system,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let request = orchestrator.completion_request(system, &record);
            let mut fragments = orchestrator.provider.complete_streaming(request);
            let mut reply = String::new();

            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        reply.push_str(&fragment);
                        yield Ok(fragment);
                    }
                    Err(e) => {
                        warn!(identifier = %identifier, error = %e, "Reply stream faulted; exchange abandoned");
                        yield Err(Error::Llm(e));
                        return;
                    }
                }
            }

            if let Err(e) = orchestrator.finish_exchange(&mut record, reply).await {
                yield Err(e);
            }
        })
    }

    async fn compose_system(&self, record: &SessionRecord, user_text: &str) -> Result<String> {
        let knowledge = self
            .retriever
            .retrieve(user_text, self.config.knowledge_results)
            .await?;
        Ok(compose_system_message(
            &self.config.system_message,
            &knowledge,
            &record.ltm,
        ))
    }

    fn completion_request(&self, system: String, record: &SessionRecord) -> CompletionRequest {
        CompletionRequest::new(&self.config.model)
            .with_message(Message::system(system))
            .with_messages(record.messages.clone())
    }

    async fn finish_exchange(&self, record: &mut SessionRecord, reply: String) -> Result<()> {
        record.push_assistant(reply);
        record.truncate_to(self.config.chat_limit);

        record.ltm = self.refresh_summary(record).await?;

        self.store.save(record).await?;
        debug!(
            identifier = %record.name,
            turns = record.turn_count(),
            "Exchange persisted"
        );
        Ok(())
    }

    /// Summarize the post-truncation window into the next long-term summary
    async fn refresh_summary(&self, record: &SessionRecord) -> Result<String> {
        let request = CompletionRequest::new(&self.config.model)
            .with_message(Message::system(&self.config.summary_instruction))
            .with_message(Message::user(flatten_transcript(&record.messages)));

        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::INITIAL_SUMMARY;
    use crate::store::MemoryStore;
    use banter_knowledge::{Passage, PassageIndex, StaticIndex};
    use banter_llm::{CompletionResponse, FragmentStream, MessageRole, MockProvider};

    struct FailingProvider;

    #[async_trait::async_trait]
    impl CompletionProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> banter_llm::Result<CompletionResponse> {
            Err(banter_llm::Error::Api("scripted failure".to_string()))
        }

        fn complete_streaming(&self, _request: CompletionRequest) -> FragmentStream {
            futures::stream::iter(vec![Err(banter_llm::Error::Api(
                "scripted failure".to_string(),
            ))])
            .boxed()
        }
    }

    struct FailingIndex;

    #[async_trait::async_trait]
    impl PassageIndex for FailingIndex {
        async fn query(
            &self,
            _text: &str,
            _n_results: usize,
        ) -> banter_knowledge::Result<Vec<Passage>> {
            Err(banter_knowledge::Error::Network("index offline".to_string()))
        }
    }

    fn test_orchestrator(
        provider: Arc<dyn CompletionProvider>,
        config: OrchestratorConfig,
    ) -> (Orchestrator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let retriever = Retriever::new(Arc::new(StaticIndex::empty()));
        let orchestrator = Orchestrator::new(provider, retriever, store.clone(), config);
        (orchestrator, store)
    }

    #[tokio::test]
    async fn test_exchange_returns_reply_and_persists() {
        let provider = Arc::new(MockProvider::new());
        provider.add_reply("hello there");
        provider.add_reply("greeted the user");
        let (orchestrator, store) =
            test_orchestrator(provider.clone(), OrchestratorConfig::default());

        let reply = orchestrator.exchange("alice", "hi").await.unwrap();
        assert_eq!(reply, "hello there");

        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
        assert_eq!(record.messages[0].role, MessageRole::User);
        assert_eq!(record.messages[0].content, "hi");
        assert_eq!(record.messages[1].role, MessageRole::Assistant);
        assert_eq!(record.messages[1].content, "hello there");
        assert_eq!(record.ltm, "greeted the user");
    }

    #[tokio::test]
    async fn test_exchange_composes_system_message() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(StaticIndex::with_passages(vec![Passage::new(
            "foo", "http://x", 2,
        )]));
        let orchestrator = Orchestrator::new(
            provider.clone(),
            Retriever::new(index.clone()),
            store,
            OrchestratorConfig::default(),
        );

        orchestrator.exchange("alice", "hi").await.unwrap();

        // The retriever saw the user's text with the configured passage count
        assert_eq!(index.queries(), vec![("hi".to_string(), 5)]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);

        let system = &requests[0].messages[0];
        assert_eq!(system.role, MessageRole::System);
        assert_eq!(
            system.content,
            "You are a helpful assistant.\n\n\
             # My Knowledge\n## From http://x (paragraph 2)\nfoo\n\n\n\
             Summary of my conversation with the user:\n\
             This is the first time I've ever talked to this user."
        );
        assert_eq!(requests[0].messages[1].content, "hi");

        // The summary refresh sees the instruction plus the flat transcript
        assert_eq!(requests[1].messages[0].content, "Summarize the conversation.");
        assert_eq!(
            requests[1].messages[1].content,
            "user: hi\nassistant: mock response"
        );
    }

    #[tokio::test]
    async fn test_exchange_uses_configured_model() {
        let provider = Arc::new(MockProvider::new());
        let (orchestrator, _store) = test_orchestrator(
            provider.clone(),
            OrchestratorConfig::default().with_model("custom-model"),
        );

        orchestrator.exchange("alice", "hi").await.unwrap();
        assert_eq!(provider.requests()[0].model, "custom-model");
    }

    #[tokio::test]
    async fn test_chat_limit_two_scenario() {
        let provider = Arc::new(MockProvider::new());
        provider.add_reply("r1");
        provider.add_reply("summary after hi");
        provider.add_reply("r2");
        provider.add_reply("summary after bye");
        let (orchestrator, store) = test_orchestrator(
            provider.clone(),
            OrchestratorConfig::default().with_chat_limit(2),
        );

        orchestrator.exchange("alice", "hi").await.unwrap();
        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.messages[0].content, "hi");
        assert_eq!(record.messages[1].content, "r1");

        orchestrator.exchange("alice", "bye").await.unwrap();
        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
        assert_eq!(record.messages[0].content, "bye");
        assert_eq!(record.messages[1].content, "r2");
        assert_eq!(record.ltm, "summary after bye");

        let requests = provider.requests();
        // Second exchange sent the trimmed window: [assistant r1, user bye]
        assert_eq!(requests[2].messages.len(), 3);
        assert_eq!(requests[2].messages[1].content, "r1");
        assert_eq!(requests[2].messages[2].content, "bye");
        // And the summary refresh saw the post-truncation transcript
        assert_eq!(requests[3].messages[1].content, "user: bye\nassistant: r2");
    }

    #[tokio::test]
    async fn test_history_never_exceeds_limit() {
        let provider = Arc::new(MockProvider::new());
        let (orchestrator, store) = test_orchestrator(
            provider,
            OrchestratorConfig::default().with_chat_limit(4),
        );

        for i in 0..5 {
            orchestrator
                .exchange("alice", &format!("msg{i}"))
                .await
                .unwrap();
            let record = store.get("alice").await.unwrap().unwrap();
            assert!(record.turn_count() <= 4);
        }

        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 4);
    }

    #[tokio::test]
    async fn test_empty_user_text_is_a_normal_turn() {
        let provider = Arc::new(MockProvider::new());
        let (orchestrator, store) =
            test_orchestrator(provider, OrchestratorConfig::default());

        orchestrator.exchange("alice", "").await.unwrap();

        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.messages[0].role, MessageRole::User);
        assert_eq!(record.messages[0].content, "");
    }

    #[tokio::test]
    async fn test_failed_completion_leaves_record_unchanged() {
        let (orchestrator, store) =
            test_orchestrator(Arc::new(FailingProvider), OrchestratorConfig::default());

        let result = orchestrator.exchange("alice", "hi").await;
        assert!(result.is_err());

        // First contact persisted the default record; the failed turn did not
        let record = store.get("alice").await.unwrap().unwrap();
        assert!(record.messages.is_empty());
        assert_eq!(record.ltm, INITIAL_SUMMARY);
    }

    #[tokio::test]
    async fn test_failed_retrieval_skips_completion() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Orchestrator::new(
            provider.clone(),
            Retriever::new(Arc::new(FailingIndex)),
            store.clone(),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.exchange("alice", "hi").await;
        assert!(result.is_err());
        assert!(provider.requests().is_empty());

        let record = store.get("alice").await.unwrap().unwrap();
        assert!(record.messages.is_empty());
    }

    #[tokio::test]
    async fn test_streaming_exchange_persists_after_fragments() {
        let provider = Arc::new(MockProvider::new());
        provider.add_stream(&["Hi", " there"]);
        provider.add_reply("streamed summary");
        let (orchestrator, store) =
            test_orchestrator(provider.clone(), OrchestratorConfig::default());

        let mut stream = orchestrator.exchange_streaming("alice", "greetings");
        let mut fragments = Vec::new();
        while let Some(item) = stream.next().await {
            fragments.push(item.unwrap());
        }
        assert_eq!(fragments, vec!["Hi", " there"]);

        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
        assert_eq!(record.messages[1].content, "Hi there");
        assert_eq!(record.ltm, "streamed summary");
    }

    #[tokio::test]
    async fn test_streaming_fault_abandons_exchange() {
        let provider = Arc::new(MockProvider::new());
        provider.add_stream_with_fault(&["par"], "connection reset");
        let (orchestrator, store) =
            test_orchestrator(provider.clone(), OrchestratorConfig::default());

        let mut stream = orchestrator.exchange_streaming("alice", "hi");
        assert_eq!(stream.next().await.unwrap().unwrap(), "par");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());

        // No summary request was made and nothing beyond first contact persisted
        assert_eq!(provider.requests().len(), 1);
        let record = store.get("alice").await.unwrap().unwrap();
        assert!(record.messages.is_empty());
        assert_eq!(record.ltm, INITIAL_SUMMARY);
    }

    #[tokio::test]
    async fn test_dropped_stream_abandons_exchange() {
        let provider = Arc::new(MockProvider::new());
        provider.add_stream(&["one", "two"]);
        let (orchestrator, store) =
            test_orchestrator(provider.clone(), OrchestratorConfig::default());

        let mut stream = orchestrator.exchange_streaming("alice", "hi");
        assert_eq!(stream.next().await.unwrap().unwrap(), "one");
        drop(stream);

        let record = store.get("alice").await.unwrap().unwrap();
        assert!(record.messages.is_empty());

        // The identifier's lock was released with the stream
        provider.add_reply("r");
        provider.add_reply("s");
        let reply = orchestrator.exchange("alice", "hi again").await.unwrap();
        assert_eq!(reply, "r");
    }

    #[tokio::test]
    async fn test_concurrent_exchanges_serialize_per_identifier() {
        let provider = Arc::new(MockProvider::new());
        let (orchestrator, store) =
            test_orchestrator(provider, OrchestratorConfig::default());

        let first = orchestrator.exchange("alice", "first");
        let second = orchestrator.exchange("alice", "second");
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        // Serialized read-modify-write keeps all four turns
        let record = store.get("alice").await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 4);
        let user_turns: Vec<&str> = record
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect();
        assert!(user_turns.contains(&"first"));
        assert!(user_turns.contains(&"second"));
    }

    #[tokio::test]
    async fn test_identifiers_do_not_share_state() {
        let provider = Arc::new(MockProvider::new());
        let (orchestrator, store) =
            test_orchestrator(provider, OrchestratorConfig::default());

        orchestrator.exchange("alice", "from alice").await.unwrap();
        orchestrator.exchange("bob", "from bob").await.unwrap();

        let alice = store.get("alice").await.unwrap().unwrap();
        let bob = store.get("bob").await.unwrap().unwrap();
        assert_eq!(alice.turn_count(), 2);
        assert_eq!(bob.turn_count(), 2);
        assert_eq!(alice.messages[0].content, "from alice");
        assert_eq!(bob.messages[0].content, "from bob");
    }
}
