use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use finassist_docs::DocumentStore;
use finassist_models::{
    AgentKind, AgentRequest, AgentResult, AppConfig, OrchestratorConfig, Query, RagConfig,
    Response, Route,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agent::Agent;
use crate::error::AgentError;
use crate::parser::{is_relevant, without_error_lines};
use crate::router::QueryRouter;
use crate::synthesizer::Synthesizer;
use crate::tts::SpeechSynthesizer;

/// Routes each query to the matching agents, runs them concurrently and
/// merges their answers.
pub struct Orchestrator {
    agents: Vec<Arc<dyn Agent>>,
    router: QueryRouter,
    synthesizer: Synthesizer,
    documents: Option<Arc<DocumentStore>>,
    voice: Option<Arc<dyn SpeechSynthesizer>>,
    config: OrchestratorConfig,
    rag: RagConfig,
}

impl Orchestrator {
    pub fn new(
        agents: Vec<Arc<dyn Agent>>,
        router: QueryRouter,
        synthesizer: Synthesizer,
        config: &AppConfig,
    ) -> Self {
        Self {
            agents,
            router,
            synthesizer,
            documents: None,
            voice: None,
            config: config.orchestrator.clone(),
            rag: config.rag.clone(),
        }
    }

    pub fn with_documents(mut self, documents: Arc<DocumentStore>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_voice(mut self, voice: Arc<dyn SpeechSynthesizer>) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn has_agent(&self, kind: AgentKind) -> bool {
        self.agent(kind).is_some()
    }

    fn agent(&self, kind: AgentKind) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.kind() == kind)
    }

    /// Answer a query end to end.
    pub async fn handle(&self, query: &Query) -> Result<Response, AgentError> {
        if query.is_blank() {
            return Err(AgentError::EmptyQuery);
        }
        let start = Instant::now();
        info!(query_id = %query.id, "Handling query");

        // 1. Retrieve document context
        let context = self.retrieve_context(query).await;

        // 2. Route
        let route = self.router.route(&query.text, context.is_some()).await;

        // 3. Fan out to the route's agents
        let request = AgentRequest::new(query.clone(), route, context);
        let results = self.run_agents(route.agents(), &request).await;

        // 4. Fall back to web search when market data is missing or off-topic
        let fallback = if self.needs_news_fallback(route, &query.text, &results) {
            info!(query_id = %query.id, "Market data unusable, falling back to web search");
            self.run_agents(&[AgentKind::News], &request).await.pop()
        } else {
            None
        };

        // 5. Synthesize and format
        let text = self
            .synthesizer
            .synthesize(&query.text, route, &results, fallback.as_ref())
            .await;
        let text = self.synthesizer.format(text).await;

        // 6. Voice
        let (audio, audio_error) = if query.options.speak {
            self.speak(&text, query.options.voice_id.as_deref()).await
        } else {
            (None, None)
        };

        let mut agent_results = results;
        agent_results.extend(fallback);

        let response = Response {
            id: Uuid::new_v4(),
            query_id: query.id,
            route,
            text,
            agent_results,
            audio,
            audio_error,
            responded_at: Utc::now(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            query_id = %query.id,
            route = %route,
            failed_agents = response.failed_agents().count(),
            elapsed_ms = response.processing_time_ms,
            "Query complete"
        );
        Ok(response)
    }

    async fn retrieve_context(&self, query: &Query) -> Option<String> {
        let store = self.documents.as_ref()?;
        if !store.has_documents().await {
            return None;
        }
        match store
            .context_for_query(&query.text, self.rag.top_k, &query.documents)
            .await
        {
            Ok(context) if context.trim().chars().count() > self.rag.min_context_chars => {
                Some(context)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Document retrieval failed");
                None
            }
        }
    }

    fn needs_news_fallback(&self, route: Route, query: &str, results: &[AgentResult]) -> bool {
        if !self.config.news_fallback || route != Route::ApiAgent {
            return false;
        }
        results
            .iter()
            .find(|r| r.kind == AgentKind::MarketData)
            .is_some_and(|r| {
                !r.is_ok() || !is_relevant(query, &without_error_lines(&r.text))
            })
    }

    /// Run the agents for `kinds` concurrently, one task each, and collect
    /// results in `kinds` order. Missing agents and failures become inline
    /// error results.
    async fn run_agents(&self, kinds: &[AgentKind], request: &AgentRequest) -> Vec<AgentResult> {
        let mut handles = Vec::new();
        for &kind in kinds {
            let Some(agent) = self.agent(kind).map(Arc::clone) else {
                handles.push((kind, None));
                continue;
            };
            let request = request.clone();
            handles.push((
                kind,
                Some(tokio::spawn(async move {
                    let agent_start = Instant::now();
                    let result = agent.run(&request).await;
                    (agent.name().to_string(), result, agent_start.elapsed())
                })),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let Some(handle) = handle else {
                let e = AgentError::NotConfigured(format!("{kind} agent"));
                warn!(agent = %kind, "Agent not configured");
                results.push(AgentResult::failed(kind.to_string(), kind, e.to_string(), 0));
                continue;
            };
            match handle.await {
                Ok((name, Ok(output), elapsed)) => {
                    info!(agent = %name, elapsed_ms = elapsed.as_millis() as u64, "Agent succeeded");
                    results.push(AgentResult::succeeded(
                        name,
                        kind,
                        output.text,
                        output.data,
                        elapsed.as_millis() as u64,
                    ));
                }
                Ok((name, Err(e), elapsed)) => {
                    warn!(agent = %name, error = %e, elapsed_ms = elapsed.as_millis() as u64, "Agent failed");
                    results.push(AgentResult::failed(
                        name,
                        kind,
                        e.to_string(),
                        elapsed.as_millis() as u64,
                    ));
                }
                Err(e) => {
                    error!(agent = %kind, error = %e, "Agent task panicked");
                    results.push(AgentResult::failed(
                        kind.to_string(),
                        kind,
                        "agent task panicked",
                        0,
                    ));
                }
            }
        }
        results
    }

    async fn speak(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> (Option<finassist_models::AudioClip>, Option<String>) {
        let Some(voice) = &self.voice else {
            return (
                None,
                Some("text-to-speech is not configured".to_string()),
            );
        };
        let voice_id = voice_id.unwrap_or(voice.default_voice());
        match voice.synthesize(text, voice_id).await {
            Ok(clip) => (Some(clip), None),
            Err(e) => {
                warn!(voice = %voice_id, error = %e, "Speech generation failed");
                (None, Some(e.to_string()))
            }
        }
    }
}
