//! The corrective retrieval state machine.
//!
//! ```text
//! ROUTE ──kb──▶ RETRIEVE ──correction──▶ RELEVANCE_FILTER ──dropped──▶ WEB_SEARCH
//!   │              │                          │                          │
//!   └──web─────────┼──────────────────────────┼────────────▶ WEB_SEARCH  │
//!                  └──────────▶ GENERATE ◀────┘ all kept                 │
//!                                  ▲  ◀──────────────────────────────────┘
//!                                  │
//!      verify: not grounded ─▶ WEB_SEARCH (feedback)
//!              grounded, off-topic ─▶ GENERATE (feedback)
//!              grounded, on-topic ─▶ DONE
//! ```
//!
//! Feedback edges are counted. Once `max_iterations` of them have been taken
//! the next one fails the run with [`AppError::LoopBoundExceeded`].

use crate::answer_check::AnswerChecker;
use crate::deadline::within;
use crate::filter::RelevanceFilter;
use crate::generator::AnswerGenerator;
use crate::grader::DocumentGrader;
use crate::groundedness::GroundednessChecker;
use crate::router::QueryRouter;
use crate::state::{RunState, Stage};
use crate::verdict::Route;
use corag_core::{AppError, AppResult, PipelineConfig, WebEvidenceMode};
use corag_knowledge::{Evidence, Retriever, WebSearcher};
use corag_prompt::NOT_AVAILABLE_MARKER;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Collaborators the orchestrator is wired with.
#[derive(Clone)]
pub struct Components {
    pub router: Arc<dyn QueryRouter>,
    pub retriever: Arc<dyn Retriever>,
    pub web_searcher: Arc<dyn WebSearcher>,
    pub grader: Arc<dyn DocumentGrader>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub groundedness: Arc<dyn GroundednessChecker>,
    pub answer_checker: Arc<dyn AnswerChecker>,
}

/// Orchestration policy.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Feedback re-entries allowed per run.
    pub max_iterations: u32,
    /// Limit for each external call; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    /// Grading calls in flight during a filter pass.
    pub filter_concurrency: usize,
    pub web_evidence: WebEvidenceMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for OrchestratorConfig {
    fn from(pipeline: &PipelineConfig) -> Self {
        Self {
            max_iterations: pipeline.max_iterations,
            call_timeout: pipeline.call_timeout(),
            filter_concurrency: pipeline.filter_concurrency,
            web_evidence: pipeline.web_evidence,
        }
    }
}

/// What a successful run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub question: String,
    pub evidence: Vec<Evidence>,
    pub answer: String,
    /// Feedback re-entries taken.
    pub iterations: u32,
    /// False when the answer carries the "not available" marker.
    pub answer_found: bool,
    /// Stages visited, in order, ending with [`Stage::Done`].
    pub stages: Vec<Stage>,
}

pub struct Orchestrator {
    components: Components,
    filter: RelevanceFilter,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(components: Components, config: OrchestratorConfig) -> Self {
        let filter = RelevanceFilter::new(components.grader.clone(), config.filter_concurrency)
            .with_call_timeout(config.call_timeout);

        Self {
            components,
            filter,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Answer one question.
    ///
    /// Each call runs in isolation with its own [`RunState`]. Any
    /// classification, retrieval or generation failure ends the run; no
    /// partial answer is returned.
    pub async fn answer(&self, question: &str, correction_enabled: bool) -> AppResult<RunOutcome> {
        if question.trim().is_empty() {
            return Err(AppError::InvalidInput("Question cannot be empty".to_string()));
        }

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, correction = correction_enabled);

        self.run(RunState::new(question, correction_enabled))
            .instrument(span)
            .await
    }

    async fn run(&self, mut state: RunState) -> AppResult<RunOutcome> {
        let mut stages = Vec::new();
        let mut stage = Stage::Route;

        loop {
            stages.push(stage);
            tracing::info!(stage = %stage, iteration = state.iteration_count, "Entering stage");

            stage = match stage {
                Stage::Route => self.route(&state).await?,
                Stage::Retrieve => self.retrieve(&mut state).await?,
                Stage::RelevanceFilter => self.relevance_filter(&mut state).await?,
                Stage::WebSearch => self.web_search(&mut state).await?,
                Stage::Generate => {
                    self.generate(&mut state).await?;
                    self.verify(&mut state).await?
                }
                Stage::Done => break,
            };
        }

        let answer = state.candidate_answer.unwrap_or_default();
        let answer_found = !answer
            .to_lowercase()
            .contains(&NOT_AVAILABLE_MARKER.to_lowercase());

        tracing::info!(
            iterations = state.iteration_count,
            evidence = state.evidence.len(),
            answer_found,
            "Run finished"
        );

        Ok(RunOutcome {
            question: state.question,
            evidence: state.evidence,
            answer,
            iterations: state.iteration_count,
            answer_found,
            stages,
        })
    }

    async fn route(&self, state: &RunState) -> AppResult<Stage> {
        let route = within(
            self.config.call_timeout,
            AppError::Classification,
            "routing",
            self.components.router.route(&state.question),
        )
        .await?;

        tracing::debug!(%route, "Question routed");

        Ok(match route {
            Route::KnowledgeBase => Stage::Retrieve,
            Route::WebSearch => Stage::WebSearch,
        })
    }

    async fn retrieve(&self, state: &mut RunState) -> AppResult<Stage> {
        state.evidence = within(
            self.config.call_timeout,
            AppError::Retrieval,
            "retrieval",
            self.components.retriever.retrieve(&state.question),
        )
        .await?;

        Ok(if state.correction_enabled {
            Stage::RelevanceFilter
        } else {
            Stage::Generate
        })
    }

    async fn relevance_filter(&self, state: &mut RunState) -> AppResult<Stage> {
        state.use_web_search = false;

        let evidence = std::mem::take(&mut state.evidence);
        let outcome = self.filter.filter(&state.question, evidence).await?;

        state.evidence = outcome.retained;
        state.use_web_search = outcome.needs_more_evidence;

        Ok(if state.use_web_search {
            Stage::WebSearch
        } else {
            Stage::Generate
        })
    }

    async fn web_search(&self, state: &mut RunState) -> AppResult<Stage> {
        let found = within(
            self.config.call_timeout,
            AppError::Retrieval,
            "web search",
            self.components.web_searcher.search(&state.question),
        )
        .await?;

        match self.config.web_evidence {
            WebEvidenceMode::Replace => state.evidence = found,
            WebEvidenceMode::Append => state.evidence.extend(found),
        }

        Ok(Stage::Generate)
    }

    async fn generate(&self, state: &mut RunState) -> AppResult<()> {
        let answer = within(
            self.config.call_timeout,
            AppError::Generation,
            "generation",
            self.components
                .generator
                .generate(&state.question, &state.evidence),
        )
        .await?;

        state.candidate_answer = Some(answer);
        Ok(())
    }

    /// Decide where to go after a generation.
    ///
    /// Answer relevance is only asked once groundedness has passed.
    async fn verify(&self, state: &mut RunState) -> AppResult<Stage> {
        let Some(answer) = state.candidate_answer.as_deref() else {
            return Err(AppError::Generation(
                "Verification reached without a candidate answer".to_string(),
            ));
        };

        let grounded = within(
            self.config.call_timeout,
            AppError::Classification,
            "groundedness check",
            self.components
                .groundedness
                .is_grounded(&state.question, answer, &state.evidence),
        )
        .await?;

        if !grounded {
            tracing::info!("Answer not grounded in evidence");
            state.answer_is_resolved = Some(false);
            return self.feedback(state, Stage::WebSearch);
        }

        let addresses = within(
            self.config.call_timeout,
            AppError::Classification,
            "answer relevance check",
            self.components
                .answer_checker
                .answers_question(&state.question, answer),
        )
        .await?;

        state.answer_is_resolved = Some(addresses);

        if addresses {
            Ok(Stage::Done)
        } else {
            tracing::info!("Answer does not address the question");
            self.feedback(state, Stage::Generate)
        }
    }

    /// Take a feedback edge into `target`, or fail once the bound is spent.
    fn feedback(&self, state: &mut RunState, target: Stage) -> AppResult<Stage> {
        if state.iteration_count >= self.config.max_iterations {
            tracing::warn!(
                limit = self.config.max_iterations,
                stage = %target,
                "Feedback loop bound reached"
            );
            return Err(AppError::LoopBoundExceeded {
                limit: self.config.max_iterations,
                stage: target.to_string(),
            });
        }

        state.iteration_count += 1;
        Ok(target)
    }
}
