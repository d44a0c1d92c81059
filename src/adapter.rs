//! The recipe adaptation pipeline.
//!
//! One run drives five stages against a [`CompletionService`]:
//!
//! 1. **Filter**: is the input a dish or recipe at all? A rejection ends the run.
//! 2. **Normalize**: rewrite the input into a consistent recipe layout.
//! 3. **Brainstorm**: list substitutions that satisfy the restrictions.
//! 4. **Integrate**: rewrite the normalized recipe using those suggestions.
//! 5. **Verify**: does the rewrite satisfy every restriction?
//!
//! A rejected verification restarts the cycle from Normalize (Filter is not
//! repeated) until the retry budget is spent. Only the final, verified recipe
//! is ever returned.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use crate::api_connection::{
    ApiConnectionError, ChatCompletionRequest, ChatMessage, CompletionService, DEFAULT_MODEL,
};
use crate::prompts::{restriction_preamble, PromptSet};
use crate::verdict::VerdictPolicy;

/// Applied by callers when a request names no restrictions.
pub const DEFAULT_RESTRICTION: &str = "vegetarian";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Filter,
    Normalize,
    Brainstorm,
    Integrate,
    Verify,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Filter => "filter",
            Stage::Normalize => "normalize",
            Stage::Brainstorm => "brainstorm",
            Stage::Integrate => "integrate",
            Stage::Verify => "verify",
        }
    }

    /// Position in the adaptation chain, as phrased to the model.
    pub(crate) fn ordinal(self) -> &'static str {
        match self {
            Stage::Filter | Stage::Normalize => "first",
            Stage::Brainstorm => "second",
            Stage::Integrate => "third",
            Stage::Verify => "fourth",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, non-empty list of dietary restriction labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RestrictionSet(Vec<String>);

impl RestrictionSet {
    /// Blank labels are dropped; `None` if nothing remains.
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .filter(|label| !label.trim().is_empty())
            .collect();
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    /// Like [`RestrictionSet::new`], falling back to [`DEFAULT_RESTRICTION`].
    pub fn with_default<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(labels).unwrap_or_else(|| Self(vec![DEFAULT_RESTRICTION.to_string()]))
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NotARecipe,
    VerificationFailed,
    RetryBudgetExhausted { attempts: u32 },
    ServiceError { stage: Stage, message: String },
    Timeout { stage: Stage },
}

impl FailureReason {
    /// Short explanation suitable for end users.
    pub fn user_message(&self) -> String {
        match self {
            FailureReason::NotARecipe => {
                "We could not identify this as a dish or recipe".to_string()
            }
            FailureReason::VerificationFailed => {
                "We couldn't produce an adaptation that meets your dietary restrictions. Please try again.".to_string()
            }
            FailureReason::RetryBudgetExhausted { attempts } => format!(
                "We couldn't produce an adaptation that meets your dietary restrictions after {attempts} attempts. Please try again."
            ),
            FailureReason::ServiceError { .. } => {
                "Something went wrong talking to the adaptation service. Please try again shortly.".to_string()
            }
            FailureReason::Timeout { .. } => {
                "The adaptation service took too long to respond. Please try again shortly.".to_string()
            }
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotARecipe => write!(f, "input rejected by filter stage"),
            FailureReason::VerificationFailed => write!(f, "verification rejected the adapted recipe"),
            FailureReason::RetryBudgetExhausted { attempts } => {
                write!(f, "verification failed on all {attempts} attempts")
            }
            FailureReason::ServiceError { stage, message } => {
                write!(f, "completion service failed during {stage} stage: {message}")
            }
            FailureReason::Timeout { stage } => write!(f, "{stage} stage timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Success(String),
    Failure(FailureReason),
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success(_))
    }
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub model: String,
    /// Full restarts allowed after a failed verification.
    pub max_retries: u32,
    pub stage_timeout: Duration,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub filter_policy: VerdictPolicy,
    pub verify_policy: VerdictPolicy,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            temperature: None,
            max_tokens: None,
            filter_policy: VerdictPolicy::Tolerant,
            verify_policy: VerdictPolicy::Strict,
        }
    }
}

/// Stateless between runs; share one instance across concurrent requests.
pub struct RecipeAdapter {
    service: Arc<dyn CompletionService>,
    prompts: PromptSet,
    config: AdapterConfig,
}

impl RecipeAdapter {
    pub fn new(service: Arc<dyn CompletionService>, prompts: PromptSet, config: AdapterConfig) -> Self {
        Self {
            service,
            prompts,
            config,
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Adapt `recipe` to `restrictions`.
    ///
    /// `restrictions` is non-empty by construction; see
    /// [`RestrictionSet::with_default`] for the usual caller policy.
    #[tracing::instrument(skip_all, fields(restrictions = %restrictions.joined()))]
    pub async fn adapt(&self, recipe: &str, restrictions: &RestrictionSet) -> PipelineResult {
        match self.run(recipe, restrictions).await {
            Ok(text) => PipelineResult::Success(text),
            Err(reason) => {
                tracing::warn!(%reason, "recipe adaptation failed");
                PipelineResult::Failure(reason)
            }
        }
    }

    async fn run(&self, recipe: &str, restrictions: &RestrictionSet) -> Result<String, FailureReason> {
        if recipe.trim().is_empty() {
            return Err(FailureReason::NotARecipe);
        }

        let filter_reply = self.call_stage(Stage::Filter, restrictions, recipe.to_string()).await?;
        if !self.config.filter_policy.accepts(&filter_reply) {
            tracing::info!(reply = %filter_reply, "filter stage rejected input");
            return Err(FailureReason::NotARecipe);
        }

        let attempts = self.config.max_retries.saturating_add(1);
        for attempt in 1..=attempts {
            tracing::info!(attempt, attempts, "starting adaptation cycle");
            let candidate = self.run_cycle(recipe, restrictions).await?;

            let verify_reply = self
                .call_stage(Stage::Verify, restrictions, candidate.clone())
                .await?;
            if self.config.verify_policy.accepts(&verify_reply) {
                tracing::info!(attempt, "adapted recipe verified");
                return Ok(candidate);
            }
            tracing::warn!(attempt, attempts, reply = %verify_reply, "verification rejected adapted recipe");
        }

        if self.config.max_retries == 0 {
            Err(FailureReason::VerificationFailed)
        } else {
            Err(FailureReason::RetryBudgetExhausted { attempts })
        }
    }

    /// Normalize, Brainstorm and Integrate. Returns the candidate recipe.
    async fn run_cycle(&self, recipe: &str, restrictions: &RestrictionSet) -> Result<String, FailureReason> {
        let normalized = self
            .call_stage(Stage::Normalize, restrictions, recipe.to_string())
            .await?;
        let suggestions = self
            .call_stage(Stage::Brainstorm, restrictions, normalized.clone())
            .await?;
        self.call_stage(
            Stage::Integrate,
            restrictions,
            integration_input(&normalized, &suggestions),
        )
        .await
    }

    fn system_text(&self, stage: Stage, restrictions: &RestrictionSet) -> String {
        let template = self.prompts.template(stage);
        match stage {
            Stage::Filter | Stage::Normalize => template.to_string(),
            Stage::Brainstorm | Stage::Integrate | Stage::Verify => {
                restriction_preamble(stage, &restrictions.joined()) + template
            }
        }
    }

    async fn call_stage(
        &self,
        stage: Stage,
        restrictions: &RestrictionSet,
        input: String,
    ) -> Result<String, FailureReason> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_text(stage, restrictions)),
                ChatMessage::user(input),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(%stage, "calling completion service");
        match timeout(self.config.stage_timeout, self.service.complete(request)).await {
            Ok(Ok(output)) => {
                tracing::debug!(%stage, %output, "stage output");
                Ok(output)
            }
            Ok(Err(ApiConnectionError::Timeout)) | Err(_) => Err(FailureReason::Timeout { stage }),
            Ok(Err(err)) => Err(FailureReason::ServiceError {
                stage,
                message: err.to_string(),
            }),
        }
    }
}

/// User message for the Integrate stage. The label text is part of the
/// model-facing contract and must not change.
pub fn integration_input(normalized: &str, suggestions: &str) -> String {
    format!("Original recipe:\n{normalized}Suggestions for making vegetarian:\n{suggestions}")
}
