//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::prompt::PromptBuilder;
use crate::types::{
    ExtractRequest, ExtractionOutput, ExtractionResult, MultiResult, ResultMeta, SchemaInput,
};
use docweave_domain::{
    normalize_output, parse_schema, validate_output, Attachment, DocumentSource, DocweaveError,
    ExtractionProfile, GenerationRequest, InternalSchema, ModelProvider, MultiMode,
    ProviderOptions, Result,
};
use docweave_llm::OllamaProvider;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Load a single document into an attachment
fn load_document(source: Arc<dyn DocumentSource>) -> BoxFuture<'static, Result<Attachment>> {
    async move {
        let name = source.display_name();
        let content = source.load().await?;
        debug!(doc = %name, bytes = content.len(), "Loaded document");
        Ok::<_, DocweaveError>(Attachment::new(name, content))
    }
    .boxed()
}

/// Settings shared by every provider call of one extraction
struct CallPlan<'a> {
    schema: Option<&'a InternalSchema>,
    options: &'a ProviderOptions,
    system_instruction: &'a str,
    profile: Option<&'a str>,
}

/// Orchestrates schema resolution, document loading and provider calls
pub struct Extractor {
    provider: Arc<dyn ModelProvider>,
    config: ExtractorConfig,
}

impl Extractor {
    /// Create an Extractor around an explicit provider
    pub fn new(provider: Arc<dyn ModelProvider>, config: ExtractorConfig) -> Self {
        Self { provider, config }
    }

    /// Create an Extractor backed by Ollama at `config.ollama_endpoint`
    pub fn with_default_provider(config: ExtractorConfig) -> Self {
        let provider = OllamaProvider::new(config.ollama_endpoint.clone(), config.default_model.clone());
        Self::new(Arc::new(provider), config)
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one extraction
    ///
    /// Document count is checked before anything is loaded or called. Any
    /// load, provider or validation failure aborts the whole extraction.
    pub async fn extract(&self, request: ExtractRequest) -> Result<ExtractionOutput> {
        let ExtractRequest {
            docs,
            schema,
            profile,
            options,
            multi_mode,
        } = request;

        if docs.is_empty() {
            return Err(DocweaveError::Document("No documents provided".to_string()));
        }
        if docs.len() > self.config.max_docs_per_extraction {
            return Err(DocweaveError::Extraction(
                "Too many documents for a single extraction".to_string(),
            ));
        }

        let schema = resolve_schema(profile.as_ref(), schema)?;
        let mode = multi_mode
            .or_else(|| profile.as_ref().map(|p| p.multi_mode_default))
            .unwrap_or(self.config.default_multi_mode);
        let options = self.resolve_options(profile.as_ref(), options.as_ref());
        let profile_name = profile.as_ref().map(|p| p.name.as_str());

        info!(
            docs = docs.len(),
            mode = %mode,
            profile = profile_name.unwrap_or("-"),
            provider = self.provider.name(),
            "Starting extraction"
        );
        let started = Instant::now();

        let attachments = self.load_documents(&docs).await?;

        let prompts = PromptBuilder::new(profile.as_ref());
        let plan = CallPlan {
            schema: schema.as_ref(),
            options: &options,
            system_instruction: prompts.system_instruction(),
            profile: profile_name,
        };

        let output = match mode {
            MultiMode::PerFile => {
                ExtractionOutput::PerFile(self.run_per_file(&plan, &prompts.build(), &attachments).await?)
            }
            MultiMode::Aggregate => {
                let prompt = prompts.aggregate(true).build();
                ExtractionOutput::Aggregate(self.run_aggregate(&plan, &prompt, &attachments).await?)
            }
            MultiMode::Both => {
                let per_file = self.run_per_file(&plan, &prompts.build(), &attachments).await?;
                let prompt = prompts.aggregate(true).build();
                let aggregate = self.run_aggregate(&plan, &prompt, &attachments).await?;
                ExtractionOutput::Both(MultiResult {
                    per_file,
                    aggregate: Some(aggregate),
                })
            }
        };

        info!(
            results = output.results().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction complete"
        );
        Ok(output)
    }

    /// Compiled defaults, then profile defaults, then per-call overrides
    fn resolve_options(
        &self,
        profile: Option<&ExtractionProfile>,
        overrides: Option<&ProviderOptions>,
    ) -> ProviderOptions {
        let mut options = self.config.default_options();
        if let Some(profile) = profile {
            options = options.merged(&profile.provider_options);
        }
        if let Some(overrides) = overrides {
            options = options.merged(overrides);
        }
        options
    }

    async fn load_documents(&self, docs: &[Arc<dyn DocumentSource>]) -> Result<Vec<Attachment>> {
        let loads: Vec<_> = docs.iter().cloned().map(load_document).collect();
        stream::iter(loads)
            .buffered(self.config.max_concurrent_calls.max(1))
            .try_collect()
            .await
    }

    /// One call per document. Results come back in document order; the
    /// first failure in that order drops the stream and cancels the rest.
    async fn run_per_file(
        &self,
        plan: &CallPlan<'_>,
        prompt: &str,
        attachments: &[Attachment],
    ) -> Result<Vec<ExtractionResult>> {
        stream::iter(0..attachments.len())
            .map(|idx| {
                self.run_call(plan, prompt, &attachments[idx..idx + 1], MultiMode::PerFile)
            })
            .buffered(self.config.max_concurrent_calls.max(1))
            .try_collect()
            .await
    }

    async fn run_aggregate(
        &self,
        plan: &CallPlan<'_>,
        prompt: &str,
        attachments: &[Attachment],
    ) -> Result<ExtractionResult> {
        self.run_call(plan, prompt, attachments, MultiMode::Aggregate).await
    }

    async fn run_call(
        &self,
        plan: &CallPlan<'_>,
        prompt: &str,
        attachments: &[Attachment],
        mode: MultiMode,
    ) -> Result<ExtractionResult> {
        let docs: Vec<String> = attachments.iter().map(|a| a.name.clone()).collect();
        debug!(docs = ?docs, prompt_len = prompt.len(), mode = %mode, "Calling provider");

        let request = GenerationRequest {
            prompt,
            schema: plan.schema,
            options: Some(plan.options),
            system_instruction: Some(plan.system_instruction),
            attachments,
        };

        let call = self.provider.generate_structured(request);
        let response = match self.config.call_timeout() {
            Some(limit) => timeout(limit, call)
                .await
                .map_err(|_| DocweaveError::Provider("Provider call timed out".to_string()))??,
            None => call.await?,
        };

        let data = match plan.schema {
            Some(schema) => {
                if let Err(err) = validate_output(schema, &response.data) {
                    warn!(docs = ?docs, error = %err, "Provider output failed validation");
                    return Err(err);
                }
                normalize_output(schema, &response.data)
            }
            None => response.data,
        };

        let model = response
            .model
            .or_else(|| plan.options.model().map(str::to_string));

        Ok(ExtractionResult {
            data,
            meta: ResultMeta {
                model,
                usage: response.usage,
                docs,
                mode,
                profile: plan.profile.map(str::to_string),
            },
        })
    }
}

/// Profile schema wins, then a raw declaration, then an already parsed one
fn resolve_schema(
    profile: Option<&ExtractionProfile>,
    input: SchemaInput,
) -> Result<Option<InternalSchema>> {
    if let Some(schema) = profile.and_then(|p| p.schema.clone()) {
        return Ok(Some(schema));
    }
    match input {
        SchemaInput::Raw(raw) => parse_schema(&raw).map(Some),
        SchemaInput::Internal(schema) => Ok(Some(schema)),
        SchemaInput::None => Ok(None),
    }
}
