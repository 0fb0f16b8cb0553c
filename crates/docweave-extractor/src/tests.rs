//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        ExtractRequest, ExtractionOutput, Extractor, ExtractorConfig, RawTextSource, AGGREGATE_NOTE,
        DEFAULT_MODEL_NAME, DEFAULT_SYSTEM_INSTRUCTION,
    };
    use async_trait::async_trait;
    use docweave_domain::{
        DocumentContent, DocumentSource, DocweaveError, ErrorKind, ExtractionProfile,
        GenerationRequest, ModelProvider, MultiMode, ProviderOptions, Result, StructuredResponse,
    };
    use docweave_llm::MockProvider;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn text(name: &str) -> Arc<dyn DocumentSource> {
        Arc::new(RawTextSource::new(format!("contents of {}", name)).with_name(name))
    }

    fn docs(names: &[&str]) -> Vec<Arc<dyn DocumentSource>> {
        names.iter().map(|n| text(n)).collect()
    }

    fn extractor(provider: &MockProvider) -> Extractor {
        Extractor::new(Arc::new(provider.clone()), ExtractorConfig::default())
    }

    fn per_file(output: ExtractionOutput) -> Vec<crate::ExtractionResult> {
        match output {
            ExtractionOutput::PerFile(results) => results,
            other => panic!("expected per-file output, got {:?}", other),
        }
    }

    /// Source that counts loads and can be told to fail
    struct CountingSource {
        name: String,
        loads: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentSource for CountingSource {
        async fn load(&self) -> Result<DocumentContent> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DocweaveError::Document(format!("cannot read {}", self.name)));
            }
            Ok(DocumentContent::Text("x".to_string()))
        }

        fn display_name(&self) -> String {
            self.name.clone()
        }
    }

    /// Provider that reports neither model nor usage
    struct SilentProvider(Value);

    #[async_trait]
    impl ModelProvider for SilentProvider {
        fn name(&self) -> &str {
            "silent"
        }

        async fn generate_structured(&self, _request: GenerationRequest<'_>) -> Result<StructuredResponse> {
            Ok(StructuredResponse::new(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn test_single_document_default_mode() {
        let provider = MockProvider::new(json!({"name": "Test"}));
        let request = ExtractRequest::new(vec![Arc::new(RawTextSource::new("hello").with_name("doc1"))])
            .with_schema(json!({"type": "object", "properties": {"name": {"type": "string"}}}));

        let results = per_file(extractor(&provider).extract(request).await.unwrap());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].data, json!({"name": "Test"}));
        assert_eq!(results[0].meta.docs, vec!["doc1"]);
        assert_eq!(results[0].meta.mode, MultiMode::PerFile);
        assert_eq!(results[0].meta.model.as_deref(), Some("mock-model"));
        assert!(results[0].meta.usage.is_some());
        assert!(results[0].meta.profile.is_none());

        let call = &provider.calls()[0];
        assert_eq!(call.system_instruction.as_deref(), Some(DEFAULT_SYSTEM_INSTRUCTION));
        assert_eq!(call.model.as_deref(), Some(DEFAULT_MODEL_NAME));
    }

    #[tokio::test]
    async fn test_aggregate_mode_single_call() {
        let provider = MockProvider::new(json!({"count": 2}));
        let request = ExtractRequest::new(docs(&["a.txt", "b.txt"]))
            .with_schema(json!({"type": "object", "properties": {"count": {"type": "integer"}}}))
            .with_multi("aggregate")
            .unwrap();

        let output = extractor(&provider).extract(request).await.unwrap();
        let ExtractionOutput::Aggregate(result) = output else {
            panic!("expected aggregate output");
        };

        assert_eq!(result.data, json!({"count": 2}));
        assert_eq!(result.meta.docs, vec!["a.txt", "b.txt"]);
        assert_eq!(result.meta.mode, MultiMode::Aggregate);
        assert_eq!(provider.call_count(), 1);
        assert!(provider.prompts()[0].ends_with(AGGREGATE_NOTE));
        assert_eq!(provider.calls()[0].attachments, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_too_many_documents_rejected_before_any_work() {
        let provider = MockProvider::default();
        let loads = Arc::new(AtomicUsize::new(0));
        let sources: Vec<Arc<dyn DocumentSource>> = (0..17)
            .map(|i| {
                Arc::new(CountingSource {
                    name: format!("doc{}", i),
                    loads: loads.clone(),
                    fail: false,
                }) as Arc<dyn DocumentSource>
            })
            .collect();

        let err = extractor(&provider)
            .extract(ExtractRequest::new(sources))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DocweaveError::Extraction("Too many documents for a single extraction".to_string())
        );
        assert_eq!(provider.call_count(), 0);
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_documents() {
        let provider = MockProvider::default();
        let err = extractor(&provider)
            .extract(ExtractRequest::new(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, DocweaveError::Document("No documents provided".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_schema_fails_before_calls() {
        let provider = MockProvider::default();
        let request = ExtractRequest::new(docs(&["a"])).with_schema(json!({"type": "array"}));

        let err = extractor(&provider).extract(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_aborts() {
        let provider = MockProvider::new(json!({}));
        let request = ExtractRequest::new(docs(&["a"])).with_schema(json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        }));

        let err = extractor(&provider).extract(request).await.unwrap_err();
        assert_eq!(err, DocweaveError::Schema("Missing required field 'name'".to_string()));
    }

    #[tokio::test]
    async fn test_without_schema_output_passes_through() {
        let provider = MockProvider::new(json!({"anything": [1, 2], "free": "form"}));
        let results = per_file(
            extractor(&provider)
                .extract(ExtractRequest::new(docs(&["a"])))
                .await
                .unwrap(),
        );
        assert_eq!(results[0].data, json!({"anything": [1, 2], "free": "form"}));
    }

    #[tokio::test]
    async fn test_top_level_list_output_is_wrapped() {
        let provider = MockProvider::new(json!([{"name": "Bob", "age": "30", "nick": "B"}]));
        let request = ExtractRequest::new(docs(&["people.txt"])).with_schema(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}},
                "required": ["name"]
            }
        }));

        let results = per_file(extractor(&provider).extract(request).await.unwrap());
        assert_eq!(
            results[0].data,
            json!({"items": [{"name": "Bob", "age": 30, "extra": {"nick": "B"}}]})
        );
    }

    #[tokio::test]
    async fn test_per_file_results_keep_document_order_under_concurrency() {
        let provider = MockProvider::default();
        let names = ["d0", "d1", "d2", "d3", "d4", "d5"];
        for (i, name) in names.iter().enumerate() {
            provider.add_response(*name, json!({"doc": name}));
            // Earlier documents finish later
            provider.add_delay(*name, Duration::from_millis(10 * (names.len() - i) as u64));
        }

        let results = per_file(
            extractor(&provider)
                .extract(ExtractRequest::new(docs(&names)))
                .await
                .unwrap(),
        );

        let got: Vec<Value> = results.iter().map(|r| r.data["doc"].clone()).collect();
        let expected: Vec<Value> = names.iter().map(|n| json!(n)).collect();
        assert_eq!(got, expected);
        for (result, name) in results.iter().zip(names) {
            assert_eq!(result.meta.docs, vec![name]);
        }
    }

    #[tokio::test]
    async fn test_sequential_when_concurrency_is_one() {
        let provider = MockProvider::default();
        let config = ExtractorConfig {
            max_concurrent_calls: 1,
            ..Default::default()
        };
        let extractor = Extractor::new(Arc::new(provider.clone()), config);

        extractor
            .extract(ExtractRequest::new(docs(&["a", "b", "c"])))
            .await
            .unwrap();

        let order: Vec<String> = provider.calls().iter().map(|c| c.attachments[0].clone()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_first_failure_in_document_order_wins() {
        let provider = MockProvider::default();
        // "b" fails late, "c" fails immediately: "b" is still the reported error
        provider.add_delay("b", Duration::from_millis(100));
        provider.add_failure("b", "b broke");
        provider.add_failure("c", "c broke");

        let err = extractor(&provider)
            .extract(ExtractRequest::new(docs(&["a", "b", "c", "d"])))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.message().contains("b broke"), "got {}", err);
    }

    #[tokio::test]
    async fn test_document_load_failure() {
        let provider = MockProvider::default();
        let loads = Arc::new(AtomicUsize::new(0));
        let sources: Vec<Arc<dyn DocumentSource>> = vec![
            text("ok"),
            Arc::new(CountingSource {
                name: "broken".to_string(),
                loads: loads.clone(),
                fail: true,
            }),
        ];

        let err = extractor(&provider)
            .extract(ExtractRequest::new(sources))
            .await
            .unwrap_err();

        assert_eq!(err, DocweaveError::Document("cannot read broken".to_string()));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_both_mode_runs_per_file_then_aggregate() {
        let provider = MockProvider::new(json!({"v": 1}));
        let request = ExtractRequest::new(docs(&["a", "b"])).with_multi_mode(MultiMode::Both);

        let output = extractor(&provider).extract(request).await.unwrap();
        let ExtractionOutput::Both(multi) = output else {
            panic!("expected both output");
        };

        assert_eq!(multi.per_file.len(), 2);
        let aggregate = multi.aggregate.unwrap();
        assert_eq!(aggregate.meta.docs, vec!["a", "b"]);
        assert_eq!(aggregate.meta.mode, MultiMode::Aggregate);

        let calls = provider.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].attachments, vec!["a", "b"]);
        assert!(calls[..2].iter().all(|c| c.attachments.len() == 1));
    }

    #[tokio::test]
    async fn test_both_mode_skips_aggregate_after_per_file_failure() {
        let provider = MockProvider::default();
        provider.add_failure("a", "nope");

        let request = ExtractRequest::new(docs(&["a", "b"])).with_multi_mode(MultiMode::Both);
        assert!(extractor(&provider).extract(request).await.is_err());
        assert!(provider.calls().iter().all(|c| c.attachments.len() == 1));
    }

    #[tokio::test]
    async fn test_both_mode_scripts_aggregate_apart_from_documents() {
        let provider = MockProvider::new(json!({"v": 0}));
        provider.add_response("a", json!({"v": 1}));
        provider.add_response("a,b", json!({"v": 9}));

        let request = ExtractRequest::new(docs(&["a", "b"])).with_multi_mode(MultiMode::Both);
        let ExtractionOutput::Both(multi) = extractor(&provider).extract(request).await.unwrap() else {
            panic!("expected both output");
        };

        assert_eq!(multi.per_file[0].data, json!({"v": 1}));
        assert_eq!(multi.per_file[1].data, json!({"v": 0}));
        assert_eq!(multi.aggregate.unwrap().data, json!({"v": 9}));
    }

    #[tokio::test]
    async fn test_profile_defaults_and_precedence() {
        let provider = MockProvider::new(json!({"title": "T", "pages": "3"}));
        let profile = ExtractionProfile::new("reports/v2")
            .with_schema(
                docweave_domain::parse_schema(&json!({
                    "properties": {"title": {"type": "string"}, "pages": {"type": "integer"}}
                }))
                .unwrap(),
            )
            .with_multi_mode(MultiMode::Aggregate)
            .with_prompt("Summarize the report.")
            .with_system_instruction("Only JSON.")
            .with_options(ProviderOptions::default().with_model("profile-model").with_temperature(0.3));

        // The profile schema wins over an unusable raw schema
        let request = ExtractRequest::new(docs(&["r1", "r2"]))
            .with_profile(profile.clone())
            .with_schema(json!("not a schema"))
            .with_options(ProviderOptions::default().with_temperature(0.9));

        let output = extractor(&provider).extract(request).await.unwrap();
        let ExtractionOutput::Aggregate(result) = output else {
            panic!("profile default multi-mode should apply");
        };
        assert_eq!(result.data, json!({"title": "T", "pages": 3}));
        assert_eq!(result.meta.profile.as_deref(), Some("reports/v2"));

        let call = &provider.calls()[0];
        assert_eq!(call.prompt, format!("Summarize the report.\n\n{}", AGGREGATE_NOTE));
        assert_eq!(call.system_instruction.as_deref(), Some("Only JSON."));
        assert_eq!(call.model.as_deref(), Some("profile-model"));

        // Explicit multi-mode beats the profile default
        let request = ExtractRequest::new(docs(&["r1", "r2"]))
            .with_profile(profile)
            .with_multi_mode(MultiMode::PerFile);
        let output = extractor(&provider).extract(request).await.unwrap();
        assert_eq!(per_file(output).len(), 2);
    }

    #[tokio::test]
    async fn test_model_falls_back_to_requested_option() {
        let extractor = Extractor::new(
            Arc::new(SilentProvider(json!({}))),
            ExtractorConfig::default(),
        );

        let request = ExtractRequest::new(docs(&["a"]))
            .with_options(ProviderOptions::default().with_model("caller-model"));
        let results = per_file(extractor.extract(request).await.unwrap());
        assert_eq!(results[0].meta.model.as_deref(), Some("caller-model"));
        assert!(results[0].meta.usage.is_none());

        let results = per_file(extractor.extract(ExtractRequest::new(docs(&["a"]))).await.unwrap());
        assert_eq!(results[0].meta.model.as_deref(), Some(DEFAULT_MODEL_NAME));
    }

    #[tokio::test]
    async fn test_provider_call_timeout() {
        let provider = MockProvider::default();
        provider.add_delay("slow", Duration::from_secs(5));
        let config = ExtractorConfig {
            call_timeout_secs: Some(1),
            ..Default::default()
        };
        let extractor = Extractor::new(Arc::new(provider), config);

        let err = extractor
            .extract(ExtractRequest::new(docs(&["slow"])))
            .await
            .unwrap_err();
        assert_eq!(err, DocweaveError::Provider("Provider call timed out".to_string()));
    }

    #[tokio::test]
    async fn test_output_serialization_shape() {
        let provider = MockProvider::new(json!({"n": 1}));
        let output = extractor(&provider)
            .extract(ExtractRequest::new(docs(&["a"])))
            .await
            .unwrap();

        let value = output.to_value();
        assert!(value.is_array());
        assert_eq!(value[0]["data"], json!({"n": 1}));
        assert_eq!(value[0]["meta"]["mode"], "per_file");
        assert_eq!(value[0]["meta"]["docs"], json!(["a"]));
    }

    /// Minimal `/api/chat` endpoint that records the requested model
    async fn spawn_ollama(models: Arc<Mutex<Vec<String>>>) -> String {
        use axum::extract::State;
        use axum::routing::post;
        use axum::{Json, Router};

        async fn chat(
            State(models): State<Arc<Mutex<Vec<String>>>>,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            let model = body["model"].as_str().unwrap_or_default().to_string();
            models.lock().unwrap().push(model.clone());
            Json(json!({
                "model": model,
                "message": {"role": "assistant", "content": "{\"total\": 7}"},
                "done": true
            }))
        }

        let app = Router::new().route("/api/chat", post(chat)).with_state(models);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_default_provider_asks_ollama_for_an_ollama_model() {
        let models = Arc::new(Mutex::new(Vec::new()));
        let config = ExtractorConfig {
            ollama_endpoint: spawn_ollama(models.clone()).await,
            ..Default::default()
        };
        let extractor = Extractor::with_default_provider(config);
        assert_eq!(extractor.provider_name(), "ollama");

        let results = per_file(extractor.extract(ExtractRequest::new(docs(&["a"]))).await.unwrap());
        assert_eq!(results[0].data, json!({"total": 7}));
        assert_eq!(results[0].meta.model.as_deref(), Some(docweave_llm::ollama::DEFAULT_MODEL));
        assert_eq!(*models.lock().unwrap(), vec!["llama3.1".to_string()]);
    }
}
