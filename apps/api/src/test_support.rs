//! Test doubles for the trait seams: completion, usage, subscriptions, sessions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::analysis::extractor::ResponseExtractor;
use crate::analysis::invoker::{ModelInvoker, RetryPolicy};
use crate::analysis::pipeline::AnalysisPipeline;
use crate::auth::Authenticator;
use crate::config::Config;
use crate::llm_client::{CompletionCapability, CompletionError};
use crate::models::usage::UsageRecord;
use crate::quota::{QuotaGate, SubscriptionStore, UsageStore};
use crate::state::AppState;

pub const VALID_ANALYSIS_JSON: &str =
    r#"noise {"score":80,"recommendations":["fix X"],"optimizedContent":"..."} trailing"#;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/ats_test".to_string(),
        openai_api_key: "test-api-key".to_string(),
        openai_base_url: "http://localhost:0/v1".to_string(),
        openai_model: "gpt-4".to_string(),
        openai_temperature: 0.7,
        openai_timeout_secs: 5,
        max_free_count: 5,
        max_attempts: 3,
        strict_response_shape: true,
        max_upload_bytes: 1024 * 1024,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// One scripted reply from the completion stub.
#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    RateLimited,
    Failure(String),
}

/// Completion stub that replays a fixed script and records every prompt.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Step>>,
    repeat: Option<Step>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replies with `step` on every call.
    pub fn repeating(step: Step) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(step),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionCapability for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.repeat.clone())
            .unwrap_or_else(|| Step::Failure("script exhausted".to_string()));

        match step {
            Step::Text(text) => Ok(text),
            Step::RateLimited => Err(CompletionError::RateLimited),
            Step::Failure(message) => Err(CompletionError::Failure(message)),
        }
    }
}

#[derive(Default)]
pub struct InMemoryUsageStore {
    counts: Mutex<HashMap<Uuid, i32>>,
    failing: AtomicBool,
}

impl InMemoryUsageStore {
    pub fn set(&self, user_id: Uuid, count: i32) {
        self.counts.lock().unwrap().insert(user_id, count);
    }

    pub fn count(&self, user_id: Uuid) -> Option<i32> {
        self.counts.lock().unwrap().get(&user_id).copied()
    }

    /// Makes every subsequent increment fail.
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn get_usage(&self, user_id: Uuid) -> Result<Option<UsageRecord>> {
        let now = Utc::now();
        Ok(self.count(user_id).map(|count| UsageRecord {
            user_id,
            count,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn increment_usage(&self, user_id: Uuid) -> Result<i32> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("usage store unavailable");
        }
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(user_id).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

pub struct FixedSubscriptions {
    active: bool,
}

impl FixedSubscriptions {
    pub fn new(active: bool) -> Self {
        Self { active }
    }
}

#[async_trait]
impl SubscriptionStore for FixedSubscriptions {
    async fn is_subscribed(&self, _user_id: Uuid) -> Result<bool> {
        Ok(self.active)
    }
}

/// Accepts exactly one token, mapped to one user.
pub struct StaticAuthenticator {
    pub token: String,
    pub user_id: Uuid,
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Uuid>> {
        Ok((token == self.token).then_some(self.user_id))
    }
}

/// Full application state wired to in-memory doubles.
pub fn test_state(
    completion: Arc<ScriptedCompletion>,
    usage: Arc<InMemoryUsageStore>,
    authenticator: StaticAuthenticator,
) -> AppState {
    let config = test_config();
    let quota = Arc::new(QuotaGate::new(
        usage,
        Arc::new(FixedSubscriptions::new(false)),
        config.max_free_count,
    ));
    let pipeline = Arc::new(AnalysisPipeline::new(
        ModelInvoker::new(completion, RetryPolicy::new(config.max_attempts)),
        quota.clone(),
        ResponseExtractor::new(config.strict_response_shape),
    ));

    AppState {
        config,
        pipeline,
        quota,
        authenticator: Arc::new(authenticator),
    }
}
