//! Shared doubles for the integration tests
//!
//! `ScriptedModel` recognises which pipeline stage is calling from the
//! prompt it receives, so one instance can stand in for every role.

#![allow(dead_code)]

use async_trait::async_trait;
use shopbuddy::config::{BotConfig, ConfigFile, ModelConfig};
use shopbuddy::memory::{Embedder, KnowledgeStore};
use shopbuddy::models::ChatModel;
use shopbuddy::rag::RetrievalEngine;
use shopbuddy::types::ChatMessage;
use shopbuddy::{AssistantError, ResponsePipeline, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pipeline stage a model call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Rewrite,
    Classify,
    Generate,
    Validate,
}

impl Stage {
    fn detect(prompt: &str) -> Stage {
        if prompt.contains("Pytanie użytkownika: \"") {
            Stage::Rewrite
        } else if prompt.contains("Klasyfikuj to pytanie") {
            Stage::Classify
        } else if prompt.contains("Oceń odpowiedź") {
            Stage::Validate
        } else {
            Stage::Generate
        }
    }
}

/// One recorded model call
#[derive(Debug, Clone)]
pub struct Call {
    pub stage: Stage,
    pub prompt: String,
    pub model: String,
}

#[derive(Default)]
struct Script {
    labels: Vec<(String, String)>,
    substitutions: Vec<(String, String)>,
    answers: VecDeque<String>,
    scores: VecDeque<String>,
    failing: HashSet<Stage>,
    slow: Option<(Stage, Duration)>,
    calls: Vec<Call>,
}

/// Deterministic chat model driven by a script
///
/// Defaults: every question is ON_TOPIC, rewrites echo the question,
/// answers are "Odpowiedź testowa." and every score is 9.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify questions containing `needle` as `label`
    pub fn label(self, needle: &str, label: &str) -> Self {
        self.with(|s| s.labels.push((needle.to_string(), label.to_string())))
    }

    /// Replace `from` with `to` when rewriting
    pub fn substitute(self, from: &str, to: &str) -> Self {
        self.with(|s| s.substitutions.push((from.to_string(), to.to_string())))
    }

    /// Queue generated answers; the last one repeats
    pub fn answers(self, answers: &[&str]) -> Self {
        self.with(|s| s.answers.extend(answers.iter().map(|a| a.to_string())))
    }

    /// Queue raw validator replies; the last one repeats
    pub fn scores(self, scores: &[&str]) -> Self {
        self.with(|s| s.scores.extend(scores.iter().map(|a| a.to_string())))
    }

    /// Make every call of `stage` fail
    pub fn failing(self, stage: Stage) -> Self {
        self.with(|s| {
            s.failing.insert(stage);
        })
    }

    /// Make every call of `stage` sleep first
    pub fn slow(self, stage: Stage, delay: Duration) -> Self {
        self.with(|s| s.slow = Some((stage, delay)))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, stage: Stage) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.stage == stage).collect()
    }

    fn with(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.script.lock().unwrap());
        self
    }
}

fn next_or_last(queue: &mut VecDeque<String>, default: &str) -> String {
    if queue.len() > 1 {
        queue.pop_front().unwrap_or_default()
    } else {
        queue.front().cloned().unwrap_or_else(|| default.to_string())
    }
}

fn quoted_after(prompt: &str, marker: &str) -> String {
    prompt
        .split(marker)
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], config: &ModelConfig) -> Result<String> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let stage = Stage::detect(&prompt);

        let delay = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call {
                stage,
                prompt: prompt.clone(),
                model: config.name.clone(),
            });
            script.slow.filter(|(s, _)| *s == stage).map(|(_, d)| d)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock().unwrap();
        if script.failing.contains(&stage) {
            return Err(AssistantError::CallFailure(format!("{:?} unavailable", stage)));
        }

        let reply = match stage {
            Stage::Rewrite => {
                let mut question = quoted_after(&prompt, "Pytanie użytkownika: \"");
                for (from, to) in &script.substitutions {
                    question = question.replace(from.as_str(), to.as_str());
                }
                question
            }
            Stage::Classify => {
                let question = quoted_after(&prompt, "Klasyfikuj to pytanie:\n\"");
                script
                    .labels
                    .iter()
                    .find(|(needle, _)| question.contains(needle.as_str()))
                    .map(|(_, label)| label.clone())
                    .unwrap_or_else(|| "ON_TOPIC".to_string())
            }
            Stage::Generate => next_or_last(&mut script.answers, "Odpowiedź testowa."),
            Stage::Validate => next_or_last(&mut script.scores, "9"),
        };
        Ok(reply)
    }
}

/// Hashed bag-of-words embedder
///
/// Texts sharing words get similar vectors, which is enough to make
/// retrieval order meaningful without a real model. Every text it encodes
/// is remembered, corpus first, then queries in call order.
#[derive(Default)]
pub struct KeywordEmbedder {
    seen: Mutex<Vec<String>>,
}

pub const KEYWORD_DIM: usize = 32;

impl KeywordEmbedder {
    pub fn embedded(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Embedder for KeywordEmbedder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.seen
            .lock()
            .unwrap()
            .extend(texts.iter().map(|t| t.to_string()));
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; KEYWORD_DIM];
                for word in text
                    .to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| w.len() > 2)
                {
                    let bucket = word.bytes().fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
                    vector[bucket % KEYWORD_DIM] += 1.0;
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        KEYWORD_DIM
    }
}

pub fn facts() -> Vec<String> {
    vec![
        "Monstera deliciosa lubi jasne, rozproszone światło i podlewanie raz w tygodniu.".to_string(),
        "Dostawa kurierem trwa 1-2 dni robocze.".to_string(),
        "Zwroty przyjmujemy do 14 dni od otrzymania przesyłki.".to_string(),
        "Sansewieria znosi cień i rzadkie podlewanie.".to_string(),
        "Kontakt z obsługą klienta: pomoc@zielonydoom.pl.".to_string(),
    ]
}

pub fn retriever() -> RetrievalEngine {
    retriever_with(Arc::new(KeywordEmbedder::default()))
}

pub fn retriever_with(embedder: Arc<KeywordEmbedder>) -> RetrievalEngine {
    let store = KnowledgeStore::build(facts(), embedder.as_ref()).unwrap();
    RetrievalEngine::new(Arc::new(store), embedder)
}

pub fn config() -> BotConfig {
    BotConfig::resolve(ConfigFile::default()).unwrap()
}

pub fn pipeline_with(config: &BotConfig, model: &ScriptedModel) -> Arc<ResponsePipeline> {
    Arc::new(ResponsePipeline::new(config, Arc::new(model.clone()), retriever()))
}

pub fn pipeline(model: &ScriptedModel) -> Arc<ResponsePipeline> {
    pipeline_with(&config(), model)
}

/// Default pipeline plus the embedder its retriever uses
pub fn pipeline_and_embedder(model: &ScriptedModel) -> (Arc<ResponsePipeline>, Arc<KeywordEmbedder>) {
    let embedder = Arc::new(KeywordEmbedder::default());
    let retriever = retriever_with(Arc::clone(&embedder));
    let pipeline = Arc::new(ResponsePipeline::new(&config(), Arc::new(model.clone()), retriever));
    (pipeline, embedder)
}
