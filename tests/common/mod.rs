//! Shared test utilities: in-memory collaborators

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vavi::launcher::Spawner;
use vavi::llm::{GenerationConfig, TextGenerator};
use vavi::video::{BrowserOpener, VideoMode, VideoResult, VideoSearch};
use vavi::{Assistant, Error, Result};

/// Search backend with canned results
#[derive(Default)]
pub struct FakeSearch {
    pub results: Vec<VideoResult>,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn with_results(results: &[(&str, &str)]) -> Self {
        Self {
            results: results
                .iter()
                .map(|(id, title)| VideoResult {
                    id: (*id).to_string(),
                    title: (*title).to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Search that takes `delay` before answering with no results
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSearch for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<VideoResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Error::Search("quota exceeded".to_string()));
        }
        Ok(self.results.clone())
    }
}

/// Browser that records navigations
#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserOpener for RecordingBrowser {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Spawner that records targets and optionally fails
#[derive(Default)]
pub struct RecordingSpawner {
    pub spawned: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingSpawner {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }
}

impl Spawner for RecordingSpawner {
    fn spawn(&self, target: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Launch(format!("{target}: cannot find binary path")));
        }
        self.spawned.lock().unwrap().push(target.to_string());
        Ok(())
    }
}

/// Generator with a fixed reply
pub struct FakeGenerator {
    pub reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(Error::Generation)
    }
}

/// Collaborators behind one assistant, kept for inspection
pub struct Harness {
    pub search: Arc<FakeSearch>,
    pub browser: Arc<RecordingBrowser>,
    pub spawner: Arc<RecordingSpawner>,
    pub generator: Arc<FakeGenerator>,
}

impl Harness {
    pub fn new(search: FakeSearch, generator: FakeGenerator) -> Self {
        Self {
            search: Arc::new(search),
            browser: Arc::new(RecordingBrowser::default()),
            spawner: Arc::new(RecordingSpawner::default()),
            generator: Arc::new(generator),
        }
    }

    pub fn with_spawner(mut self, spawner: RecordingSpawner) -> Self {
        self.spawner = Arc::new(spawner);
        self
    }

    pub fn assistant(&self, mode: VideoMode) -> Assistant {
        Assistant::builder(self.search.clone())
            .spawner(self.spawner.clone())
            .browser(self.browser.clone())
            .generator(self.generator.clone())
            .video_mode(mode)
            .build()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(
            FakeSearch::with_results(&[("dQw4w9WgXcQ", "Lofi Hip Hop Radio")]),
            FakeGenerator::replying("Hello! How can I help?"),
        )
    }
}
