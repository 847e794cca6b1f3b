//! Generator doubles for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{GenerationRequest, GeneratorError, ScheduleGenerator};
use crate::models::RawShift;

/// Returns a fixed output, replaceable between calls.
pub struct CannedGenerator {
    output: Mutex<Vec<RawShift>>,
}

impl CannedGenerator {
    pub fn new(output: Vec<RawShift>) -> Self {
        Self {
            output: Mutex::new(output),
        }
    }

    pub fn set_output(&self, output: Vec<RawShift>) {
        *self.output.lock().unwrap() = output;
    }
}

#[async_trait]
impl ScheduleGenerator for CannedGenerator {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<RawShift>, GeneratorError> {
        Ok(self.output.lock().unwrap().clone())
    }
}

/// Always fails with the given error.
pub struct FailingGenerator(pub GeneratorError);

#[async_trait]
impl ScheduleGenerator for FailingGenerator {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<RawShift>, GeneratorError> {
        Err(self.0.clone())
    }
}

/// Signals `started` when called, then blocks until `release` is notified.
pub struct GatedGenerator {
    pub started: Notify,
    pub release: Notify,
    calls: AtomicUsize,
    output: Vec<RawShift>,
}

impl GatedGenerator {
    pub fn new(output: Vec<RawShift>) -> Self {
        Self {
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
            output,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleGenerator for GatedGenerator {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<RawShift>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.output.clone())
    }
}
