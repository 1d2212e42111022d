//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use vismatch::{Category, FileHandle, MatchingService, Product, Result};

/// Request as seen by the fake service, e.g. `url:https://x/a.jpg:Men`.
pub type Recorded = String;

struct Inner {
    responses: Mutex<VecDeque<Result<Vec<Product>>>>,
    requests: Mutex<Vec<Recorded>>,
    calls: AtomicUsize,
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

/// Counts a call as outstanding until it finishes or its future is dropped.
struct Outstanding<'a>(&'a Inner);

impl<'a> Outstanding<'a> {
    fn enter(inner: &'a Inner) -> Self {
        let now = inner.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        inner.peak_outstanding.fetch_max(now, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for Outstanding<'_> {
    fn drop(&mut self) {
        self.0.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Matching service that replays scripted responses.
///
/// With a gate, every call blocks until the gate is notified, which lets a
/// test observe the session while a request is in flight.
#[derive(Clone)]
pub struct ScriptedService {
    inner: Arc<Inner>,
}

impl ScriptedService {
    pub fn new(responses: Vec<Result<Vec<Product>>>) -> Self {
        Self::build(responses, None)
    }

    pub fn gated(responses: Vec<Result<Vec<Product>>>, gate: Arc<Notify>) -> Self {
        Self::build(responses, Some(gate))
    }

    fn build(responses: Vec<Result<Vec<Product>>>, gate: Option<Arc<Notify>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                outstanding: AtomicUsize::new(0),
                peak_outstanding: AtomicUsize::new(0),
                gate,
            }),
        }
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Calls started but neither finished nor dropped.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of calls ever outstanding at once.
    pub fn peak_outstanding(&self) -> usize {
        self.inner.peak_outstanding.load(Ordering::SeqCst)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.requests.lock().unwrap().clone()
    }

    async fn respond(&self, recorded: Recorded) -> Result<Vec<Product>> {
        let _outstanding = Outstanding::enter(&self.inner);
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.requests.lock().unwrap().push(recorded);
        if let Some(gate) = &self.inner.gate {
            gate.notified().await;
        }
        let next = self.inner.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn category_label(category: Option<Category>) -> &'static str {
    category.map(|c| c.as_str()).unwrap_or("-")
}

#[async_trait]
impl MatchingService for ScriptedService {
    async fn search_by_file(
        &self,
        file: &FileHandle,
        category: Option<Category>,
    ) -> Result<Vec<Product>> {
        self.respond(format!("file:{}:{}", file.name(), category_label(category)))
            .await
    }

    async fn search_by_url(&self, url: &str, category: Option<Category>) -> Result<Vec<Product>> {
        self.respond(format!("url:{}:{}", url, category_label(category)))
            .await
    }
}

/// `[{"Red Shirt",0.72},{"Blue Jeans",0.45}]`
pub fn shirt_and_jeans() -> Vec<Product> {
    vec![
        Product::new("a1b2c3d4e5f6", "Red Shirt", 0.72),
        Product::new("f6e5d4c3b2a1", "Blue Jeans", 0.45),
    ]
}

pub fn image() -> FileHandle {
    FileHandle::from_bytes("query.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}
