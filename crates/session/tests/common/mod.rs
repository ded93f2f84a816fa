#![allow(dead_code)]

//! In-memory [`ImageService`] used by the session integration tests.
//!
//! Search results come from a per-term image list sliced by page. Calls
//! can be held at a gate, failed on demand, or slowed down; every call is
//! recorded for later assertions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use lumen_client::api::ApiError;
use lumen_client::service::ImageService;
use lumen_client::wire::{SearchRequest, SearchResponse, TagChangeRequest, UploadFile};
use lumen_core::types::{Image, Quality};
use lumen_events::bus::EventBus;
use lumen_session::config::SessionConfig;
use lumen_session::session::Session;

/// How a scripted call should fail.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Server,
    Unauthorized,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Server => ApiError::Api {
                status: 503,
                body: "unavailable".to_string(),
            },
            Failure::Unauthorized => ApiError::SessionExpired,
        }
    }
}

#[derive(Default)]
pub struct FakeService {
    terms: Mutex<HashMap<String, Vec<Image>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    search_failures: Mutex<VecDeque<Failure>>,
    failing_uploads: Mutex<HashMap<String, Failure>>,
    upload_delay: Mutex<Duration>,
    pub searches: Mutex<Vec<SearchRequest>>,
    pub uploads: Mutex<Vec<String>>,
    pub tag_calls: Mutex<Vec<(&'static str, TagChangeRequest)>>,
    pub prefetches: Mutex<Vec<(String, Quality)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Results for `term`, served `limit` at a time.
    pub fn with_term(&self, term: &str, images: Vec<Image>) -> &Self {
        self.terms.lock().unwrap().insert(term.to_string(), images);
        self
    }

    /// Hold searches for `term` until [`release`](Self::release) is called.
    pub fn gate(&self, term: &str) -> &Self {
        self.gates
            .lock()
            .unwrap()
            .insert(term.to_string(), Arc::new(Notify::new()));
        self
    }

    pub fn release(&self, term: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(term) {
            gate.notify_one();
        }
    }

    pub fn fail_next_search(&self, failure: Failure) {
        self.search_failures.lock().unwrap().push_back(failure);
    }

    pub fn fail_upload(&self, filename: &str, failure: Failure) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(filename.to_string(), failure);
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = delay;
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn uploaded(&self) -> HashSet<String> {
        self.uploads.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl ImageService for FakeService {
    async fn list_images(&self) -> Result<Vec<Image>, ApiError> {
        Ok(self
            .terms
            .lock()
            .unwrap()
            .get("")
            .cloned()
            .unwrap_or_default())
    }

    async fn search_images(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.searches.lock().unwrap().push(request.clone());

        let gate = self.gates.lock().unwrap().get(&request.query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(failure) = self.search_failures.lock().unwrap().pop_front() {
            return Err(failure.into_error());
        }

        let all = self
            .terms
            .lock()
            .unwrap()
            .get(&request.query)
            .cloned()
            .unwrap_or_default();
        let start = ((request.page - 1) * request.limit) as usize;
        let images: Vec<Image> = all
            .iter()
            .skip(start)
            .take(request.limit as usize)
            .cloned()
            .collect();
        Ok(SearchResponse {
            has_more: Some(start + images.len() < all.len()),
            total: Some(all.len() as u64),
            images,
        })
    }

    async fn upload_image(&self, file: &UploadFile) -> Result<(), ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.upload_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = self
            .failing_uploads
            .lock()
            .unwrap()
            .get(&file.filename)
            .copied();
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        self.uploads.lock().unwrap().push(file.filename.clone());
        Ok(())
    }

    async fn add_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError> {
        self.tag_calls.lock().unwrap().push(("add", body.clone()));
        Ok(())
    }

    async fn remove_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError> {
        self.tag_calls.lock().unwrap().push(("remove", body.clone()));
        Ok(())
    }

    async fn prefetch_image(&self, id: &str, quality: Quality) -> Result<(), ApiError> {
        self.prefetches
            .lock()
            .unwrap()
            .push((id.to_string(), quality));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// `count` square images with ids `{prefix}-{n}`.
pub fn images(prefix: &str, count: usize) -> Vec<Image> {
    (0..count)
        .map(|n| Image::new(format!("{prefix}-{n}"), "", 1.0, Vec::new()).unwrap())
        .collect()
}

pub fn tagged(id: &str, tags: &[&str]) -> Image {
    Image::new(id, "", 1.0, tags.iter().map(|t| t.to_string())).unwrap()
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        search_debounce: Duration::from_millis(250),
        ..SessionConfig::default()
    }
}

pub fn session_with(service: Arc<FakeService>, config: SessionConfig) -> (Session, Arc<EventBus>) {
    let bus = Arc::new(EventBus::default());
    let session = Session::new(config, service, bus.clone());
    (session, bus)
}

pub fn session(service: Arc<FakeService>) -> (Session, Arc<EventBus>) {
    session_with(service, test_config())
}

pub fn ids(images: &[Image]) -> Vec<String> {
    images.iter().map(|image| image.id.clone()).collect()
}
