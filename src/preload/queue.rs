//! Background photo decoding.
//!
//! - Small worker pool decodes and downscales photos off the main thread
//! - Decoded pixels are kept in an LRU so rebuilt cards reuse them
//! - Results are delivered on the GTK main thread in batches
//! - Uses flume for communication between workers and main thread

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use glib::ControlFlow;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, trace, warn};

use crate::image_loader::{decode_to_fit, DecodedImage};
use crate::models::PhotoId;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Maximum number of worker threads.
const MAX_WORKERS: usize = 4;

/// Batch delivery interval on the main thread.
const BATCH_UPDATE_MS: u64 = 16;

/// Maximum number of requests waiting for a worker.
const MAX_QUEUE_SIZE: usize = 64;

/// Decoded images kept in memory.
const CACHE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecodeKey {
    path: PathBuf,
    max_width: u32,
    max_height: u32,
}

/// Where a decoded photo is going to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePurpose {
    Card,
    Lightbox,
}

#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub id: PhotoId,
    pub path: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub purpose: DecodePurpose,
}

impl DecodeRequest {
    pub fn new(id: PhotoId, path: PathBuf, max_width: u32, max_height: u32) -> Self {
        Self {
            id,
            path,
            max_width,
            max_height,
            purpose: DecodePurpose::Card,
        }
    }

    pub fn for_lightbox(mut self) -> Self {
        self.purpose = DecodePurpose::Lightbox;
        self
    }

    fn key(&self) -> DecodeKey {
        DecodeKey {
            path: self.path.clone(),
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

/// Outcome of a decode, successful or not.
#[derive(Debug, Clone)]
pub struct DecodedPhoto {
    pub id: PhotoId,
    pub path: PathBuf,
    pub purpose: DecodePurpose,
    pub image: Option<Arc<DecodedImage>>,
    pub error: Option<String>,
}

type DecodeCache = Arc<Mutex<LruCache<DecodeKey, Arc<DecodedImage>>>>;

pub struct DecodeQueue {
    request_tx: Sender<DecodeRequest>,
    result_tx: Sender<DecodedPhoto>,
    result_rx: Receiver<DecodedPhoto>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    /// Keys currently being decoded.
    pending: Arc<RwLock<HashSet<DecodeKey>>>,
    cache: DecodeCache,
    batch_source_id: Mutex<Option<glib::SourceId>>,
}

impl DecodeQueue {
    pub fn new(workers: usize) -> Result<Self> {
        let num_workers = workers.clamp(1, MAX_WORKERS);

        let (request_tx, request_rx) = flume::bounded(MAX_QUEUE_SIZE);
        let (result_tx, result_rx) = flume::unbounded();

        let shutdown = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(RwLock::new(HashSet::new()));
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).context("Decode cache needs capacity")?;
        let cache: DecodeCache = Arc::new(Mutex::new(LruCache::new(capacity)));

        let mut worker_handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            let shutdown = Arc::clone(&shutdown);
            let pending = Arc::clone(&pending);
            let cache = Arc::clone(&cache);

            let handle = thread::Builder::new()
                .name(format!("decode-worker-{}", worker_id))
                .spawn(move || worker_loop(worker_id, rx, tx, shutdown, pending, cache))
                .context("Failed to spawn decode worker")?;
            worker_handles.push(handle);
        }

        debug!(num_workers, "Started photo decode queue");

        Ok(Self {
            request_tx,
            result_tx,
            result_rx,
            workers: worker_handles,
            shutdown,
            pending,
            cache,
            batch_source_id: Mutex::new(None),
        })
    }

    /// Submits a decode. Cached images are answered right away.
    ///
    /// Returns false if the request was dropped (duplicate, full queue, or shut down).
    pub fn request(&self, req: DecodeRequest) -> bool {
        let key = req.key();

        if let Some(image) = self.cache.lock().get(&key).cloned() {
            trace!(path = ?req.path, "Decode cache hit");
            let _ = self.result_tx.send(DecodedPhoto {
                id: req.id,
                path: req.path,
                purpose: req.purpose,
                image: Some(image),
                error: None,
            });
            return true;
        }

        if !self.pending.write().insert(key.clone()) {
            trace!(path = ?req.path, "Decode already pending");
            return false;
        }

        match self.request_tx.try_send(req) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(req)) => {
                warn!(path = ?req.path, "Decode queue full, dropping request");
                self.pending.write().remove(&key);
                false
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                error!("Decode queue disconnected");
                self.pending.write().remove(&key);
                false
            }
        }
    }

    pub fn request_batch(&self, requests: impl IntoIterator<Item = DecodeRequest>) -> usize {
        requests
            .into_iter()
            .map(|req| self.request(req))
            .filter(|submitted| *submitted)
            .count()
    }

    /// Completed decodes, without blocking.
    #[cfg(test)]
    pub fn poll_results(&self) -> Vec<DecodedPhoto> {
        self.result_rx.try_iter().collect()
    }

    /// Delivers completed decodes to `on_ready` on the GTK main thread.
    pub fn start_batch_processing<F>(&self, on_ready: F)
    where
        F: Fn(DecodedPhoto) + 'static,
    {
        self.stop_batch_processing();
        let result_rx = self.result_rx.clone();
        let source_id =
            glib::timeout_add_local(Duration::from_millis(BATCH_UPDATE_MS), move || {
                for result in result_rx.try_iter() {
                    on_ready(result);
                }
                ControlFlow::Continue
            });
        *self.batch_source_id.lock() = Some(source_id);
        debug!("Started decode batch processing");
    }

    pub fn stop_batch_processing(&self) {
        if let Some(source_id) = self.batch_source_id.lock().take() {
            source_id.remove();
            debug!("Stopped decode batch processing");
        }
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }

    #[cfg(test)]
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn shutdown(&mut self) {
        debug!("Shutting down decode queue");
        self.shutdown.store(true, Ordering::SeqCst);
        self.stop_batch_processing();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("Decode queue shutdown complete");
    }
}

impl Drop for DecodeQueue {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

fn worker_loop(
    worker_id: usize,
    rx: Receiver<DecodeRequest>,
    tx: Sender<DecodedPhoto>,
    shutdown: Arc<AtomicBool>,
    pending: Arc<RwLock<HashSet<DecodeKey>>>,
    cache: DecodeCache,
) {
    debug!(worker_id, "Decode worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(req) => {
                let key = req.key();
                let result = process_request(req);
                if let Some(image) = &result.image {
                    cache.lock().put(key.clone(), Arc::clone(image));
                }
                pending.write().remove(&key);

                if let Err(e) = tx.send(result) {
                    warn!(worker_id, error = ?e, "Failed to send decode result");
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker_id, "Decode worker stopped");
}

fn process_request(req: DecodeRequest) -> DecodedPhoto {
    trace!(path = ?req.path, "Decoding photo");

    match decode_to_fit(&req.path, req.max_width, req.max_height) {
        Ok(image) => DecodedPhoto {
            id: req.id,
            path: req.path,
            purpose: req.purpose,
            image: Some(Arc::new(image)),
            error: None,
        },
        Err(e) => {
            warn!(path = ?req.path, error = ?e, "Failed to decode photo");
            DecodedPhoto {
                id: req.id,
                path: req.path,
                purpose: req.purpose,
                image: None,
                error: Some(format!("{e:#}")),
            }
        }
    }
}
