//! Icon retrieval: tiered lookup plus a background worker pool

use crate::model::ItemId;
use crate::platform::PlatformShell;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const DEFAULT_ICON_SIZE: u32 = 32;
const MIN_ICON_SIZE: u32 = 16;
const MAX_ICON_SIZE: u32 = 256;
const PLACEHOLDER_COLOR: [u8; 4] = [45, 190, 150, 255];

/// Straight RGBA pixels, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Immutable once produced; safe to share between items and threads
pub type Icon = Arc<IconImage>;

impl IconImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(side: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take((side * side * 4) as usize)
            .collect();
        Self {
            width: side,
            height: side,
            rgba,
        }
    }

    /// Nearest-neighbour resize to a square
    pub fn resize_to_square(&self, side: u32) -> IconImage {
        if self.width == side && self.height == side {
            return self.clone();
        }
        if self.width == 0 || self.height == 0 {
            return IconImage::solid(side, [0, 0, 0, 0]);
        }
        let (src_w, src_h) = (self.width as usize, self.height as usize);
        let side_u = side as usize;
        let mut out = vec![0u8; side_u * side_u * 4];
        for y in 0..side_u {
            let sy = y * src_h / side_u;
            for x in 0..side_u {
                let sx = x * src_w / side_u;
                let si = (sy * src_w + sx) * 4;
                let di = (y * side_u + x) * 4;
                out[di..di + 4].copy_from_slice(&self.rgba[si..si + 4]);
            }
        }
        IconImage {
            width: side,
            height: side,
            rgba: out,
        }
    }
}

pub fn clamp_icon_size(size: u32) -> u32 {
    size.clamp(MIN_ICON_SIZE, MAX_ICON_SIZE)
}

/// Produces a displayable bitmap for a path. Must never panic.
pub trait IconProvider: Send + Sync {
    fn icon_for(&self, path: &str) -> Option<Icon>;

    /// Called once on each worker thread before its first lookup.
    /// Returns whether `exit_worker_thread` must run when the worker stops.
    fn init_worker_thread(&self) -> bool {
        false
    }

    fn exit_worker_thread(&self) {}
}

/// Shell icon, then per-file icon, then a generated placeholder
pub struct TieredIconProvider {
    shell: Arc<dyn PlatformShell>,
    size: u32,
    cache: Mutex<HashMap<String, Icon>>,
    placeholder: Icon,
}

impl TieredIconProvider {
    pub fn new(shell: Arc<dyn PlatformShell>, size: u32) -> Self {
        let size = clamp_icon_size(size);
        Self {
            shell,
            size,
            cache: Mutex::new(HashMap::new()),
            placeholder: Arc::new(IconImage::solid(size, PLACEHOLDER_COLOR)),
        }
    }

    pub fn placeholder(&self) -> Icon {
        self.placeholder.clone()
    }

    fn lookup(&self, path: &str) -> Icon {
        let p = Path::new(path);
        if !p.exists() {
            log::debug!("No icon source for missing target {}", path);
            return self.placeholder();
        }

        if let Some(img) = self.shell.shell_icon(p, self.size) {
            return Arc::new(img.resize_to_square(self.size));
        }
        log::debug!("Shell icon lookup failed for {}, trying file icon", path);

        if let Some(img) = self.shell.file_icon(p) {
            return Arc::new(img.resize_to_square(self.size));
        }
        log::debug!("File icon extraction failed for {}, using placeholder", path);

        self.placeholder()
    }
}

impl IconProvider for TieredIconProvider {
    fn icon_for(&self, path: &str) -> Option<Icon> {
        let key = path.to_lowercase();
        if let Ok(cache) = self.cache.lock() {
            if let Some(icon) = cache.get(&key) {
                return Some(icon.clone());
            }
        }

        let icon = self.lookup(path);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, icon.clone());
        }
        Some(icon)
    }

    fn init_worker_thread(&self) -> bool {
        self.shell.init_worker_thread()
    }

    fn exit_worker_thread(&self) {
        self.shell.exit_worker_thread()
    }
}

struct IconRequest {
    id: ItemId,
    path: String,
}

/// An icon result routed back to the item that asked for it
#[derive(Debug, Clone)]
pub struct IconReady {
    pub id: ItemId,
    pub icon: Option<Icon>,
}

/// Fixed pool of worker threads resolving icons off the caller's thread
pub struct IconLoader {
    req_tx: Option<Sender<IconRequest>>,
    ready_rx: Receiver<IconReady>,
    pending: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl IconLoader {
    pub fn new(provider: Arc<dyn IconProvider>, workers: usize) -> Self {
        let (req_tx, req_rx) = unbounded::<IconRequest>();
        let (ready_tx, ready_rx) = unbounded::<IconReady>();
        let pending = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let handles = (0..workers.max(1))
            .map(|n| {
                let req_rx = req_rx.clone();
                let ready_tx = ready_tx.clone();
                let provider = provider.clone();
                let stop = stop.clone();
                thread::Builder::new()
                    .name(format!("icon-worker-{}", n))
                    .spawn(move || {
                        let initialized = provider.init_worker_thread();
                        while let Ok(req) = req_rx.recv() {
                            // Queued requests are abandoned once the loader is dropped
                            if stop.load(Ordering::SeqCst) {
                                break;
                            }
                            let icon = provider.icon_for(&req.path);
                            if ready_tx.send(IconReady { id: req.id, icon }).is_err() {
                                break;
                            }
                        }
                        if initialized {
                            provider.exit_worker_thread();
                        }
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::error!("Failed to spawn icon worker: {}", e);
                    None
                }
            })
            .collect();

        Self {
            req_tx: Some(req_tx),
            ready_rx,
            pending,
            stop,
            workers: handles,
        }
    }

    /// Worker count sized to the machine, at most four
    pub fn with_default_workers(provider: Arc<dyn IconProvider>) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get().min(4))
            .unwrap_or(2);
        Self::new(provider, workers)
    }

    pub fn request(&self, id: ItemId, path: &str) {
        let Some(tx) = &self.req_tx else {
            return;
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if tx
            .send(IconRequest {
                id,
                path: path.to_string(),
            })
            .is_err()
        {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            log::warn!("Icon workers are gone, dropping request for {}", path);
        }
    }

    /// Requests sent whose results have not been received yet
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn try_recv_ready(&self) -> Option<IconReady> {
        let ready = self.ready_rx.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(ready)
    }

    pub fn recv_ready_timeout(&self, timeout: Duration) -> Option<IconReady> {
        match self.ready_rx.recv_timeout(timeout) {
            Ok(ready) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Some(ready)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for IconLoader {
    fn drop(&mut self) {
        // Busy workers finish their current lookup, idle ones wake on disconnect
        self.stop.store(true, Ordering::SeqCst);
        self.req_tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
