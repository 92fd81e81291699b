//! Page pool with lazily launched browsers and bounded page concurrency
//!
//! One browser is kept per (engine, headless) pair and launched on the first
//! page request that needs it. A single counter limits the number of open
//! pages across every browser; requests above the limit wait in a queue and
//! are handed the capacity of the next page that closes.

use crate::browser::{Browser, BrowserLauncher, Engine, Page, PageSpec};
use crate::config::QueueOrder;
use crate::{metrics, CaptureError};
use parking_lot::Mutex as SyncMutex;
use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

type SlotKey = (Engine, bool);

#[derive(Default)]
struct Slot {
    browser: Option<Arc<dyn Browser>>,
}

struct Admission {
    open: usize,
    queued: VecDeque<oneshot::Sender<Permit>>,
    /// Set once by `shutdown`; read and written under the same lock as `queued`.
    closed: bool,
}

struct AdmissionState {
    inner: SyncMutex<Admission>,
    limit: usize,
    order: QueueOrder,
}

impl AdmissionState {
    /// Passes capacity to the next live waiter or gives it back.
    fn release(self: &Arc<Self>) {
        loop {
            let waiter = {
                let mut admission = self.inner.lock();
                let waiter = match self.order {
                    QueueOrder::Fifo => admission.queued.pop_front(),
                    QueueOrder::Lifo => admission.queued.pop_back(),
                };
                if waiter.is_none() {
                    admission.open -= 1;
                }
                metrics::set_pool_gauges(admission.open, admission.queued.len());
                waiter
            };

            let Some(waiter) = waiter else {
                return;
            };
            let permit = Permit {
                state: Some(self.clone()),
            };
            match waiter.send(permit) {
                Ok(()) => return,
                // waiter gave up; its capacity stays counted, try the next one
                Err(mut unclaimed) => unclaimed.state = None,
            }
        }
    }
}

/// One unit of page capacity. Dropping it frees the capacity.
struct Permit {
    state: Option<Arc<AdmissionState>>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.release();
        }
    }
}

/// A page handed out by the pool. Closing it frees its capacity.
pub struct PooledPage {
    page: Box<dyn Page>,
    _permit: Permit,
}

impl PooledPage {
    pub async fn close(self) -> Result<(), CaptureError> {
        self.page.close().await
    }
}

impl Deref for PooledPage {
    type Target = dyn Page;

    fn deref(&self) -> &Self::Target {
        self.page.as_ref()
    }
}

pub struct PagePool {
    launcher: Arc<dyn BrowserLauncher>,
    slots: SyncMutex<HashMap<SlotKey, Arc<Mutex<Slot>>>>,
    admission: Arc<AdmissionState>,
}

impl PagePool {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, limit: usize, order: QueueOrder) -> Self {
        Self {
            launcher,
            slots: SyncMutex::new(HashMap::new()),
            admission: Arc::new(AdmissionState {
                inner: SyncMutex::new(Admission {
                    open: 0,
                    queued: VecDeque::new(),
                    closed: false,
                }),
                limit: limit.max(1),
                order,
            }),
        }
    }

    /// Pages currently holding capacity.
    pub fn open_pages(&self) -> usize {
        self.admission.inner.lock().open
    }

    /// Requests waiting for capacity.
    pub fn queued(&self) -> usize {
        self.admission.inner.lock().queued.len()
    }

    /// Opens a page once capacity allows, launching the browser if needed.
    pub async fn acquire_page(
        &self,
        engine: Engine,
        headless: bool,
        spec: &PageSpec,
    ) -> Result<PooledPage, CaptureError> {
        let permit = self.admit().await?;
        let browser = self.browser(engine, headless).await?;
        let page = browser.new_page(spec).await?;
        Ok(PooledPage {
            page,
            _permit: permit,
        })
    }

    fn is_shutting_down(&self) -> bool {
        self.admission.inner.lock().closed
    }

    async fn admit(&self) -> Result<Permit, CaptureError> {
        let rx = {
            let mut admission = self.admission.inner.lock();
            if admission.closed {
                return Err(CaptureError::PoolShutdown);
            }
            if admission.open < self.admission.limit {
                admission.open += 1;
                metrics::set_pool_gauges(admission.open, admission.queued.len());
                return Ok(Permit {
                    state: Some(self.admission.clone()),
                });
            }
            let (tx, rx) = oneshot::channel();
            admission.queued.push_back(tx);
            metrics::set_pool_gauges(admission.open, admission.queued.len());
            debug!("Page limit {} reached, {} queued", self.admission.limit, admission.queued.len());
            rx
        };

        rx.await.map_err(|_| CaptureError::PoolShutdown)
    }

    async fn browser(&self, engine: Engine, headless: bool) -> Result<Arc<dyn Browser>, CaptureError> {
        let slot = self
            .slots
            .lock()
            .entry((engine, headless))
            .or_default()
            .clone();

        // held across the launch so concurrent requests share one launch
        let mut slot = slot.lock().await;
        if let Some(browser) = &slot.browser {
            if browser.is_connected() {
                return Ok(browser.clone());
            }
            warn!("{} browser disconnected, relaunching", engine);
            slot.browser = None;
        }

        if self.is_shutting_down() {
            return Err(CaptureError::PoolShutdown);
        }

        let browser = self.launcher.launch(engine, headless).await?;
        metrics::record_browser_launch(engine);
        slot.browser = Some(browser.clone());
        Ok(browser)
    }

    /// Fails every queued request and closes every launched browser.
    pub async fn shutdown(&self) {
        info!("Shutting down page pool...");
        let abandoned: Vec<_> = {
            let mut admission = self.admission.inner.lock();
            admission.closed = true;
            admission.queued.drain(..).collect()
        };
        if !abandoned.is_empty() {
            debug!("Dropping {} queued page requests", abandoned.len());
        }
        drop(abandoned);

        let slots: Vec<_> = self.slots.lock().drain().map(|(_, slot)| slot).collect();
        for slot in slots {
            let browser = slot.lock().await.browser.take();
            if let Some(browser) = browser {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
            }
        }

        info!("Page pool shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admission(limit: usize, order: QueueOrder) -> Arc<AdmissionState> {
        Arc::new(AdmissionState {
            inner: SyncMutex::new(Admission {
                open: limit,
                queued: VecDeque::new(),
                closed: false,
            }),
            limit,
            order,
        })
    }

    fn enqueue(state: &Arc<AdmissionState>) -> oneshot::Receiver<Permit> {
        let (tx, rx) = oneshot::channel();
        state.inner.lock().queued.push_back(tx);
        rx
    }

    #[test]
    fn fifo_serves_oldest_waiter() {
        let state = admission(1, QueueOrder::Fifo);
        let mut first = enqueue(&state);
        let mut second = enqueue(&state);
        state.release();
        let served = first.try_recv();
        assert!(served.is_ok());
        assert!(second.try_recv().is_err());
    }

    #[test]
    fn lifo_serves_newest_waiter() {
        let state = admission(1, QueueOrder::Lifo);
        let mut first = enqueue(&state);
        let mut second = enqueue(&state);
        state.release();
        assert!(first.try_recv().is_err());
        let served = second.try_recv();
        assert!(served.is_ok());
    }

    #[test]
    fn abandoned_waiter_is_skipped() {
        let state = admission(1, QueueOrder::Fifo);
        drop(enqueue(&state));
        let mut live = enqueue(&state);
        state.release();
        let permit = live.try_recv().ok();
        assert!(permit.is_some());
        assert_eq!(state.inner.lock().open, 1);

        drop(permit);
        assert_eq!(state.inner.lock().open, 0);
    }

    struct UnusedLauncher;

    #[async_trait::async_trait]
    impl BrowserLauncher for UnusedLauncher {
        fn supports(&self, _engine: Engine) -> bool {
            true
        }

        async fn launch(&self, _engine: Engine, _headless: bool) -> Result<Arc<dyn Browser>, CaptureError> {
            Err(CaptureError::PageError("no browser in this test".to_string()))
        }
    }

    #[tokio::test]
    async fn admission_after_shutdown_fails_without_queueing() {
        let pool = PagePool::new(Arc::new(UnusedLauncher), 1, QueueOrder::Fifo);
        let held = pool.admit().await.unwrap();
        pool.shutdown().await;

        let admitted = tokio::time::timeout(std::time::Duration::from_millis(100), pool.admit())
            .await
            .expect("admission after shutdown must not wait");
        assert!(matches!(admitted, Err(CaptureError::PoolShutdown)));
        assert_eq!(pool.queued(), 0);

        drop(held);
        assert_eq!(pool.open_pages(), 0);
        assert!(matches!(pool.admit().await, Err(CaptureError::PoolShutdown)));
    }
}
