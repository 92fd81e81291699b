//! chromiumoxide implementation of the browser capability traits
//!
//! Each launch spawns the CDP handler loop on its own task. When the handler
//! stream ends the browser is reported as disconnected, which makes the page
//! pool relaunch it on the next request.

use crate::browser::{Browser, BrowserLauncher, Element, Engine, Page, PageSpec};
use crate::config::{create_browser_config, Config};
use crate::CaptureError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Launches Chromium through chromiumoxide. Other engines are not available.
pub struct ChromiumLauncher {
    config: Config,
}

impl ChromiumLauncher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Launcher for `engine`, or `UnsupportedEngine` when none can drive it.
pub fn launcher_for(engine: Engine, config: &Config) -> Result<Arc<dyn BrowserLauncher>, CaptureError> {
    match engine {
        Engine::Chromium => Ok(Arc::new(ChromiumLauncher::new(config.clone()))),
        other => Err(CaptureError::UnsupportedEngine(other)),
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    fn supports(&self, engine: Engine) -> bool {
        engine == Engine::Chromium
    }

    async fn launch(&self, engine: Engine, headless: bool) -> Result<Arc<dyn Browser>, CaptureError> {
        if !self.supports(engine) {
            return Err(CaptureError::UnsupportedEngine(engine));
        }

        let browser_config = create_browser_config(&self.config, headless)?;
        let (browser, mut handler) = chromiumoxide::Browser::launch(browser_config)
            .await
            .map_err(|e| CaptureError::BrowserLaunchFailed(e.to_string()))?;

        let connected = Arc::new(AtomicBool::new(true));
        let handler_connected = connected.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("Handler error: {}", e);
                    break;
                }
            }
            debug!("Handler stream ended");
            handler_connected.store(false, Ordering::SeqCst);
        });

        info!("Launched {} (headless: {})", engine, headless);
        Ok(Arc::new(ChromiumBrowser {
            browser: Mutex::new(browser),
            handler: handler_task,
            connected,
            navigation_timeout: self.config.navigation_timeout,
        }))
    }
}

pub struct ChromiumBrowser {
    browser: Mutex<chromiumoxide::Browser>,
    handler: JoinHandle<()>,
    connected: Arc<AtomicBool>,
    navigation_timeout: std::time::Duration,
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_page(&self, spec: &PageSpec) -> Result<Box<dyn Page>, CaptureError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| CaptureError::PageError(e.to_string()))?
        };

        if let Some(viewport) = spec.viewport {
            let metrics = SetDeviceMetricsOverrideParams::builder()
                .width(viewport.width as i64)
                .height(viewport.height as i64)
                .device_scale_factor(spec.device_scale_factor.unwrap_or(1.0))
                .mobile(spec.is_mobile)
                .build()
                .map_err(CaptureError::PageError)?;
            page.execute(metrics)
                .await
                .map_err(|e| CaptureError::PageError(e.to_string()))?;
        }

        Ok(Box::new(ChromiumPage {
            page,
            navigation_timeout: self.navigation_timeout,
        }))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.handler.is_finished()
    }

    async fn close(&self) -> Result<(), CaptureError> {
        let result = self.browser.lock().await.close().await;
        self.handler.abort();
        self.connected.store(false, Ordering::SeqCst);
        result
            .map(|_| ())
            .map_err(|e| CaptureError::BrowserDisconnected(e.to_string()))
    }
}

pub struct ChromiumPage {
    page: chromiumoxide::Page,
    navigation_timeout: std::time::Duration,
}

#[async_trait]
impl Page for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), CaptureError> {
        let navigation = self.page.goto(url);
        match timeout(self.navigation_timeout, navigation).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CaptureError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CaptureError::Timeout(self.navigation_timeout)),
        }
    }

    async fn url(&self) -> Result<String, CaptureError> {
        self.page
            .url()
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))?
            .ok_or_else(|| CaptureError::PageError("page has no url".to_string()))
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, CaptureError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromiumElement { element }) as Box<dyn Element>)
            .collect())
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, CaptureError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))
    }

    async fn close(&self) -> Result<(), CaptureError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))
    }
}

struct ChromiumElement {
    element: chromiumoxide::element::Element,
}

#[async_trait]
impl Element for ChromiumElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, CaptureError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))
    }

    async fn inner_text(&self) -> Result<Option<String>, CaptureError> {
        self.element
            .inner_text()
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))
    }
}
