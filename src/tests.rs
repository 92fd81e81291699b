#[cfg(test)]
mod integration_tests {
    use crate::browser::{Browser, BrowserLauncher, Element, Engine, Page, PageSpec};
    use crate::browser_pool::PagePool;
    use crate::capture::{capture_screenshots, CaptureHook};
    use crate::config::{CaptureOptions, Config, QueueOrder};
    use crate::crawl::crawl;
    use crate::manifest::MANIFEST_FILENAME;
    use crate::page_parse::ParsedPage;
    use crate::progress::{CaptureProgress, CaptureStep, ProgressUpdater};
    use crate::CaptureError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    #[derive(Default, Clone)]
    struct FakeDocument {
        base: Option<String>,
        stylesheet_links: Vec<String>,
        styles: Vec<String>,
        anchors: Vec<String>,
    }

    #[derive(Default)]
    struct FakeSite {
        documents: HashMap<String, FakeDocument>,
        open_pages: AtomicUsize,
        max_open_pages: AtomicUsize,
        launches: Mutex<Vec<(Engine, bool)>>,
        browsers: Mutex<Vec<Arc<FakeBrowser>>>,
        screenshots: Mutex<Vec<(String, PageSpec)>>,
    }

    impl FakeSite {
        fn with_document(mut self, url: &str, document: FakeDocument) -> Self {
            self.documents.insert(url.to_string(), document);
            self
        }

        fn launch_count(&self) -> usize {
            self.launches.lock().len()
        }

        fn screenshot_widths(&self) -> Vec<u32> {
            let mut widths: Vec<u32> = self
                .screenshots
                .lock()
                .iter()
                .filter_map(|(_, spec)| spec.viewport.map(|v| v.width))
                .collect();
            widths.sort_unstable();
            widths
        }
    }

    struct FakeLauncher {
        site: Arc<FakeSite>,
        launch_delay: Duration,
    }

    impl FakeLauncher {
        fn new(site: Arc<FakeSite>) -> Arc<Self> {
            Arc::new(Self {
                site,
                launch_delay: Duration::from_millis(10),
            })
        }
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        fn supports(&self, engine: Engine) -> bool {
            engine == Engine::Chromium
        }

        async fn launch(&self, engine: Engine, headless: bool) -> Result<Arc<dyn Browser>, CaptureError> {
            tokio::time::sleep(self.launch_delay).await;
            self.site.launches.lock().push((engine, headless));
            let browser = Arc::new(FakeBrowser {
                site: self.site.clone(),
                connected: AtomicBool::new(true),
                closed: AtomicBool::new(false),
            });
            self.site.browsers.lock().push(browser.clone());
            Ok(browser)
        }
    }

    struct FakeBrowser {
        site: Arc<FakeSite>,
        connected: AtomicBool,
        closed: AtomicBool,
    }

    impl FakeBrowser {
        fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Browser for FakeBrowser {
        async fn new_page(&self, spec: &PageSpec) -> Result<Box<dyn Page>, CaptureError> {
            let open = self.site.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
            self.site.max_open_pages.fetch_max(open, Ordering::SeqCst);
            Ok(Box::new(FakePage {
                site: self.site.clone(),
                spec: spec.clone(),
                current: Mutex::new(None),
            }))
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn close(&self) -> Result<(), CaptureError> {
            self.closed.store(true, Ordering::SeqCst);
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakePage {
        site: Arc<FakeSite>,
        spec: PageSpec,
        current: Mutex<Option<String>>,
    }

    impl FakePage {
        fn document(&self) -> Result<FakeDocument, CaptureError> {
            let current = self.current.lock().clone();
            current
                .and_then(|url| self.site.documents.get(&url).cloned())
                .ok_or_else(|| CaptureError::PageError("no document loaded".to_string()))
        }
    }

    #[async_trait]
    impl Page for FakePage {
        async fn goto(&self, url: &str) -> Result<(), CaptureError> {
            if !self.site.documents.contains_key(url) {
                return Err(CaptureError::NavigationFailed {
                    url: url.to_string(),
                    reason: "404".to_string(),
                });
            }
            *self.current.lock() = Some(url.to_string());
            Ok(())
        }

        async fn url(&self) -> Result<String, CaptureError> {
            self.current
                .lock()
                .clone()
                .ok_or_else(|| CaptureError::PageError("no document loaded".to_string()))
        }

        async fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, CaptureError> {
            let document = self.document()?;
            let attr = |name: &str, value: &str| FakeElement {
                attributes: HashMap::from([(name.to_string(), value.to_string())]),
                text: None,
            };
            let elements: Vec<FakeElement> = match selector {
                "base" => document.base.iter().map(|href| attr("href", href)).collect(),
                "link" => document
                    .stylesheet_links
                    .iter()
                    .map(|href| FakeElement {
                        attributes: HashMap::from([
                            ("rel".to_string(), "stylesheet".to_string()),
                            ("href".to_string(), href.clone()),
                        ]),
                        text: None,
                    })
                    .collect(),
                "style" => document
                    .styles
                    .iter()
                    .map(|css| FakeElement {
                        attributes: HashMap::new(),
                        text: Some(css.clone()),
                    })
                    .collect(),
                "a" => document.anchors.iter().map(|href| attr("href", href)).collect(),
                _ => Vec::new(),
            };
            Ok(elements
                .into_iter()
                .map(|e| Box::new(e) as Box<dyn Element>)
                .collect())
        }

        async fn screenshot(&self, _full_page: bool) -> Result<Vec<u8>, CaptureError> {
            let url = self.url().await?;
            self.site.screenshots.lock().push((url, self.spec.clone()));
            Ok(b"\x89PNG".to_vec())
        }

        async fn close(&self) -> Result<(), CaptureError> {
            self.site.open_pages.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeElement {
        attributes: HashMap<String, String>,
        text: Option<String>,
    }

    #[async_trait]
    impl Element for FakeElement {
        async fn attribute(&self, name: &str) -> Result<Option<String>, CaptureError> {
            Ok(self.attributes.get(name).cloned())
        }

        async fn inner_text(&self) -> Result<Option<String>, CaptureError> {
            Ok(self.text.clone())
        }
    }

    fn breakpoint_site() -> Arc<FakeSite> {
        Arc::new(FakeSite::default().with_document(
            "http://site.test/",
            FakeDocument {
                styles: vec![
                    "@media (min-width: 1250px) { .nav { display: flex } }\n\
                     @media (max-width: 1250px) { .nav { display: none } }"
                        .to_string(),
                ],
                anchors: vec!["/about".to_string()],
                ..Default::default()
            },
        ))
    }

    fn test_config(page_limit: usize) -> Config {
        Config {
            page_limit,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_pool_queues_requests_over_the_limit() {
        let site = Arc::new(FakeSite::default());
        let pool = PagePool::new(FakeLauncher::new(site.clone()), 2, QueueOrder::Fifo);
        let spec = PageSpec::default();

        let first = pool.acquire_page(Engine::Chromium, true, &spec).await.unwrap();
        let _second = pool.acquire_page(Engine::Chromium, true, &spec).await.unwrap();

        let third = pool.acquire_page(Engine::Chromium, true, &spec);
        tokio::pin!(third);
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut third)
            .await
            .is_err());
        assert_eq!(pool.open_pages(), 2);
        assert_eq!(pool.queued(), 1);

        first.close().await.unwrap();
        let third = tokio::time::timeout(Duration::from_secs(1), third)
            .await
            .expect("queued request should be served")
            .unwrap();
        assert_eq!(pool.queued(), 0);
        assert_eq!(pool.open_pages(), 2);
        assert_eq!(site.max_open_pages.load(Ordering::SeqCst), 2);

        third.close().await.unwrap();
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_pool_launches_one_browser_per_engine_and_mode() {
        let site = Arc::new(FakeSite::default());
        let pool = PagePool::new(FakeLauncher::new(site.clone()), 8, QueueOrder::Fifo);
        let spec = PageSpec::default();

        let pages = futures::future::try_join_all(
            (0..4).map(|_| pool.acquire_page(Engine::Chromium, true, &spec)),
        )
        .await
        .unwrap();
        assert_eq!(site.launch_count(), 1);

        let headed = pool.acquire_page(Engine::Chromium, false, &spec).await.unwrap();
        assert_eq!(*site.launches.lock(), vec![(Engine::Chromium, true), (Engine::Chromium, false)]);

        headed.close().await.unwrap();
        for page in pages {
            page.close().await.unwrap();
        }
        assert_eq!(pool.open_pages(), 0);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_pool_relaunches_disconnected_browser() {
        let site = Arc::new(FakeSite::default());
        let pool = PagePool::new(FakeLauncher::new(site.clone()), 2, QueueOrder::Fifo);
        let spec = PageSpec::default();

        pool.acquire_page(Engine::Chromium, true, &spec)
            .await
            .unwrap()
            .close()
            .await
            .unwrap();
        site.browsers.lock()[0].disconnect();

        pool.acquire_page(Engine::Chromium, true, &spec)
            .await
            .unwrap()
            .close()
            .await
            .unwrap();
        assert_eq!(site.launch_count(), 2);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_pool_shutdown_fails_queued_requests_and_closes_browsers() {
        let site = Arc::new(FakeSite::default());
        let pool = PagePool::new(FakeLauncher::new(site.clone()), 1, QueueOrder::Fifo);
        let spec = PageSpec::default();

        let held = pool.acquire_page(Engine::Chromium, true, &spec).await.unwrap();
        let waiting = pool.acquire_page(Engine::Chromium, true, &spec);
        tokio::pin!(waiting);
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut waiting)
            .await
            .is_err());

        pool.shutdown().await;
        assert!(matches!(waiting.await, Err(CaptureError::PoolShutdown)));
        assert!(site.browsers.lock()[0].closed.load(Ordering::SeqCst));
        assert!(matches!(
            pool.acquire_page(Engine::Chromium, true, &spec).await,
            Err(CaptureError::PoolShutdown)
        ));
        drop(held);
    }

    fn parsed(url: &Url, anchors: &[&str]) -> ParsedPage {
        ParsedPage {
            url: url.clone(),
            media_queries: Vec::new(),
            anchor_hrefs: anchors.iter().map(|a| url.join(a).unwrap()).collect(),
        }
    }

    #[tokio::test]
    async fn test_crawl_visits_each_page_once() {
        let links: HashMap<&str, Vec<&str>> = HashMap::from([
            ("http://site.test/", vec!["/b", "/#top"]),
            ("http://site.test/b", vec!["/", "/b#section", "/c"]),
            ("http://site.test/c", vec!["/b"]),
        ]);
        let calls = Mutex::new(Vec::new());
        let seeds = vec![Url::parse("http://site.test/").unwrap()];

        let pages = crawl(&seeds, true, &ProgressUpdater::silent(), |url: Url| {
            calls.lock().push(url.to_string());
            let anchors = links.get(url.as_str()).cloned().unwrap_or_default();
            futures::future::ready(Ok(parsed(&url, &anchors)))
        })
        .await
        .unwrap();

        let mut visited = calls.into_inner();
        visited.sort();
        assert_eq!(
            visited,
            vec!["http://site.test/", "http://site.test/b", "http://site.test/c"]
        );
        assert_eq!(pages.len(), 3);
    }

    #[tokio::test]
    async fn test_crawl_skips_failed_discovered_pages_but_not_seeds() {
        let seeds = vec![Url::parse("http://site.test/").unwrap()];
        let pages = crawl(&seeds, true, &ProgressUpdater::silent(), |url: Url| {
            let result = if url.path() == "/" {
                Ok(parsed(&url, &["/broken"]))
            } else {
                Err(CaptureError::PageError("boom".to_string()))
            };
            futures::future::ready(result)
        })
        .await
        .unwrap();
        assert_eq!(pages.len(), 1);

        let failed = crawl(&seeds, false, &ProgressUpdater::silent(), |_url: Url| {
            futures::future::ready(Err::<ParsedPage, _>(CaptureError::PageError("boom".to_string())))
        })
        .await;
        assert!(matches!(failed, Err(CaptureError::PageError(_))));
    }

    #[tokio::test]
    async fn test_capture_breakpoints_end_to_end() {
        let site = breakpoint_site();
        let out = tempfile::tempdir().unwrap();
        let mut options = CaptureOptions::new(vec!["http://site.test/".to_string()], out.path());
        options.breakpoints = true;

        let progress = Arc::new(Mutex::new(Vec::new()));
        let observed = progress.clone();
        let updater = ProgressUpdater::new(move |p| observed.lock().push(p));

        let pages = capture_screenshots(&options, &test_config(2), FakeLauncher::new(site.clone()), &updater, None)
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].dir, "site.test");
        let dir = out.path().join("site.test");
        for file in ["w_1249.png", "w_1250.png", "w_1251.png", MANIFEST_FILENAME] {
            assert!(dir.join(file).exists(), "missing {file}");
        }
        assert_eq!(site.screenshot_widths(), vec![1249, 1250, 1251]);
        assert_eq!(site.open_pages.load(Ordering::SeqCst), 0);
        assert!(site.max_open_pages.load(Ordering::SeqCst) <= 2);

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join(MANIFEST_FILENAME)).unwrap()).unwrap();
        assert_eq!(manifest["url"], "http://site.test/");
        let breakpoints = manifest["breakpoints"].as_array().unwrap();
        assert_eq!(breakpoints.len(), 2);
        assert_eq!(breakpoints[0]["bound"], "upper");
        assert_eq!(breakpoints[0]["onFile"], "w_1250.png");
        assert_eq!(breakpoints[0]["offFile"], "w_1251.png");
        assert_eq!(breakpoints[1]["bound"], "lower");
        assert_eq!(breakpoints[1]["offFile"], "w_1249.png");

        let steps: Vec<CaptureStep> = progress.lock().iter().map(CaptureProgress::step).collect();
        assert_eq!(steps.first(), Some(&CaptureStep::Starting));
        assert!(steps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(steps.last(), Some(&CaptureStep::Completed));
        assert!(steps.contains(&CaptureStep::Parsing));
    }

    /// Serves `css` for every request and records the requested paths.
    async fn serve_stylesheet(css: &'static str) -> (std::net::SocketAddr, Arc<Mutex<Vec<String>>>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = requested.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                if let Some(path) = request.split_whitespace().nth(1) {
                    log.lock().push(path.to_string());
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    css.len(),
                    css
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (addr, requested)
    }

    #[tokio::test]
    async fn test_capture_reads_linked_stylesheets_relative_to_base() {
        let (addr, requested) = serve_stylesheet("@media (max-width: 640px) { .menu { display: none } }").await;
        let dead = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let site = Arc::new(FakeSite::default().with_document(
            "http://site.test/",
            FakeDocument {
                base: Some(format!("http://{addr}/assets/")),
                stylesheet_links: vec!["site.css".to_string(), format!("http://{dead}/gone.css")],
                styles: vec!["@media (min-width: 1000px) { .grid { gap: 2rem } }".to_string()],
                ..Default::default()
            },
        ));
        let out = tempfile::tempdir().unwrap();
        let mut options = CaptureOptions::new(vec!["http://site.test/".to_string()], out.path());
        options.breakpoints = true;

        capture_screenshots(&options, &test_config(2), FakeLauncher::new(site.clone()), &ProgressUpdater::silent(), None)
            .await
            .unwrap();

        assert_eq!(*requested.lock(), vec!["/assets/site.css"]);
        assert_eq!(site.screenshot_widths(), vec![640, 641, 999, 1000]);

        let dir = out.path().join("site.test");
        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join(MANIFEST_FILENAME)).unwrap()).unwrap();
        let breakpoints = manifest["breakpoints"].as_array().unwrap();
        assert_eq!(breakpoints.len(), 2);
        assert_eq!(breakpoints[0]["bound"], "upper");
        assert_eq!(breakpoints[0]["onFile"], "w_640.png");
        assert_eq!(breakpoints[0]["offFile"], "w_641.png");
        assert_eq!(breakpoints[1]["bound"], "lower");
        assert_eq!(breakpoints[1]["onFile"], "w_1000.png");
    }

    struct RecordingHook {
        site: Arc<FakeSite>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl CaptureHook for RecordingHook {
        async fn before_screenshot(&self, page: &dyn Page) -> Result<(), CaptureError> {
            let url = page.url().await?;
            let taken = self.site.screenshots.lock().len();
            self.seen.lock().push((url, taken));
            Ok(())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl CaptureHook for FailingHook {
        async fn before_screenshot(&self, _page: &dyn Page) -> Result<(), CaptureError> {
            Err(CaptureError::PageError("fonts never loaded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_capture_hook_runs_after_navigation_before_screenshot() {
        let site = breakpoint_site();
        let out = tempfile::tempdir().unwrap();
        let mut options = CaptureOptions::new(vec!["http://site.test/".to_string()], out.path());
        options.device_queries = Some(vec!["desktop safari".to_string()]);

        let hook = Arc::new(RecordingHook {
            site: site.clone(),
            seen: Mutex::new(Vec::new()),
        });
        capture_screenshots(
            &options,
            &test_config(1),
            FakeLauncher::new(site.clone()),
            &ProgressUpdater::silent(),
            Some(hook.clone() as Arc<dyn CaptureHook>),
        )
        .await
        .unwrap();

        assert_eq!(*hook.seen.lock(), vec![("http://site.test/".to_string(), 0)]);
        assert_eq!(site.screenshots.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_hook_failure_fails_the_run() {
        let site = breakpoint_site();
        let out = tempfile::tempdir().unwrap();
        let mut options = CaptureOptions::new(vec!["http://site.test/".to_string()], out.path());
        options.device_queries = Some(vec!["desktop safari".to_string()]);

        let result = capture_screenshots(
            &options,
            &test_config(1),
            FakeLauncher::new(site.clone()),
            &ProgressUpdater::silent(),
            Some(Arc::new(FailingHook)),
        )
        .await;

        match result {
            Err(CaptureError::CaptureHookFailed { url, reason }) => {
                assert_eq!(url, "http://site.test/");
                assert!(reason.contains("fonts never loaded"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(site.screenshots.lock().is_empty());
        assert_eq!(site.open_pages.load(Ordering::SeqCst), 0);
        assert!(site
            .browsers
            .lock()
            .iter()
            .all(|browser| browser.closed.load(Ordering::SeqCst)));
    }

    #[tokio::test]
    async fn test_capture_recursive_devices_with_engine_fallback() {
        let site = Arc::new(
            FakeSite::default()
                .with_document(
                    "http://site.test/",
                    FakeDocument {
                        anchors: vec!["/about".to_string(), "https://elsewhere.test/".to_string()],
                        ..Default::default()
                    },
                )
                .with_document("http://site.test/about", FakeDocument::default()),
        );
        let out = tempfile::tempdir().unwrap();
        let mut options = CaptureOptions::new(vec!["http://site.test/".to_string()], out.path());
        options.recursive = true;
        options.device_queries = Some(vec!["desktop safari".to_string(), "Pixel 7".to_string()]);

        let pages = capture_screenshots(&options, &test_config(3), FakeLauncher::new(site.clone()), &ProgressUpdater::silent(), None)
            .await
            .unwrap();

        let mut dirs: Vec<String> = pages.iter().map(|p| p.dir.clone()).collect();
        dirs.sort();
        assert_eq!(dirs, vec!["site.test", "site.test/about"]);

        let about = out.path().join("site.test").join("about");
        for file in ["desktop-safari.png", "pixel-7_landscape.png", "pixel-7_portrait.png"] {
            assert!(about.join(file).exists(), "missing {file}");
        }
        assert!(site.launches.lock().iter().all(|(engine, _)| *engine == Engine::Chromium));
        assert_eq!(site.screenshots.lock().len(), 6);

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(about.join(MANIFEST_FILENAME)).unwrap()).unwrap();
        assert!(manifest["breakpoints"].is_null());
        assert_eq!(manifest["devices"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_capture_failure_still_shuts_down_pool() {
        let site = breakpoint_site();
        let out = tempfile::tempdir().unwrap();
        let mut options = CaptureOptions::new(vec!["http://missing.test/".to_string()], out.path());
        options.modern_devices = true;

        let result = capture_screenshots(&options, &test_config(4), FakeLauncher::new(site.clone()), &ProgressUpdater::silent(), None).await;

        assert!(matches!(result, Err(CaptureError::NavigationFailed { .. })));
        assert!(site
            .browsers
            .lock()
            .iter()
            .all(|browser| browser.closed.load(Ordering::SeqCst)));
        assert!(!out.path().join("missing.test").join(MANIFEST_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_capture_rejects_invalid_options_before_launching() {
        let site = breakpoint_site();
        let mut options = CaptureOptions::new(vec!["ftp://site.test/".to_string()], "");
        options.browser = Engine::Firefox;
        options.breakpoints = true;

        let result = capture_screenshots(&options, &test_config(1), FakeLauncher::new(site.clone()), &ProgressUpdater::silent(), None).await;
        match result {
            Err(CaptureError::InvalidOptions(errors)) => {
                let fields: Vec<&str> = errors.fields().keys().map(String::as_str).collect();
                assert_eq!(fields, vec!["browser", "outDir", "urls.0"]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let no_source = CaptureOptions::new(vec!["http://site.test/".to_string()], "out");
        let result = capture_screenshots(&no_source, &test_config(1), FakeLauncher::new(site.clone()), &ProgressUpdater::silent(), None).await;
        assert!(matches!(result, Err(CaptureError::UnspecifiedCaptureSource)));
        assert_eq!(site.launch_count(), 0);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.page_limit, 4);
        assert_eq!(config.queue_order, QueueOrder::Fifo);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }
}
