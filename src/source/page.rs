/// Overlay layer fetching
///
/// The layer drawn over the design is a bitmap of whatever the overlay
/// URL shows. Image endpoints and image files are decoded directly;
/// HTML pages are rendered by headless Chrome at the stage size. The
/// layer is re-fetched periodically while it is on screen.
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions};
use iced::widget::image::Handle;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task;
use tracing::{debug, info};
use url::Url;

use super::design::decode_rgba;
use crate::error::{OverlayError, Result};

/// Upper bound for a single overlay fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where an overlay URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySource {
    /// Fetched over the network, rendered if the body is not an image
    Http(Url),
    /// Image file read from disk
    File(PathBuf),
    /// Local HTML page, always rendered
    Page(Url),
}

impl OverlaySource {
    /// Classify an overlay URL
    ///
    /// `http`/`https` URLs are fetched over the network. `file` URLs and
    /// bare paths are read from disk, and HTML files among them become
    /// pages. Anything else is rejected.
    pub fn resolve(raw: &str) -> Result<Self> {
        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(OverlaySource::Http(url)),
                "file" => url
                    .to_file_path()
                    .map_err(|_| OverlayError::UnsupportedUrl(raw.to_owned()))
                    .and_then(|path| Self::from_path(path, raw)),
                // Windows drive letters parse as one-letter schemes
                scheme if scheme.len() == 1 => Self::from_path(PathBuf::from(raw), raw),
                _ => Err(OverlayError::UnsupportedUrl(raw.to_owned())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Self::from_path(PathBuf::from(raw), raw),
            Err(_) => Err(OverlayError::UnsupportedUrl(raw.to_owned())),
        }
    }

    fn from_path(path: PathBuf, raw: &str) -> Result<Self> {
        if !is_html_path(&path) {
            return Ok(OverlaySource::File(path));
        }

        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(|e| OverlayError::io(&path, e))?
                .join(path)
        };
        Url::from_file_path(&path)
            .map(OverlaySource::Page)
            .map_err(|_| OverlayError::UnsupportedUrl(raw.to_owned()))
    }
}

fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// Whether an HTTP body is a bitmap rather than a page to render
fn is_image_body(content_type: Option<&str>, body: &[u8]) -> bool {
    match content_type {
        Some(ct) if ct.starts_with("image/") => true,
        Some(ct) if ct.starts_with("text/html") => false,
        _ => image::guess_format(body).is_ok(),
    }
}

/// A fetched overlay bitmap
#[derive(Debug, Clone)]
pub struct OverlayLayer {
    /// URL the layer was fetched from
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub handle: Handle,
}

/// Turns a web page into a PNG screenshot
pub trait PageRenderer: Send + Sync {
    fn render(&self, url: &Url, viewport: (u32, u32)) -> Result<Vec<u8>>;
}

/// Headless Chrome, kept running between refreshes
#[derive(Default)]
pub struct ChromeRenderer {
    session: Mutex<Option<ChromeSession>>,
}

struct ChromeSession {
    // Dropping the browser closes Chrome
    _browser: Browser,
    tab: Arc<Tab>,
    viewport: (u32, u32),
}

impl ChromeSession {
    fn launch(viewport: (u32, u32)) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some(viewport))
            .build()
            .map_err(|e| OverlayError::Render(format!("invalid launch options: {}", e)))?;

        let browser = Browser::new(options)
            .map_err(|e| OverlayError::Render(format!("failed to launch Chrome: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| OverlayError::Render(format!("failed to open a tab: {}", e)))?;
        debug!(width = viewport.0, height = viewport.1, "headless Chrome launched");

        Ok(Self {
            _browser: browser,
            tab,
            viewport,
        })
    }

    fn capture(&self, url: &Url) -> Result<Vec<u8>> {
        self.tab
            .navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| OverlayError::Render(format!("navigation failed: {}", e)))?;

        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| OverlayError::Render(format!("screenshot failed: {}", e)))
    }
}

impl PageRenderer for ChromeRenderer {
    fn render(&self, url: &Url, viewport: (u32, u32)) -> Result<Vec<u8>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| OverlayError::Render("renderer lock poisoned".into()))?;

        if let Some(current) = session.take().filter(|s| s.viewport == viewport) {
            match current.capture(url) {
                Ok(png) => {
                    *session = Some(current);
                    return Ok(png);
                }
                Err(e) => debug!(error = %e, "browser session lost, relaunching"),
            }
        }

        let fresh = ChromeSession::launch(viewport)?;
        let png = fresh.capture(url)?;
        *session = Some(fresh);
        Ok(png)
    }
}

/// Fetches overlay layers, sharing one HTTP client and one page renderer
#[derive(Clone)]
pub struct OverlayFetcher {
    client: reqwest::Client,
    pages: Arc<dyn PageRenderer>,
}

impl OverlayFetcher {
    pub fn new() -> Result<Self> {
        Self::with_renderer(Arc::new(ChromeRenderer::default()))
    }

    pub fn with_renderer(pages: Arc<dyn PageRenderer>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client, pages })
    }

    /// Fetch and decode the overlay layer for `url`
    ///
    /// Pages are rendered at `viewport`, the stage size in pixels.
    pub async fn fetch(&self, url: String, viewport: (u32, u32)) -> Result<OverlayLayer> {
        let bytes = match OverlaySource::resolve(&url)? {
            OverlaySource::Http(target) => {
                let (content_type, body) = self.fetch_http(target.clone()).await?;
                if is_image_body(content_type.as_deref(), &body) {
                    body
                } else {
                    debug!(%url, ?content_type, "rendering overlay page");
                    self.render(target, viewport).await?
                }
            }
            OverlaySource::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| OverlayError::io(&path, e))?,
            OverlaySource::Page(target) => self.render(target, viewport).await?,
        };

        let decoded = task::spawn_blocking(move || decode_rgba(&bytes)).await??;
        debug!(%url, width = decoded.width, height = decoded.height, "overlay layer fetched");

        Ok(OverlayLayer {
            url,
            width: decoded.width,
            height: decoded.height,
            handle: Handle::from_rgba(decoded.width, decoded.height, decoded.pixels),
        })
    }

    async fn fetch_http(&self, url: Url) -> Result<(Option<String>, Vec<u8>)> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::HttpStatus(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok((content_type, response.bytes().await?.to_vec()))
    }

    async fn render(&self, url: Url, viewport: (u32, u32)) -> Result<Vec<u8>> {
        let pages = Arc::clone(&self.pages);
        task::spawn_blocking(move || pages.render(&url, viewport)).await?
    }
}

/// What a finished fetch means for the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The layer was replaced
    Updated,
    /// The URL changed while fetching; fetch the current one
    Stale,
    /// The fetch failed in a new way; tell the user
    Failed(String),
    /// Same failure as last time, previous layer kept
    StillFailing,
}

/// Fetch lifecycle of the overlay layer
///
/// At most one fetch is in flight. A failure keeps the last good layer
/// and is reported once until the outcome changes.
#[derive(Debug, Default)]
pub struct OverlayRefresh {
    layer: Option<OverlayLayer>,
    fetching: bool,
    error: Option<String>,
}

impl OverlayRefresh {
    /// The layer to draw for `current`, hiding one fetched for another URL
    pub fn layer(&self, current: Option<&str>) -> Option<&OverlayLayer> {
        self.layer
            .as_ref()
            .filter(|layer| current == Some(layer.url.as_str()))
    }

    /// Claim the fetch slot for `current`, returning the URL to fetch
    pub fn begin(&mut self, current: Option<&str>) -> Option<String> {
        if self.fetching {
            return None;
        }
        let url = current?;
        self.fetching = true;
        Some(url.to_owned())
    }

    /// The overlay URL changed: start from a blank layer
    pub fn reset(&mut self) {
        self.layer = None;
        self.error = None;
    }

    /// Record the result of the fetch for `url`
    pub fn finish(
        &mut self,
        url: &str,
        current: Option<&str>,
        result: std::result::Result<OverlayLayer, String>,
    ) -> RefreshOutcome {
        self.fetching = false;
        if current != Some(url) {
            debug!(%url, "discarding overlay for a previous url");
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(layer) => {
                if self.error.take().is_some() {
                    info!(%url, "overlay reachable again");
                }
                self.layer = Some(layer);
                RefreshOutcome::Updated
            }
            Err(e) if self.error.as_deref() == Some(e.as_str()) => RefreshOutcome::StillFailing,
            Err(e) => {
                self.error = Some(e.clone());
                RefreshOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    const PAGE_URL: &str = "http://localhost:3000";

    /// Renders every page as a blank PNG of the viewport size
    #[derive(Default)]
    struct BlankRenderer {
        rendered: Mutex<Vec<Url>>,
    }

    impl PageRenderer for BlankRenderer {
        fn render(&self, url: &Url, (width, height): (u32, u32)) -> Result<Vec<u8>> {
            self.rendered.lock().unwrap().push(url.clone());
            let mut png = Vec::new();
            RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            Ok(png)
        }
    }

    fn layer(url: &str) -> OverlayLayer {
        OverlayLayer {
            url: url.to_owned(),
            width: 1,
            height: 1,
            handle: Handle::from_rgba(1, 1, vec![0; 4]),
        }
    }

    #[test]
    fn test_resolve_schemes() {
        assert!(matches!(
            OverlaySource::resolve("https://example.com/shot.png"),
            Ok(OverlaySource::Http(_))
        ));
        assert_eq!(
            OverlaySource::resolve("shots/page.png").unwrap(),
            OverlaySource::File(PathBuf::from("shots/page.png"))
        );
        assert!(matches!(
            OverlaySource::resolve("ftp://example.com/shot.png"),
            Err(OverlayError::UnsupportedUrl(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_file_url() {
        assert_eq!(
            OverlaySource::resolve("file:///tmp/page.png").unwrap(),
            OverlaySource::File(PathBuf::from("/tmp/page.png"))
        );
        assert_eq!(
            OverlaySource::resolve("file:///tmp/site/index.HTML").unwrap(),
            OverlaySource::Page(Url::parse("file:///tmp/site/index.HTML").unwrap())
        );
    }

    #[test]
    fn test_resolve_html_path_as_page() {
        match OverlaySource::resolve("site/index.html").unwrap() {
            OverlaySource::Page(url) => {
                assert_eq!(url.scheme(), "file");
                assert!(url.path().ends_with("/site/index.html"));
            }
            other => panic!("expected a page, got {:?}", other),
        }
    }

    #[test]
    fn test_image_body_detection() {
        let mut png = Vec::new();
        RgbaImage::new(2, 2)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        assert!(is_image_body(Some("image/png"), &png));
        assert!(is_image_body(Some("application/octet-stream"), &png));
        assert!(!is_image_body(Some("text/html; charset=utf-8"), b"<html></html>"));
        assert!(!is_image_body(None, b"<!doctype html><h1>WIP</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_overlay_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 128]))
            .save(&path)
            .unwrap();

        let fetcher = OverlayFetcher::with_renderer(Arc::new(BlankRenderer::default())).unwrap();
        let layer = fetcher
            .fetch(path.to_string_lossy().into_owned(), (800, 600))
            .await
            .unwrap();
        assert_eq!((layer.width, layer.height), (4, 4));
    }

    #[tokio::test]
    async fn test_fetch_html_file_is_rendered_at_viewport() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<html><body><h1>WIP page</h1></body></html>").unwrap();

        let renderer = Arc::new(BlankRenderer::default());
        let fetcher = OverlayFetcher::with_renderer(renderer.clone()).unwrap();
        let layer = fetcher
            .fetch(path.to_string_lossy().into_owned(), (64, 48))
            .await
            .unwrap();

        assert_eq!((layer.width, layer.height), (64, 48));
        let rendered = renderer.rendered.lock().unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].scheme(), "file");
    }

    #[tokio::test]
    async fn test_fetch_overlay_missing_file() {
        let fetcher = OverlayFetcher::with_renderer(Arc::new(BlankRenderer::default())).unwrap();
        let result = fetcher.fetch("/nonexistent/page.png".into(), (800, 600)).await;
        assert!(matches!(result, Err(OverlayError::Io { .. })));
    }

    #[test]
    fn test_one_fetch_in_flight() {
        let mut refresh = OverlayRefresh::default();
        assert_eq!(refresh.begin(None), None);
        assert_eq!(refresh.begin(Some(PAGE_URL)).as_deref(), Some(PAGE_URL));
        assert_eq!(refresh.begin(Some(PAGE_URL)), None);

        refresh.finish(PAGE_URL, Some(PAGE_URL), Ok(layer(PAGE_URL)));
        assert!(refresh.begin(Some(PAGE_URL)).is_some());
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut refresh = OverlayRefresh::default();
        refresh.begin(Some("http://old"));
        refresh.reset();

        let outcome = refresh.finish("http://old", Some("http://new"), Ok(layer("http://old")));
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert!(refresh.layer(Some("http://new")).is_none());
        assert_eq!(refresh.begin(Some("http://new")).as_deref(), Some("http://new"));
    }

    #[test]
    fn test_failure_keeps_previous_layer() {
        let mut refresh = OverlayRefresh::default();
        refresh.begin(Some(PAGE_URL));
        refresh.finish(PAGE_URL, Some(PAGE_URL), Ok(layer(PAGE_URL)));

        refresh.begin(Some(PAGE_URL));
        let outcome = refresh.finish(PAGE_URL, Some(PAGE_URL), Err("connection refused".into()));
        assert_eq!(outcome, RefreshOutcome::Failed("connection refused".into()));
        assert!(refresh.layer(Some(PAGE_URL)).is_some());
    }

    #[test]
    fn test_failure_reported_once_per_change() {
        fn fail(
            refresh: &mut OverlayRefresh,
            result: std::result::Result<OverlayLayer, String>,
        ) -> RefreshOutcome {
            refresh.begin(Some(PAGE_URL));
            refresh.finish(PAGE_URL, Some(PAGE_URL), result)
        }

        let mut refresh = OverlayRefresh::default();

        assert!(matches!(fail(&mut refresh, Err("refused".into())), RefreshOutcome::Failed(_)));
        assert_eq!(fail(&mut refresh, Err("refused".into())), RefreshOutcome::StillFailing);
        assert!(matches!(fail(&mut refresh, Err("timed out".into())), RefreshOutcome::Failed(_)));
        assert_eq!(fail(&mut refresh, Ok(layer(PAGE_URL))), RefreshOutcome::Updated);
        assert!(matches!(fail(&mut refresh, Err("timed out".into())), RefreshOutcome::Failed(_)));
    }

    #[test]
    fn test_url_change_clears_layer() {
        let mut refresh = OverlayRefresh::default();
        refresh.begin(Some(PAGE_URL));
        refresh.finish(PAGE_URL, Some(PAGE_URL), Err("refused".into()));
        refresh.begin(Some(PAGE_URL));
        refresh.finish(PAGE_URL, Some(PAGE_URL), Ok(layer(PAGE_URL)));
        assert!(refresh.layer(Some("http://other")).is_none());

        refresh.reset();
        assert!(refresh.layer(Some(PAGE_URL)).is_none());

        // The error was cleared along with the layer
        refresh.begin(Some("http://other"));
        let outcome = refresh.finish("http://other", Some("http://other"), Err("refused".into()));
        assert_eq!(outcome, RefreshOutcome::Failed("refused".into()));
    }
}
