pub mod minify;
pub mod parse;

use futures::future::join_all;
use reqwest::header::{CONTENT_LENGTH, LOCATION};
use reqwest::{redirect, Client, ClientBuilder, Method, Response};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::error::{AppError, Result};
use crate::models::{ImageInfo, ScrapedContent};
use crate::security::TargetGuard;

pub use minify::is_minified;
pub use parse::{parse_page, ParsedPage};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; SeoAuditor/0.1; +https://github.com/seo-auditor)";
pub const MAX_REDIRECTS: usize = 5;

/// Fetches a page and turns it into [`ScrapedContent`].
///
/// Every request, including redirect hops and image size lookups, is admitted
/// by the [`TargetGuard`] and pinned to the addresses it approved.
pub struct ContentExtractor {
    guard: Arc<dyn TargetGuard>,
    timeout: Duration,
}

impl ContentExtractor {
    pub fn new(timeout_secs: u64, guard: Arc<dyn TargetGuard>) -> Result<Self> {
        let extractor = Self {
            guard,
            timeout: Duration::from_secs(timeout_secs),
        };
        // Surface builder problems at startup rather than on the first request
        extractor
            .client_builder()
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(extractor)
    }

    /// Extracts `url`, connecting to `addrs` for the first hop. Empty `addrs`
    /// sends the URL through the guard first.
    pub async fn extract(&self, url: &Url, addrs: &[IpAddr]) -> Result<ScrapedContent> {
        let fetch_start = std::time::Instant::now();
        let html = self.fetch_html(url, addrs).await?;
        info!("Fetched {} ({} bytes) in {:?}", url, html.len(), fetch_start.elapsed());

        // Html is not Send, so parsing finishes before the next await
        let page = parse_page(&html, url);
        debug!(
            "Parsed {} headings, {} images, {} links",
            page.headings.len(),
            page.images.len(),
            page.internal_links.len() + page.outbound_links.len()
        );

        let images = self.size_images(page.images).await;

        Ok(ScrapedContent {
            title: page.title,
            meta_description: page.meta_description,
            open_graph: page.open_graph,
            content: page.content,
            paragraphs: page.paragraphs,
            headings: page.headings,
            images,
            internal_links: page.internal_links,
            outbound_links: page.outbound_links,
            resources: page.resources,
            schema: page.schema,
        })
    }

    async fn fetch_html(&self, url: &Url, addrs: &[IpAddr]) -> Result<String> {
        let mut current_url = url.clone();
        let mut current_addrs = if addrs.is_empty() {
            self.guard.admit(url).await?
        } else {
            addrs.to_vec()
        };
        let mut redirects = 0;

        loop {
            let response = self
                .send_pinned(Method::GET, &current_url, &current_addrs)
                .await
                .map_err(|e| AppError::NetworkError(format!("Failed to fetch {}: {}", current_url, e)))?;

            let status = response.status();
            if status.is_redirection() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(AppError::NetworkError(format!(
                        "Failed to fetch {}: more than {} redirects",
                        url, MAX_REDIRECTS
                    )));
                }

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| {
                        AppError::NetworkError(format!("Redirect from {} has no Location", current_url))
                    })?;
                let next_url = current_url.join(location).map_err(|e| {
                    AppError::NetworkError(format!("Invalid redirect target {:?}: {}", location, e))
                })?;

                debug!("Following redirect {} -> {}", current_url, next_url);
                current_addrs = self.guard.admit(&next_url).await.map_err(|rejection| {
                    warn!(target: "security", from = %current_url, to = %next_url, %rejection, "redirect refused");
                    AppError::from(rejection)
                })?;
                current_url = next_url;
                continue;
            }

            if !status.is_success() {
                return Err(AppError::NetworkError(format!(
                    "Failed to fetch {}: server responded with {}",
                    current_url, status
                )));
            }

            let html = response.text().await?;
            return Ok(html);
        }
    }

    async fn size_images(&self, images: Vec<(String, String)>) -> Vec<ImageInfo> {
        let lookups = images.iter().map(|(src, _)| self.content_length(src));
        let sizes = join_all(lookups).await;

        images
            .into_iter()
            .zip(sizes)
            .map(|((src, alt), size)| ImageInfo { src, alt, size })
            .collect()
    }

    /// Best-effort `Content-Length` of an image; any failure leaves the size unknown.
    async fn content_length(&self, src: &str) -> Option<u64> {
        let url = Url::parse(src).ok().filter(|url| matches!(url.scheme(), "http" | "https"))?;
        let addrs = match self.guard.admit(&url).await {
            Ok(addrs) => addrs,
            Err(rejection) => {
                warn!(target: "security", url = src, %rejection, "skipping image size lookup");
                return None;
            }
        };

        let response = match self.send_pinned(Method::HEAD, &url, &addrs).await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("HEAD {} returned {}", src, response.status());
                return None;
            }
            Err(e) => {
                debug!("HEAD {} failed: {}", src, e);
                return None;
            }
        };

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
    }

    /// Sends one request without following redirects, trying each admitted address in turn.
    async fn send_pinned(&self, method: Method, url: &Url, addrs: &[IpAddr]) -> Result<Response> {
        let mut last_error = None;
        for addr in addrs {
            let client = self.pinned_client(url, *addr)?;
            match client.request(method.clone(), url.as_str()).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() => return Err(e.into()),
                Err(e) => {
                    debug!("{} {} via {} failed: {}", method, url, addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => e.into(),
            None => AppError::NetworkError(format!("No address to connect to for {}", url)),
        })
    }

    fn pinned_client(&self, url: &Url, addr: IpAddr) -> Result<Client> {
        let mut builder = self.client_builder();
        if let Some(Host::Domain(domain)) = url.host() {
            let port = url.port_or_known_default().unwrap_or(443);
            builder = builder.resolve(domain, SocketAddr::new(addr, port));
        }
        Ok(builder.build()?)
    }

    fn client_builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .connect_timeout(self.timeout / 2)
            .redirect(redirect::Policy::none())
    }
}
