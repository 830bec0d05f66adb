// src/fetch/mod.rs
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use url::Url;

use crate::error::ScrapeError;

/// Origin the bulletin's relative image links resolve against.
pub const SBV_ORIGIN: &str = "https://sbv.gov.vn";

/// CSS class identifying the bulletin image on the statistics page.
const IMG_SELECTOR: &str = "img.w-100";

/// GET the bulletin page and return its markup.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(html)
}

/// Locate the bulletin `<img>` in the page and resolve its `src` against
/// the fixed SBV origin.
pub fn bulletin_image_url(html: &str) -> Result<String, ScrapeError> {
    let selector =
        Selector::parse(IMG_SELECTOR).expect("CSS selector for the bulletin image should be valid");
    let doc = Html::parse_document(html);
    let src = doc
        .select(&selector)
        .filter_map(|e| e.value().attr("src"))
        .next()
        .ok_or_else(|| {
            ScrapeError::Extraction(format!("no {} element on the bulletin page", IMG_SELECTOR))
        })?;

    let base = Url::parse(SBV_ORIGIN).expect("origin URL should be valid");
    let url = base
        .join(src)
        .map_err(|e| ScrapeError::Extraction(format!("bad image href {:?}: {}", src, e)))?;
    Ok(url.to_string())
}

/// Download the bulletin image and save it at `dest`. Returns the full
/// path of the saved file.
pub async fn download_image(
    client: &Client,
    url: &str,
    dest: impl AsRef<Path>,
) -> Result<PathBuf, ScrapeError> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let resp = client.get(url).send().await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    fs::write(dest, &bytes).await?;

    info!(url, path = %dest.display(), "downloaded bulletin image");
    Ok(dest.to_path_buf())
}
