// src/config.rs
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once from the environment at startup and
/// passed down explicitly. `dotenvy::dotenv()` is called by the binary
/// before this is built, so a local `.env` file works too.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page carrying the credit bulletin image.
    pub bulletin_url: String,
    /// Directory the downloaded bulletin image is stored in.
    pub img_folder: PathBuf,
    /// Filename for the downloaded image inside `img_folder`.
    pub img_name: String,
    /// Output stem for the OCR'd PDF (tesseract appends `.pdf`).
    pub pdf_name: String,
    /// Path of the persisted historical dataset.
    pub data_path: PathBuf,
    /// Directory the run log is written to.
    pub log_folder: PathBuf,
    /// Address notified by the surrounding workflow tooling. Recorded here
    /// so the whole contract lives in one struct; the crawl itself never
    /// sends mail.
    pub noti_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bulletin_url: require("DU_NO_URL")?,
            img_folder: PathBuf::from(require("IMG_FOLDER")?),
            img_name: require("IMG_NAME")?,
            pdf_name: require("PDF_NAME")?,
            data_path: PathBuf::from(require("DATA_PATH")?),
            log_folder: PathBuf::from(require("LOG_FOLDER")?),
            noti_email: env::var("NOTI_EMAIL").ok(),
        })
    }

    /// Full path the bulletin image is saved to.
    pub fn img_save_path(&self) -> PathBuf {
        self.img_folder.join(&self.img_name)
    }

    /// Full path of the run log file.
    pub fn log_file(&self) -> PathBuf {
        self.log_folder.join("credit_crawler.log")
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing environment variable {}", key))
}
