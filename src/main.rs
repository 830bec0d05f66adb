use anyhow::Result;
use reqwest::Client;
use sbvscraper::{
    config::Config,
    fetch,
    history::HistoryStore,
    ocr,
    process::{self, freshness, normalize, period},
};
use std::{fs, sync::Arc};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) configuration + logging ──────────────────────────────────
    dotenvy::dotenv().ok();
    let cfg = Config::from_env()?;
    fs::create_dir_all(&cfg.img_folder)?;
    fs::create_dir_all(&cfg.log_folder)?;
    init_logging(&cfg)?;
    info!("startup");
    if let Some(addr) = &cfg.noti_email {
        debug!(addr = %addr, "workflow notifications configured");
    }

    // ─── 2) read old data ────────────────────────────────────────────
    let store = HistoryStore::new(&cfg.data_path);
    let mut dataset = store.load()?;
    let latest = dataset.latest_period();

    // ─── 3) locate + download the bulletin image ─────────────────────
    let client = Client::new();
    let html = fetch::fetch_page(&client, &cfg.bulletin_url).await?;
    let img_url = fetch::bulletin_image_url(&html)?;
    let img_path = fetch::download_image(&client, &img_url, cfg.img_save_path()).await?;

    // ─── 4) OCR + table extraction ───────────────────────────────────
    let pdf_path = ocr::image_to_pdf(&img_path, &cfg.pdf_name)?;
    let table = process::read_bulletin_table(&pdf_path)?;
    let current = period::extract_period(&table)?;

    // ─── 5) compare + conditionally merge ────────────────────────────
    if freshness::is_up_to_date(latest, current) {
        return Ok(());
    }

    info!("Updating data for {}", current);
    let record = normalize::normalize(&table, current)?;
    dataset.push(record.into());
    store.save(&dataset)?;
    info!("Data updated successfully!");

    Ok(())
}

/// Console layer plus an append-mode file layer, so every leveled message
/// lands both on stdout and in the run log.
fn init_logging(cfg: &Config) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(cfg.log_file())?;
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .init();
    Ok(())
}
