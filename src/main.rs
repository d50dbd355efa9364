use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use ytb_extractor::config::ExtractorConfig;
use ytb_extractor::dom::Page;
use ytb_extractor::engine::Extractor;
use ytb_extractor::export::ExportFormat;
use ytb_extractor::extract::ITEM_CONTAINERS;
use ytb_extractor::messaging::{channel, Message, Response};
#[cfg(feature = "backend")]
use ytb_extractor::net::backend::{DownloadChecker, DEFAULT_BACKEND_URL};
use ytb_extractor::storage::{JsonFileStore, KeyValueStore, MemoryStore};

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Select videos on a saved feed page and export them.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Saved page markup
    page: PathBuf,
    /// URL the page was served from (resolves relative links)
    #[arg(long, env = "YTB_PAGE_URL", default_value = "https://www.youtube.com/")]
    url: String,
    /// Video ids to select
    #[arg(short, long = "select", value_name = "VIDEO_ID")]
    select: Vec<String>,
    /// Select every rendered video
    #[arg(long, conflicts_with = "select")]
    all: bool,
    /// csv, json, clipboard or idm
    #[arg(short, long, default_value = "csv")]
    format: ExportFormat,
    /// Output file or directory; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// JSON file holding the persisted enabled flag
    #[arg(long, env = "YTB_STATE_FILE")]
    state_file: Option<PathBuf>,
    /// Persist the enabled flag before loading the page
    #[arg(long)]
    enable: bool,
    /// Download-tracking service to annotate the selection with
    /// (bare `--backend` uses the local default)
    #[cfg(feature = "backend")]
    #[arg(long, env = "YTB_BACKEND_URL", num_args = 0..=1, default_missing_value = DEFAULT_BACKEND_URL)]
    backend: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let html = fs::read_to_string(&cli.page)
        .with_context(|| format!("failed to read {}", cli.page.display()))?;
    let mut page = Page::parse(&html, &cli.url)?;
    let config = ExtractorConfig::default();
    let key = config.storage_key.clone();

    let mut store: Box<dyn KeyValueStore> = match &cli.state_file {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    };

    let (controller, port) = channel();
    let mut extractor = Extractor::new(config).with_sink(Box::new(port.notifier()));

    // Without a state file there is nothing to respect: behave as switched on.
    if cli.enable || cli.state_file.is_none() {
        controller.set_enabled(store.as_mut(), &key, true)?;
    }
    extractor.bootstrap(&mut page, store.as_ref());
    extractor.pump(&mut page, &port);
    if !extractor.is_enabled() {
        bail!("extractor is disabled in {:?}; pass --enable", cli.state_file);
    }
    log::info!("{} video cards bound", extractor.bound_cards());

    let wanted: Vec<String> = if cli.all {
        page.select_ids(&ITEM_CONTAINERS)
            .into_iter()
            .filter_map(|card| extractor.bindings().get(card)?.bound_video_id.clone())
            .collect()
    } else {
        cli.select.clone()
    };
    for id in &wanted {
        if extractor.is_selected(id) {
            continue;
        }
        if extractor.toggle_video(&mut page, id).is_none() {
            log::warn!("video {} is not rendered on this page", id);
        }
    }

    #[cfg(feature = "backend")]
    if let Some(base) = &cli.backend {
        annotate(&mut extractor, base)?;
    }

    let pending = controller.request(Message::GetExportData { format: cli.format })?;
    extractor.pump(&mut page, &port);
    let outcome = match pending.wait(REPLY_TIMEOUT)? {
        Response::Outcome(outcome) => outcome,
        other => bail!("unexpected reply to export request: {:?}", other),
    };
    if !outcome.success {
        bail!(outcome.message.unwrap_or_else(|| "export failed".to_string()));
    }
    let data = outcome.data.unwrap_or_default();
    if let Some(count) = controller.latest_count() {
        log::info!("exporting {} videos", count);
    }

    match cli.output {
        Some(path) => {
            let path = match (path.is_dir(), outcome.filename) {
                (true, Some(name)) => path.join(name),
                _ => path,
            };
            fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
        None => println!("{}", data),
    }
    Ok(())
}

#[cfg(feature = "backend")]
fn annotate(extractor: &mut Extractor, base: &str) -> Result<()> {
    let checker = DownloadChecker::new(base)?;
    let annotations = checker.annotations_for(&extractor.selected());
    let applied = extractor.annotate_downloads(&annotations);
    log::info!("{} selected videos annotated with download state", applied);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selection_arguments() {
        let cli = Cli::try_parse_from(["ytb-extractor", "feed.html", "-s", "a1", "-s", "b2", "-f", "idm"])
            .unwrap();
        assert_eq!(cli.select, vec!["a1", "b2"]);
        assert_eq!(cli.format, ExportFormat::Idm);
        assert!(!cli.all);
        assert!(Cli::try_parse_from(["ytb-extractor", "feed.html", "--all", "-s", "a1"]).is_err());
    }

    #[cfg(feature = "backend")]
    #[test]
    fn bare_backend_flag_uses_local_service() {
        let cli = Cli::try_parse_from(["ytb-extractor", "feed.html", "--backend"]).unwrap();
        assert_eq!(cli.backend.as_deref(), Some(DEFAULT_BACKEND_URL));

        let cli =
            Cli::try_parse_from(["ytb-extractor", "feed.html", "--backend", "http://10.0.0.2:8000"]).unwrap();
        assert_eq!(cli.backend.as_deref(), Some("http://10.0.0.2:8000"));
    }
}
