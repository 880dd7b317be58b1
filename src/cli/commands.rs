//! Subcommand handlers: the session driver and catalog lookups.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::args::RunArgs;
use crate::api::{ClothingItem, ShopClient};
use crate::capture::{FrameSource, StillFrameSource};
use crate::channel::{connect_with_retry, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX};
use crate::config::Config;
use crate::overlay::RasterSurface;
use crate::session::{
    self, GarmentSelection, SessionCommand, SessionExit, SessionUpdate, TryOnController,
};

type CommandResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Surface size used when the frame directory has no readable first frame.
const FALLBACK_SURFACE: (u32, u32) = (640, 480);

/// Run one try-on session until Ctrl+C, `--duration` or the service goes away.
pub async fn run_session(args: RunArgs, config: Config) -> CommandResult<SessionExit> {
    let mut source = StillFrameSource::from_dir(&args.frames)?;
    log::info!(
        "Replaying {} frame(s) from {}",
        source.len(),
        args.frames.display()
    );
    let (width, height) = source.dimensions().unwrap_or(FALLBACK_SURFACE);

    let (sink, mut events) = connect_with_retry(
        &config.channel.address,
        config.channel.connect_retries,
        DEFAULT_BACKOFF_BASE,
        DEFAULT_BACKOFF_MAX,
    )
    .await?;

    let mut controller = TryOnController::new(
        config.session_settings(),
        sink,
        RasterSurface::new(width, height),
    );

    let (cmd_tx, mut commands) = unbounded_channel();
    let (update_tx, update_rx) = unbounded_channel();
    setup_ctrlc_handler(cmd_tx.clone())?;

    cmd_tx.send(SessionCommand::Start)?;
    if let Some(item_id) = args.garment {
        cmd_tx.send(SessionCommand::SelectGarment(GarmentSelection::new(item_id)))?;
    }
    if let Some(secs) = args.duration {
        let tx = cmd_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            log::info!("Session duration elapsed");
            let _ = tx.send(SessionCommand::Shutdown);
        });
    }
    let presenter = tokio::spawn(present_updates(update_rx, cmd_tx, args.garment));

    let exit = session::run(
        &mut controller,
        &mut source,
        &mut events,
        &mut commands,
        Some(&update_tx),
    )
    .await;

    if let Some(path) = &args.snapshot {
        controller.renderer().surface().save_png(path)?;
        log::info!("Overlay snapshot written to {}", path.display());
    }
    controller.stop();

    drop(update_tx);
    let _ = presenter.await;

    if let Some(estimate) = controller.state().size_estimate() {
        println!("Recommended size: {}", estimate);
    }
    Ok(exit)
}

/// Log session updates for the terminal. Re-sends the garment selection the
/// first time measurements arrive, since try-on is withheld until then.
async fn present_updates(
    mut updates: UnboundedReceiver<SessionUpdate>,
    commands: UnboundedSender<SessionCommand>,
    garment: Option<u64>,
) {
    let mut pending_selection = garment;
    while let Some(update) = updates.recv().await {
        match update {
            SessionUpdate::MeasurementsUpdated(measurements) => {
                let summary: Vec<String> = measurements
                    .iter()
                    .map(|(name, value)| format!("{}={:.1}", name, value))
                    .collect();
                log::info!("Measurements: {}", summary.join(" "));
                if let Some(item_id) = pending_selection.take() {
                    let _ = commands.send(SessionCommand::SelectGarment(GarmentSelection::new(
                        item_id,
                    )));
                }
            }
            SessionUpdate::SizeEstimated(estimate) => log::info!("Size: {}", estimate),
            SessionUpdate::CameraUnavailable(notice) => {
                eprintln!("Camera unavailable: {}", notice)
            }
            other => log::debug!("{:?}", other),
        }
    }
}

/// Set up the Ctrl+C handler to end the session loop.
///
/// This should be called once at program startup.
fn setup_ctrlc_handler(commands: UnboundedSender<SessionCommand>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, shutting down...");
        let _ = commands.send(SessionCommand::Shutdown);
    })
}

fn shop_client(api: Option<String>, config: &Config) -> CommandResult<ShopClient> {
    let base_url = api.unwrap_or_else(|| config.api.base_url.clone());
    Ok(ShopClient::with_timeout(base_url, config.api.timeout())?)
}

fn print_item(item: &ClothingItem) {
    println!("  [{}] {} - ${:.2}", item.id, item.name, item.price);
    if let Some(description) = &item.description {
        println!("      {}", description);
    }
    if !item.sizes.is_empty() {
        println!("      sizes: {}", item.sizes.join(", "));
    }
}

/// Print the featured catalog items.
pub async fn list_featured(api: Option<String>, config: &Config) -> CommandResult<()> {
    let client = shop_client(api, config)?;
    let items = client.fetch_featured().await?;
    if items.is_empty() {
        println!("No featured items.");
    } else {
        println!("Featured items:");
        for item in &items {
            print_item(item);
        }
    }
    Ok(())
}

/// Print one catalog item.
pub async fn show_item(id: u64, api: Option<String>, config: &Config) -> CommandResult<()> {
    let client = shop_client(api, config)?;
    let item = client.fetch_item(id).await?;
    print_item(&item);
    Ok(())
}

/// Load the config named on the command line, or the default one.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> CommandResult<Config> {
    if let Some(missing) = path.filter(|p| !p.exists()) {
        return Err(format!("Config file not found: {}", missing.display()).into());
    }
    let mut config = Config::load(path)?;
    config.apply_env();
    Ok(config)
}
