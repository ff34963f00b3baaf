use anyhow::{bail, Context, Result};
use clap::Parser;
use courier_nav::sdk::{
    config::{NavigationSettings, ProviderConfig},
    deliveries::DeliveryBook,
    geo::format_distance,
    navigation::{
        position::{initial_center, start_watch, PositionSource, PositionWatch, UnsupportedSource},
        replay::GpxReplaySource,
        NavigationError, NavigationSession,
    },
    routing::{cache::RouteCache, RemoteRoutingProvider},
    util::{log::init_logging, rate_limit::provider_limiter},
};
use std::{fs::File, io::Write, path::PathBuf, sync::Arc, time::Duration};

/// Live turn-by-turn navigation for delivery couriers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Deliveries export from the backend (.json or .csv)
    #[arg(short, long)]
    deliveries: PathBuf,

    /// Recorded drive (.gpx) replayed as the courier's live position
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// Tracking number of the delivery to navigate to (defaults to the first)
    #[arg(long)]
    delivery: Option<String>,

    /// Plan one optimized route through every loaded delivery
    #[arg(long)]
    optimize: bool,

    /// Speak instructions on every step change
    #[arg(long)]
    voice: bool,

    /// Delay between replayed positions, in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Write the final session snapshot to this file as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = NavigationSettings::default();

    // --- 1. Wiring ---
    let config = ProviderConfig::from_env()?;
    let provider = RemoteRoutingProvider::new(&config, provider_limiter(config.requests_per_second))?;
    let cache = Arc::new(RouteCache::new(settings.cache_ttl, settings.cache_capacity));

    let book = DeliveryBook::load(&cli.deliveries)
        .with_context(|| format!("Could not load deliveries from {}", cli.deliveries.display()))?;
    if book.is_empty() {
        bail!("No deliveries found in {}", cli.deliveries.display());
    }
    log::info!("Loaded {} deliveries", book.len());

    let source: Box<dyn PositionSource> = match &cli.track {
        Some(path) => Box::new(GpxReplaySource::from_path(path, Duration::from_millis(cli.interval_ms))?),
        None => Box::new(UnsupportedSource),
    };
    let origin = initial_center(source.as_ref(), &settings.watch, settings.home_center);
    log::info!("Starting from {}", origin);

    // --- 2. Route ---
    let mut session = NavigationSession::new(cache, Arc::new(provider), settings.clone());
    session.set_voice_enabled(cli.voice);

    let route = if cli.optimize {
        session.plan_optimized(book.all().to_vec(), Some(origin))?
    } else {
        let delivery = match &cli.delivery {
            Some(number) => book
                .find(number)
                .with_context(|| format!("Unknown tracking number: {number}"))?,
            None => &book.all()[0],
        };
        session.start(delivery.clone(), Some(origin))?
    };
    if let Some(distance) = route.summary.distance_m {
        log::info!("Route length {}", format_distance(distance));
    }

    // --- 3. Track ---
    if let Some(watch) = start_watch(source.as_ref(), &settings.watch) {
        track(&mut session, watch);
    }

    // --- 4. Output ---
    let snapshot = session.snapshot();
    match &cli.report {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Could not create {}", path.display()))?;
            file.write_all(serde_json::to_string_pretty(&snapshot)?.as_bytes())?;
            log::info!("Session report written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }

    Ok(())
}

fn track(session: &mut NavigationSession, watch: PositionWatch) {
    for update in watch {
        match session.handle_update(update) {
            Ok(outcome) => {
                if outcome.step_changed || outcome.rerouted {
                    let remaining = outcome
                        .remaining_to_next_step
                        .map(format_distance)
                        .unwrap_or_else(|| "-".to_string());
                    log::info!(
                        "Step {} ({}): {}",
                        outcome.active_step_index + 1,
                        remaining,
                        outcome.instruction.as_deref().unwrap_or("")
                    );
                }
                if outcome.arrived {
                    break;
                }
            }
            Err(NavigationError::Position(e)) if e.is_fatal() => {
                log::error!("{}", e);
                break;
            }
            // Surfaced, not fatal: the next position update retries.
            Err(e) => log::warn!("{}", e),
        }
    }
}
