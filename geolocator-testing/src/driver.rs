use std::{sync::Arc, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use geolocator_logic::{
    DetachedCall, Geolocator, GeolocatorPositionAccuracy, GeolocatorResult, GeolocatorSettings,
    RuntimePlatform, ServiceCollection,
};
use geolocator_test_shared::prelude::*;
use geolocator_transport::{DEFAULT_SOCKET_NAME, SocketTransport};
use log::{info, warn};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;

type SocketGeolocator = Geolocator<SocketTransport>;
type DetachedFn = fn(&Arc<SocketGeolocator>, Option<Duration>) -> GeolocatorResult<DetachedCall>;

#[derive(Parser)]
/// Drive a geolocator connected to a native peer and print the results as JSON
struct Cli {
    /// Name of the local socket the native peer is listening on
    #[arg(long, default_value = DEFAULT_SOCKET_NAME)]
    socket: String,

    /// Treat the page as running in a browser
    #[arg(long)]
    web: bool,

    /// Seconds to wait for the native layer, uses the per-call default if not given
    #[arg(long)]
    timeout: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum AccuracyValue {
    Lowest,
    Low,
    Medium,
    High,
    Best,
    BestForNavigation,
    Reduced,
}

impl From<AccuracyValue> for GeolocatorPositionAccuracy {
    fn from(value: AccuracyValue) -> Self {
        match value {
            AccuracyValue::Lowest => GeolocatorPositionAccuracy::Lowest,
            AccuracyValue::Low => GeolocatorPositionAccuracy::Low,
            AccuracyValue::Medium => GeolocatorPositionAccuracy::Medium,
            AccuracyValue::High => GeolocatorPositionAccuracy::High,
            AccuracyValue::Best => GeolocatorPositionAccuracy::Best,
            AccuracyValue::BestForNavigation => GeolocatorPositionAccuracy::BestForNavigation,
            AccuracyValue::Reduced => GeolocatorPositionAccuracy::Reduced,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get a fresh position fix
    Current {
        #[arg(long, value_enum, default_value_t = AccuracyValue::Best)]
        accuracy: AccuracyValue,
        /// Minimum distance in meters the device has to move before a new position is pushed
        #[arg(long, default_value_t = 0)]
        distance_filter: u32,
    },
    /// Get the position the device last cached
    Last,
    /// Get the current permission status
    Permission,
    /// Ask the user for location access
    Request,
    /// Check whether location services are switched on
    Enabled,
    /// Open the app's settings page
    AppSettings {
        /// Don't wait for the result, failures are reported as error events
        #[arg(long)]
        detach: bool,
    },
    /// Open the device's location settings
    LocationSettings {
        /// Don't wait for the result, failures are reported as error events
        #[arg(long)]
        detach: bool,
    },
    /// Distance in meters between two coordinates
    Distance {
        #[arg(allow_hyphen_values = true)]
        start_latitude: f64,
        #[arg(allow_hyphen_values = true)]
        start_longitude: f64,
        #[arg(allow_hyphen_values = true)]
        end_latitude: f64,
        #[arg(allow_hyphen_values = true)]
        end_longitude: f64,
    },
    /// Print position changes as the native layer pushes them
    Watch {
        /// Stop after this many positions
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(long, value_enum, default_value_t = AccuracyValue::Best)]
        accuracy: AccuracyValue,
        #[arg(long, default_value_t = 0)]
        distance_filter: u32,
    },
}

fn settings(accuracy: AccuracyValue, distance_filter: u32) -> GeolocatorSettings {
    GeolocatorSettings::with_accuracy(accuracy.into()).distance_filter(distance_filter)
}

/// Run a detached call and report whatever ends up on the error channel
async fn run_detached(
    geo: &Arc<SocketGeolocator>,
    call: DetachedFn,
    timeout: Option<Duration>,
) -> Result<Value> {
    let mut errors = geo.subscribe_errors();
    let detached = call(geo, timeout)?;
    detached.join().await;

    match errors.try_recv() {
        Ok(event) => Ok(json!({ "detached": true, "error": event.data })),
        Err(_) => Ok(json!({ "detached": true })),
    }
}

async fn watch(geo: &SocketGeolocator, settings: GeolocatorSettings, count: usize) -> Result<Value> {
    geo.set_configuration(Some(settings)).await;

    let mut positions = geo.subscribe_position_changes();
    let mut errors = geo.subscribe_errors();

    let first = geo.get_current_position(None, None).await?;
    let mut seen = vec![serde_json::to_value(first)?];

    while seen.len() < count {
        tokio::select! {
            res = positions.recv() => match res {
                Ok(event) => {
                    info!("Moved to {}, {}", event.position.latitude, event.position.longitude);
                    seen.push(serde_json::to_value(event.position)?);
                }
                Err(RecvError::Lagged(missed)) => warn!("Missed {missed} position updates"),
                Err(RecvError::Closed) => bail!("Geolocator stopped"),
            },
            res = errors.recv() => match res {
                Ok(event) => bail!("Native layer reported an error: {}", event.data),
                Err(RecvError::Lagged(missed)) => warn!("Missed {missed} error events"),
                Err(RecvError::Closed) => bail!("Geolocator stopped"),
            },
        }
    }

    Ok(Value::Array(seen))
}

async fn run(geo: &Arc<SocketGeolocator>, command: Commands, timeout: Option<Duration>) -> Result<Value> {
    let value = match command {
        Commands::Current {
            accuracy,
            distance_filter,
        } => {
            let settings = settings(accuracy, distance_filter);
            serde_json::to_value(geo.get_current_position(Some(settings), timeout).await?)?
        }
        Commands::Last => serde_json::to_value(geo.get_last_known_position(timeout).await?)?,
        Commands::Permission => serde_json::to_value(geo.get_permission_status(timeout).await?)?,
        Commands::Request => serde_json::to_value(geo.request_permission(timeout).await?)?,
        Commands::Enabled => json!(geo.is_location_service_enabled(timeout).await?),
        Commands::AppSettings { detach: true } => {
            run_detached(geo, SocketGeolocator::open_app_settings_detached, timeout).await?
        }
        Commands::AppSettings { detach: false } => json!(geo.open_app_settings(timeout).await?),
        Commands::LocationSettings { detach: true } => {
            run_detached(geo, SocketGeolocator::open_location_settings_detached, timeout).await?
        }
        Commands::LocationSettings { detach: false } => {
            json!(geo.open_location_settings(timeout).await?)
        }
        Commands::Distance {
            start_latitude,
            start_longitude,
            end_latitude,
            end_longitude,
        } => json!(
            geo.distance_between(
                start_latitude,
                start_longitude,
                end_latitude,
                end_longitude,
                timeout
            )
            .await?
        ),
        Commands::Watch {
            count,
            accuracy,
            distance_filter,
        } => watch(geo, settings(accuracy, distance_filter), count).await?,
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    let timeout = cli
        .timeout
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("Invalid timeout")?;

    let platform = if cli.web {
        RuntimePlatform::Web
    } else {
        RuntimePlatform::native()
    };

    let transport = SocketTransport::connect(&cli.socket)
        .await
        .context("Failed to connect to native peer")?;

    let mut services = ServiceCollection::new();
    let geo = services.add(Arc::new(Geolocator::new(transport, platform, None)));

    let res = run(&geo, cli.command, timeout).await;

    services.shutdown().await;

    let value = res?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}
