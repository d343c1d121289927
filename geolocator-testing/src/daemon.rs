use std::time::Duration;

use clap::{Parser, ValueEnum};
use geolocator_logic::GeolocatorPermissionStatus;
use geolocator_test_shared::{DeviceConfig, SimulatedDevice, prelude::*};
use geolocator_transport::{
    DEFAULT_SOCKET_NAME,
    protocol::{BridgeFrame, PeerFrame, decode_line, encode_line},
    socket_name,
};
use interprocess::local_socket::{
    ListenerOptions,
    tokio::{Stream, prelude::*},
};
use log::{debug, error, info, warn};
use serde_json::json;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum PermissionValue {
    Denied,
    DeniedForever,
    WhileInUse,
    Always,
    UnableToDetermine,
}

impl From<PermissionValue> for GeolocatorPermissionStatus {
    fn from(value: PermissionValue) -> Self {
        match value {
            PermissionValue::Denied => GeolocatorPermissionStatus::Denied,
            PermissionValue::DeniedForever => GeolocatorPermissionStatus::DeniedForever,
            PermissionValue::WhileInUse => GeolocatorPermissionStatus::WhileInUse,
            PermissionValue::Always => GeolocatorPermissionStatus::Always,
            PermissionValue::UnableToDetermine => GeolocatorPermissionStatus::UnableToDetermine,
        }
    }
}

#[derive(Parser)]
/// Simulated native location layer, serves one bridge at a time
struct Cli {
    /// Name of the local socket to listen on
    #[arg(default_value = DEFAULT_SOCKET_NAME)]
    socket: String,

    /// Behave like a browser: no last known position, no settings pages
    #[arg(long)]
    web: bool,

    /// Permission the app starts out with
    #[arg(long, value_enum, default_value_t = PermissionValue::Denied)]
    permission: PermissionValue,

    /// Start with location services switched off
    #[arg(long)]
    service_disabled: bool,

    #[arg(long, default_value_t = 37.7749, allow_hyphen_values = true)]
    latitude: f64,

    #[arg(long, default_value_t = -122.4194, allow_hyphen_values = true)]
    longitude: f64,

    /// Milliseconds between simulated movements
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Largest distance in meters moved per interval
    #[arg(long, default_value_t = 15.0)]
    max_step: f64,

    /// Seed for the random walk
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Wait this many milliseconds before answering a call
    #[arg(long, default_value_t = 0)]
    reply_delay_ms: u64,

    /// Never answer calls to this method, can be repeated
    #[arg(long)]
    ignore: Vec<String>,

    /// Switch location services off after this many intervals and report it as an error
    #[arg(long)]
    disable_after: Option<u32>,
}

impl Cli {
    fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            start: (self.latitude, self.longitude),
            permission: self.permission.into(),
            service_enabled: !self.service_disabled,
            web: self.web,
            max_step: self.max_step.max(0.0),
            seed: self.seed,
        }
    }
}

/// Decide what to do with one line from the bridge, replies are queued on `replies`
fn handle_line(
    cli: &Cli,
    device: &mut SimulatedDevice,
    line: &str,
    replies: &mpsc::Sender<PeerFrame>,
) {
    let BridgeFrame::Invoke { id, method, args } = match decode_line(line) {
        Ok(frame) => frame,
        Err(why) => {
            warn!("Ignoring frame: {why:?}");
            return;
        }
    };

    if cli.ignore.contains(&method) {
        info!("Ignoring call {id} to {method}");
        return;
    }

    let frame = match device.handle_call(&method, &args) {
        Ok(result) => {
            debug!("{method} ({id}) -> {result}");
            PeerFrame::Reply { id, result }
        }
        Err(message) => {
            warn!("{method} ({id}) failed: {message}");
            PeerFrame::Failed { id, message }
        }
    };

    let delay = Duration::from_millis(cli.reply_delay_ms);
    let replies = replies.clone();
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        replies.send(frame).await.ok();
    });
}

/// Serve a connected bridge until it hangs up. Returns whether the daemon should exit.
async fn serve(cli: &Cli, device: &mut SimulatedDevice, stream: Stream) -> Result<bool> {
    let mut lines = BufReader::new(&stream).lines();
    let mut send = &stream;

    let (reply_tx, mut reply_rx) = mpsc::channel::<PeerFrame>(40);
    let mut ticker = tokio::time::interval(Duration::from_millis(cli.interval_ms.max(1)));
    let mut ticks = 0;

    loop {
        let frame = tokio::select! {
            Ok(_) = tokio::signal::ctrl_c() => {
                return Ok(true);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    handle_line(cli, device, &line, &reply_tx);
                    continue;
                }
                Ok(None) => {
                    info!("Bridge disconnected");
                    return Ok(false);
                }
                Err(why) => {
                    error!("Read Error: {why:?}");
                    return Ok(false);
                }
            },
            Some(frame) = reply_rx.recv() => frame,
            _ = ticker.tick() => {
                ticks += 1;
                if cli.disable_after == Some(ticks) {
                    device.set_service_enabled(false);
                    PeerFrame::error(json!("Location services are disabled"))
                } else if let Some(position) = device.step() {
                    PeerFrame::position_change(position)
                } else {
                    continue;
                }
            }
        };

        let encoded = encode_line(&frame)?;
        send.write_all(&encoded)
            .await
            .context("Failed to send frame")?;
    }
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    let name = socket_name(&cli.socket)?;
    let opts = ListenerOptions::new().name(name);
    let listener = opts.create_tokio().context("Failed to bind to socket")?;

    let mut device = SimulatedDevice::new(cli.device_config());

    info!("Native peer listening on {}", cli.socket);

    'server: loop {
        let res = tokio::select! {
            res = listener.accept() => {
                res
            },
            Ok(_) = tokio::signal::ctrl_c() => {
                break 'server;
            }
        };

        match res {
            Ok(stream) => {
                info!("Bridge connected");
                match serve(&cli, &mut device, stream).await {
                    Ok(true) => break 'server,
                    Ok(false) => {}
                    Err(why) => error!("Connection failed: {why:?}"),
                }
            }
            Err(why) => error!("Error from connection: {why:?}"),
        }
    }

    Ok(())
}
