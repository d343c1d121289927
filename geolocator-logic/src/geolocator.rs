use std::{result::Result as StdResult, sync::Arc, time::Duration};

use anyhow::Context;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::{
    sync::{RwLock, broadcast},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::GeolocatorError,
    events::{GeolocatorErrorEvent, GeolocatorPositionChangeEvent},
    position::GeolocatorPosition,
    settings::GeolocatorSettings,
    transport::{Method, NativeEvent, Transport},
    types::{GeolocatorPermissionStatus, RuntimePlatform},
};

pub type GeolocatorResult<T = (), E = GeolocatorError> = StdResult<T, E>;

/// Timeout for calls that don't specify their own
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Getting a fresh fix can take a while depending on the available location services
pub const CURRENT_POSITION_TIMEOUT: Duration = Duration::from_secs(30);
/// Waits on the user answering the OS prompt
pub const REQUEST_PERMISSION_TIMEOUT: Duration = Duration::from_secs(60);

const EVENT_CAPACITY: usize = 32;

/// Published on the error channel once the native layer goes away
pub const DISCONNECTED_MESSAGE: &str = "Native layer disconnected";

/// Non-visual service that gives a page access to the device's location. Calls are forwarded
/// to the native layer through [Transport], and notifications the native layer pushes are
/// re-dispatched to subscribers by [Geolocator::main_loop].
pub struct Geolocator<T: Transport> {
    transport: Arc<T>,
    platform: RuntimePlatform,
    configuration: RwLock<Option<GeolocatorSettings>>,
    position: RwLock<Option<GeolocatorPosition>>,
    position_tx: broadcast::Sender<GeolocatorPositionChangeEvent>,
    error_tx: broadcast::Sender<GeolocatorErrorEvent>,
    cancel: CancellationToken,
}

impl<T: Transport> Geolocator<T> {
    pub fn new(
        transport: Arc<T>,
        platform: RuntimePlatform,
        configuration: Option<GeolocatorSettings>,
    ) -> Self {
        let (position_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (error_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            platform,
            configuration: RwLock::new(configuration),
            position: RwLock::new(None),
            position_tx,
            error_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn platform(&self) -> RuntimePlatform {
        self.platform
    }

    /// Default settings used by [Geolocator::get_current_position] when none are passed
    pub async fn configuration(&self) -> Option<GeolocatorSettings> {
        self.configuration.read().await.clone()
    }

    pub async fn set_configuration(&self, configuration: Option<GeolocatorSettings>) {
        *self.configuration.write().await = configuration;
    }

    /// The last position pushed by the native layer, `None` until the first one arrives
    pub async fn position(&self) -> Option<GeolocatorPosition> {
        *self.position.read().await
    }

    /// Receive every position the native layer pushes from now on
    pub fn subscribe_position_changes(&self) -> broadcast::Receiver<GeolocatorPositionChangeEvent> {
        self.position_tx.subscribe()
    }

    /// Receive errors not tied to a pending call, including failures of detached calls
    pub fn subscribe_errors(&self) -> broadcast::Receiver<GeolocatorErrorEvent> {
        self.error_tx.subscribe()
    }

    fn ensure_supported(&self, method: Method) -> GeolocatorResult {
        if self.platform.is_web() && !method.supported_on_web() {
            Err(GeolocatorError::Unsupported {
                method,
                platform: self.platform,
            })
        } else {
            Ok(())
        }
    }

    async fn invoke(&self, method: Method, args: Value, timeout: Duration) -> GeolocatorResult<Value> {
        debug!("Invoking {method} (timeout {timeout:?})");
        match tokio::time::timeout(timeout, self.transport.invoke(method, args)).await {
            Ok(res) => Ok(res?),
            Err(_) => {
                warn!("{method} did not reply within {timeout:?}");
                Err(GeolocatorError::Timeout { method, timeout })
            }
        }
    }

    async fn invoke_as<R: DeserializeOwned>(
        &self,
        method: Method,
        args: Value,
        timeout: Duration,
    ) -> GeolocatorResult<R> {
        let reply = self.invoke(method, args, timeout).await?;
        serde_json::from_value(reply).map_err(|source| GeolocatorError::InvalidReply { method, source })
    }

    /// Get the current position of the device. Uses `settings` if given, the instance's
    /// configuration otherwise, and falls back to best accuracy if neither is set.
    ///
    /// Depending on the available location services this can take several seconds, consider
    /// showing [Geolocator::get_last_known_position] in the meantime.
    pub async fn get_current_position(
        &self,
        settings: Option<GeolocatorSettings>,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<GeolocatorPosition> {
        let settings = match settings {
            Some(settings) => settings,
            None => self.configuration().await.unwrap_or_default(),
        };
        let configuration = serde_json::to_value(&settings).context("Failed to encode settings")?;
        self.invoke_as(
            Method::GetCurrentPosition,
            json!({ "configuration": configuration }),
            timeout.unwrap_or(CURRENT_POSITION_TIMEOUT),
        )
        .await
    }

    /// Get the last position the device cached, without waiting for a new fix. Not available
    /// on web.
    pub async fn get_last_known_position(
        &self,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<GeolocatorPosition> {
        let method = Method::GetLastKnownPosition;
        self.ensure_supported(method)?;
        self.invoke_as(method, json!({}), timeout.unwrap_or(DEFAULT_TIMEOUT))
            .await
    }

    pub async fn get_permission_status(
        &self,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<GeolocatorPermissionStatus> {
        self.invoke_as(
            Method::GetPermissionStatus,
            json!({}),
            timeout.unwrap_or(DEFAULT_TIMEOUT),
        )
        .await
    }

    /// Ask for access to the device's location, this shows the OS prompt if the user hasn't
    /// decided yet.
    pub async fn request_permission(
        &self,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<GeolocatorPermissionStatus> {
        self.invoke_as(
            Method::RequestPermission,
            json!({}),
            timeout.unwrap_or(REQUEST_PERMISSION_TIMEOUT),
        )
        .await
    }

    pub async fn is_location_service_enabled(&self, timeout: Option<Duration>) -> GeolocatorResult<bool> {
        self.invoke_as(
            Method::IsLocationServiceEnabled,
            json!({}),
            timeout.unwrap_or(DEFAULT_TIMEOUT),
        )
        .await
    }

    /// Open the app's settings page, returns whether it could be opened. Not available on web.
    pub async fn open_app_settings(&self, timeout: Option<Duration>) -> GeolocatorResult<bool> {
        let method = Method::OpenAppSettings;
        self.ensure_supported(method)?;
        self.invoke_as(method, json!({}), timeout.unwrap_or(DEFAULT_TIMEOUT))
            .await
    }

    /// Open the device's location settings, returns whether they could be opened. Not
    /// available on web.
    pub async fn open_location_settings(&self, timeout: Option<Duration>) -> GeolocatorResult<bool> {
        let method = Method::OpenLocationSettings;
        self.ensure_supported(method)?;
        self.invoke_as(method, json!({}), timeout.unwrap_or(DEFAULT_TIMEOUT))
            .await
    }

    /// Distance in meters between two coordinates given in degrees. The native layer
    /// computes it with the Haversine formula.
    pub async fn distance_between(
        &self,
        start_latitude: f64,
        start_longitude: f64,
        end_latitude: f64,
        end_longitude: f64,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<f64> {
        let args = json!({
            "start_latitude": start_latitude,
            "start_longitude": start_longitude,
            "end_latitude": end_latitude,
            "end_longitude": end_longitude,
        });
        self.invoke_as(
            Method::DistanceBetween,
            args,
            timeout.unwrap_or(DEFAULT_TIMEOUT),
        )
        .await
    }

    fn publish_error(&self, event: GeolocatorErrorEvent) {
        if self.error_tx.send(event).is_err() {
            debug!("Error event dropped, nobody is subscribed");
        }
    }

    async fn consume_event(&self, event: NativeEvent) -> bool {
        match event {
            NativeEvent::PositionChange(raw) => {
                match serde_json::from_value::<GeolocatorPosition>(raw.clone()) {
                    Ok(position) => {
                        *self.position.write().await = Some(position);
                        let event = GeolocatorPositionChangeEvent { position };
                        if self.position_tx.send(event).is_err() {
                            debug!("Position change dropped, nobody is subscribed");
                        }
                    }
                    Err(why) => {
                        warn!("Native layer pushed an invalid position: {why}");
                        self.publish_error(GeolocatorErrorEvent {
                            data: json!({
                                "error": format!("Invalid position: {why}"),
                                "payload": raw,
                            }),
                        });
                    }
                }
                false
            }
            NativeEvent::Error(data) => {
                warn!("Native layer reported an error: {data}");
                self.publish_error(GeolocatorErrorEvent { data });
                false
            }
            NativeEvent::Disconnected => {
                self.publish_error(GeolocatorErrorEvent::message(DISCONNECTED_MESSAGE));
                true
            }
        }
    }

    /// Relay notifications from [Transport] to subscribers until the transport disconnects or
    /// [Geolocator::shutdown] is called.
    pub async fn main_loop(&self) {
        'relay: loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break 'relay;
                }

                events = self.transport.receive_notifications() => {
                    for event in events {
                        if self.consume_event(event).await {
                            info!("Native layer disconnected");
                            break 'relay;
                        }
                    }
                }
            }
        }

        self.transport.disconnect().await;
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl<T: Transport + 'static> Geolocator<T> {
    fn detach<F>(self: &Arc<Self>, method: Method, call: F) -> DetachedCall
    where
        F: Future<Output = GeolocatorResult<bool>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let this = self.clone();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Detached {method} cancelled");
                    }
                    res = call => match res {
                        Ok(opened) => info!("Detached {method} finished, opened: {opened}"),
                        Err(why) => {
                            warn!("Detached {method} failed: {why}");
                            this.publish_error(GeolocatorErrorEvent {
                                data: json!({
                                    "method": method.name(),
                                    "error": why.to_string(),
                                }),
                            });
                        }
                    }
                }
            }
        });
        DetachedCall { cancel, handle }
    }

    /// Open the app's settings without waiting for the result. The platform check still
    /// happens up front, any later failure only shows up on [Geolocator::subscribe_errors].
    pub fn open_app_settings_detached(
        self: &Arc<Self>,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<DetachedCall> {
        self.ensure_supported(Method::OpenAppSettings)?;
        let this = self.clone();
        Ok(self.detach(Method::OpenAppSettings, async move {
            this.open_app_settings(timeout).await
        }))
    }

    /// Open the location settings without waiting for the result, see
    /// [Geolocator::open_app_settings_detached].
    pub fn open_location_settings_detached(
        self: &Arc<Self>,
        timeout: Option<Duration>,
    ) -> GeolocatorResult<DetachedCall> {
        self.ensure_supported(Method::OpenLocationSettings)?;
        let this = self.clone();
        Ok(self.detach(Method::OpenLocationSettings, async move {
            this.open_location_settings(timeout).await
        }))
    }
}

/// Handle to a call running in the background
pub struct DetachedCall {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DetachedCall {
    /// Stop waiting on the call. Like a timeout, this doesn't undo anything the native layer
    /// already started.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the call to finish or be cancelled
    pub async fn join(self) {
        if let Err(why) = self.handle.await {
            warn!("Detached call panicked: {why}");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::{test, time::Instant};

    use super::*;
    use crate::{
        settings::WebSettings,
        tests::MockTransport,
        types::GeolocatorPositionAccuracy,
    };

    type TestGeolocator = Geolocator<MockTransport>;

    fn mk_geolocator(
        platform: RuntimePlatform,
        configuration: Option<GeolocatorSettings>,
    ) -> (Arc<MockTransport>, Arc<TestGeolocator>) {
        tokio::time::pause();
        let transport = Arc::new(MockTransport::default());
        let geo = Geolocator::new(transport.clone(), platform, configuration);
        (transport, Arc::new(geo))
    }

    fn position_payload() -> Value {
        json!({
            "latitude": 37.7,
            "longitude": -122.4,
            "timestamp": 1_700_000_000_000_i64,
        })
    }

    #[test]
    async fn test_current_position_uses_instance_default() {
        let settings = GeolocatorSettings::with_accuracy(GeolocatorPositionAccuracy::Low);
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, Some(settings.clone()));
        transport
            .reply(Method::GetCurrentPosition, position_payload())
            .await;

        let pos = geo.get_current_position(None, None).await.unwrap();

        assert_eq!(pos.latitude, 37.7);
        assert_eq!(pos.longitude, -122.4);
        assert_eq!(
            pos.timestamp.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert!(pos.speed.is_none());
        assert!(pos.altitude.is_none());
        assert!(pos.accuracy.is_none());
        assert!(pos.altitude_accuracy.is_none());
        assert!(pos.heading.is_none());
        assert!(pos.heading_accuracy.is_none());
        assert!(pos.speed_accuracy.is_none());
        assert!(pos.floor.is_none());
        assert!(pos.is_mocked.is_none());

        let calls = transport.calls().await;
        assert_eq!(calls.len(), 1);
        let (method, args) = &calls[0];
        assert_eq!(*method, Method::GetCurrentPosition);
        assert_eq!(
            args["configuration"],
            serde_json::to_value(&settings).unwrap()
        );
    }

    #[test]
    async fn test_current_position_settings_precedence() {
        let instance = GeolocatorSettings::with_accuracy(GeolocatorPositionAccuracy::Low);
        let explicit = GeolocatorSettings::with_accuracy(GeolocatorPositionAccuracy::High)
            .platform(WebSettings::default());
        let (transport, geo) = mk_geolocator(RuntimePlatform::Web, Some(instance));
        transport
            .reply(Method::GetCurrentPosition, position_payload())
            .await;

        geo.get_current_position(Some(explicit.clone()), None)
            .await
            .unwrap();
        geo.set_configuration(None).await;
        geo.get_current_position(None, None).await.unwrap();

        let calls = transport.calls().await;
        assert_eq!(
            calls[0].1["configuration"],
            serde_json::to_value(&explicit).unwrap(),
            "Explicit settings were not used"
        );
        assert_eq!(
            calls[1].1["configuration"],
            serde_json::to_value(GeolocatorSettings::default()).unwrap(),
            "No fallback to best accuracy"
        );
        assert_eq!(calls[1].1["configuration"]["accuracy"], json!("best"));
    }

    #[test]
    async fn test_web_unsupported_without_remote_call() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Web, None);

        let err = geo.get_last_known_position(None).await.unwrap_err();
        assert!(err.is_unsupported(), "Got {err:?}");
        let err = geo.open_app_settings(None).await.unwrap_err();
        assert!(err.is_unsupported(), "Got {err:?}");
        let err = geo.open_location_settings(None).await.unwrap_err();
        assert!(err.is_unsupported(), "Got {err:?}");
        assert!(geo.open_app_settings_detached(None).is_err());
        assert!(geo.open_location_settings_detached(None).is_err());

        assert_eq!(transport.call_count().await, 0, "A remote call was issued");
    }

    #[test]
    async fn test_web_supported_calls_go_through() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Web, None);
        transport
            .reply(Method::IsLocationServiceEnabled, json!(true))
            .await;
        transport
            .reply(Method::GetPermissionStatus, json!("whileInUse"))
            .await;

        assert!(geo.is_location_service_enabled(None).await.unwrap());
        assert_eq!(
            geo.get_permission_status(None).await.unwrap(),
            GeolocatorPermissionStatus::WhileInUse
        );
        assert_eq!(transport.call_count().await, 2);
    }

    #[test]
    async fn test_request_permission_times_out() {
        let (_transport, geo) = mk_geolocator(RuntimePlatform::Ios, None);
        let window = Duration::from_millis(10);

        let start = Instant::now();
        let err = geo.request_permission(Some(window)).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_timeout(), "Got {err:?}");
        assert!(elapsed >= window, "Timed out early after {elapsed:?}");
        assert!(elapsed < window * 2, "Timed out late after {elapsed:?}");
    }

    #[test]
    async fn test_default_timeouts() {
        let (_transport, geo) = mk_geolocator(RuntimePlatform::Android, None);

        let start = Instant::now();
        let err = geo.get_current_position(None, None).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= CURRENT_POSITION_TIMEOUT);

        let start = Instant::now();
        let err = geo.request_permission(None).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= REQUEST_PERMISSION_TIMEOUT);

        let checks: Vec<(&str, GeolocatorResult<()>)> = vec![
            (
                "last known",
                geo.get_last_known_position(None).await.map(|_| ()),
            ),
            ("status", geo.get_permission_status(None).await.map(|_| ())),
            (
                "enabled",
                geo.is_location_service_enabled(None).await.map(|_| ()),
            ),
            ("app settings", geo.open_app_settings(None).await.map(|_| ())),
            (
                "location settings",
                geo.open_location_settings(None).await.map(|_| ()),
            ),
            (
                "distance",
                geo.distance_between(0.0, 0.0, 1.0, 1.0, None)
                    .await
                    .map(|_| ()),
            ),
        ];

        for (name, res) in checks {
            match res {
                Err(GeolocatorError::Timeout { timeout, .. }) => {
                    assert_eq!(timeout, DEFAULT_TIMEOUT, "{name} used the wrong timeout");
                }
                other => panic!("{name} did not time out: {other:?}"),
            }
        }
    }

    #[test]
    async fn test_late_reply_is_abandoned() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, None);
        transport
            .reply_after(
                Method::IsLocationServiceEnabled,
                json!(true),
                Duration::from_secs(5),
            )
            .await;

        let err = geo
            .is_location_service_enabled(Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let enabled = geo
            .is_location_service_enabled(Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert!(enabled);
    }

    #[test]
    async fn test_distance_returns_native_value() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Linux, None);
        transport
            .reply(Method::DistanceBetween, json!(5_570_222.18))
            .await;

        let dist = geo
            .distance_between(52.37, 4.89, 40.71, -74.0, None)
            .await
            .unwrap();

        assert_eq!(dist, 5_570_222.18);
        let calls = transport.calls().await;
        assert_eq!(
            calls[0].1,
            json!({
                "start_latitude": 52.37,
                "start_longitude": 4.89,
                "end_latitude": 40.71,
                "end_longitude": -74.0,
            })
        );
    }

    #[test]
    async fn test_invalid_reply() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, None);
        transport
            .reply(Method::GetPermissionStatus, json!("sometimes"))
            .await;
        transport
            .fail(Method::OpenAppSettings, "Activity not found")
            .await;

        let err = geo.get_permission_status(None).await.unwrap_err();
        assert!(
            matches!(
                err,
                GeolocatorError::InvalidReply {
                    method: Method::GetPermissionStatus,
                    ..
                }
            ),
            "Got {err:?}"
        );

        let err = geo.open_app_settings(None).await.unwrap_err();
        assert!(matches!(err, GeolocatorError::Transport(_)), "Got {err:?}");
    }

    #[test]
    async fn test_position_change_events() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, None);
        let mut positions = geo.subscribe_position_changes();

        let loop_handle = tokio::spawn({
            let geo = geo.clone();
            async move { geo.main_loop().await }
        });

        let payload = json!({
            "latitude": 51.5,
            "longitude": -0.12,
            "speed": 1.25,
            "altitude": 11.0,
            "timestamp": 1_234,
            "accuracy": 3.5,
            "altitude_accuracy": 6.0,
            "heading": 90.0,
            "heading_accuracy": 2.0,
            "speed_accuracy": 0.25,
            "floor": -1,
            "is_mocked": true,
        });
        let second = json!({ "latitude": 51.6, "longitude": -0.13 });

        transport
            .push_event(NativeEvent::PositionChange(payload.clone()))
            .await;
        transport
            .push_event(NativeEvent::PositionChange(second.clone()))
            .await;

        let first_event = positions.recv().await.expect("Failed to recv");
        assert_eq!(
            first_event.position,
            serde_json::from_value::<GeolocatorPosition>(payload.clone()).unwrap()
        );
        assert_eq!(serde_json::to_value(first_event.position).unwrap(), payload);

        let second_event = positions.recv().await.expect("Failed to recv");
        assert_eq!(second_event.position.latitude, 51.6);
        assert_eq!(geo.position().await, Some(second_event.position));

        transport.push_event(NativeEvent::Disconnected).await;
        loop_handle.await.expect("Loop panicked");
        assert!(transport.is_disconnected().await);
    }

    #[test]
    async fn test_error_events() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, None);
        let mut errors = geo.subscribe_errors();

        tokio::spawn({
            let geo = geo.clone();
            async move { geo.main_loop().await }
        });

        transport
            .push_event(NativeEvent::Error(json!("Location services disabled")))
            .await;
        transport
            .push_event(NativeEvent::PositionChange(json!({ "longitude": 1.0 })))
            .await;

        let event = errors.recv().await.expect("Failed to recv");
        assert_eq!(event.data, json!("Location services disabled"));

        let event = errors.recv().await.expect("Failed to recv");
        assert_eq!(event.data["payload"], json!({ "longitude": 1.0 }));
        assert!(geo.position().await.is_none(), "Invalid position was stored");

        geo.shutdown();
    }

    #[test]
    async fn test_disconnect_is_reported() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, None);
        let mut errors = geo.subscribe_errors();

        let loop_handle = tokio::spawn({
            let geo = geo.clone();
            async move { geo.main_loop().await }
        });

        transport.push_event(NativeEvent::Disconnected).await;
        loop_handle.await.expect("Loop panicked");

        let event = errors.try_recv().expect("No error event after disconnect");
        assert_eq!(event, GeolocatorErrorEvent::message(DISCONNECTED_MESSAGE));
        assert!(transport.is_disconnected().await);
    }

    #[test]
    async fn test_detached_failure_reaches_error_event() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Android, None);
        let mut errors = geo.subscribe_errors();

        let call = geo
            .open_location_settings_detached(Some(Duration::from_millis(50)))
            .expect("Android supports location settings");
        call.join().await;

        let event = errors.recv().await.expect("Failed to recv");
        assert_eq!(event.data["method"], json!("open_location_settings"));
        assert_eq!(transport.call_count().await, 1);
    }

    #[test]
    async fn test_detached_success_and_cancel() {
        let (transport, geo) = mk_geolocator(RuntimePlatform::Ios, None);
        let mut errors = geo.subscribe_errors();
        transport.reply(Method::OpenAppSettings, json!(true)).await;

        let call = geo.open_app_settings_detached(None).unwrap();
        call.join().await;

        let call = geo.open_location_settings_detached(None).unwrap();
        call.cancel();
        call.join().await;

        assert!(
            errors.try_recv().is_err(),
            "Success or cancellation produced an error event"
        );
    }
}
