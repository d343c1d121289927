use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::{geolocator::Geolocator, transport::Transport};

/// A non-visual component that lives as long as the page it was added to
pub trait Service: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    /// Future that runs until the service is stopped or its backing channel closes
    fn run(self: Arc<Self>) -> BoxFuture<'static, ()>;
    /// Ask the run future to return
    fn stop(&self);
}

impl<T: Transport + 'static> Service for Geolocator<T> {
    fn name(&self) -> &'static str {
        "geolocator"
    }

    fn run(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move { self.main_loop().await }.boxed()
    }

    fn stop(&self) {
        self.shutdown();
    }
}

struct RunningService {
    service: Arc<dyn Service>,
    handle: JoinHandle<()>,
}

/// The services of a single page. Adding a service starts it, removing it or dropping the
/// collection stops it.
#[derive(Default)]
pub struct ServiceCollection {
    services: Vec<RunningService>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `service` and keep it until removed, returns the service for convenience
    pub fn add<S: Service>(&mut self, service: Arc<S>) -> Arc<S> {
        debug!("Starting service {}", service.name());
        let handle = tokio::spawn(service.clone().run());
        self.services.push(RunningService {
            service: service.clone(),
            handle,
        });
        service
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.iter().any(|s| s.service.name() == name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Stop the first service named `name` and wait for it to wind down
    pub async fn remove(&mut self, name: &str) -> bool {
        let Some(idx) = self.services.iter().position(|s| s.service.name() == name) else {
            return false;
        };
        let running = self.services.remove(idx);
        Self::stop_running(running).await;
        true
    }

    /// Stop every service and wait for all of them
    pub async fn shutdown(mut self) {
        for running in std::mem::take(&mut self.services) {
            Self::stop_running(running).await;
        }
    }

    async fn stop_running(running: RunningService) {
        let name = running.service.name();
        running.service.stop();
        if let Err(why) = running.handle.await {
            warn!("Service {name} did not stop cleanly: {why}");
        } else {
            debug!("Stopped service {name}");
        }
    }
}

impl Drop for ServiceCollection {
    fn drop(&mut self) {
        for running in self.services.iter() {
            running.service.stop();
        }
    }
}
