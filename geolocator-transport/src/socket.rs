use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex as SyncMutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::{anyhow, bail};
use interprocess::local_socket::{tokio::Stream, traits::tokio::Stream as _};
use log::{debug, error, warn};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::{Mutex, mpsc, oneshot},
};
use tokio_util::sync::CancellationToken;

use geolocator_logic::{Method, NativeEvent, Transport, prelude::*};

use crate::{
    config::{CONNECT_TIMEOUT, socket_name},
    protocol::{BridgeFrame, PeerFrame, decode_line, encode_line, native_event},
};

type QueuePair<T> = (mpsc::Sender<T>, Mutex<mpsc::Receiver<T>>);
type PendingMap = HashMap<u64, oneshot::Sender<Result<Value>>>;

const EVENT_QUEUE_SIZE: usize = 64;
const MAX_EVENTS_RECV: usize = 32;

const CLOSED_MESSAGE: &str = "Connection to the native peer is closed";
const DISCONNECTED_MESSAGE: &str = "Native peer disconnected";

/// [Transport] that talks to a native peer over a local socket, one JSON frame per line
pub struct SocketTransport {
    next_id: AtomicU64,
    pending: SyncMutex<PendingMap>,
    outgoing: mpsc::Sender<BridgeFrame>,
    incoming: QueuePair<NativeEvent>,
    cancel_token: CancellationToken,
}

/// Forgets a pending call once its caller stops waiting, whether it got a reply or not
struct PendingCall<'a> {
    pending: &'a SyncMutex<PendingMap>,
    id: u64,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl SocketTransport {
    /// Connect to the native peer listening on `name` and start relaying frames
    pub async fn connect(name: &str) -> Result<Arc<Self>> {
        let socket_name = socket_name(name)?;
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, Stream::connect(socket_name))
            .await
            .context("Timed out connecting to the native peer")?
            .context("Failed to connect to the native peer")?;

        let (otx, orx) = mpsc::channel(15);
        let (itx, irx) = mpsc::channel(EVENT_QUEUE_SIZE);

        let transport = Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: SyncMutex::default(),
            outgoing: otx,
            incoming: (itx, Mutex::new(irx)),
            cancel_token: CancellationToken::new(),
        });

        tokio::spawn({
            let transport = transport.clone();
            async move {
                transport.main_loop(stream, orx).await;
            }
        });

        Ok(transport)
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_incoming(&self, event: NativeEvent) {
        if let Err(why) = self.incoming.0.try_send(event) {
            warn!("Dropping native event, queue is full or closed: {why}");
        }
    }

    async fn main_loop(&self, stream: Stream, mut outgoing_rx: mpsc::Receiver<BridgeFrame>) {
        let mut lines = BufReader::new(&stream).lines();
        let mut send = &stream;

        let failure = loop {
            tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => {
                    break None;
                }

                Some(frame) = outgoing_rx.recv() => {
                    if let Err(why) = Self::write_frame(&mut send, &frame).await {
                        break Some(why);
                    }
                }

                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line),
                    Ok(None) => break None,
                    Err(why) => {
                        let why = anyhow::Error::from(why);
                        break Some(why.context("Failed to read from native peer"));
                    }
                }
            }
        };

        // Calls registered after this point would never be answered
        let abandoned = {
            let mut pending = self.lock_pending();
            self.cancel_token.cancel();
            pending.drain().collect::<Vec<_>>()
        };
        for (_, tx) in abandoned {
            tx.send(Err(anyhow!(DISCONNECTED_MESSAGE))).ok();
        }

        if let Some(why) = failure {
            error!("Native peer connection failed: {why:?}");
            self.push_incoming(NativeEvent::Error(json!(format!("{why:#}"))));
        }
        self.push_incoming(NativeEvent::Disconnected);
    }

    async fn write_frame<W: AsyncWrite + Unpin>(send: &mut W, frame: &BridgeFrame) -> Result {
        let encoded = encode_line(frame)?;
        send.write_all(&encoded)
            .await
            .context("Failed to write to native peer")
    }

    fn handle_line(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match decode_line::<PeerFrame>(line) {
            Ok(PeerFrame::Reply { id, result }) => self.resolve(id, Ok(result)),
            Ok(PeerFrame::Failed { id, message }) => {
                self.resolve(id, Err(anyhow!("Native peer rejected the call: {message}")))
            }
            Ok(PeerFrame::Event { name, data }) => match native_event(&name, data) {
                Some(event) => self.push_incoming(event),
                None => warn!("Ignoring unknown event {name}"),
            },
            Err(why) => error!("Error receiving frame: {why:?}"),
        }
    }

    fn resolve(&self, id: u64, res: Result<Value>) {
        let tx = self.lock_pending().remove(&id);
        match tx {
            Some(tx) => {
                if tx.send(res).is_err() {
                    debug!("Caller of call {id} stopped waiting");
                }
            }
            None => debug!("Dropping reply to call {id}, nobody is waiting on it"),
        }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

impl Transport for SocketTransport {
    async fn invoke(&self, method: Method, args: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.lock_pending();
            if self.cancel_token.is_cancelled() {
                bail!(CLOSED_MESSAGE);
            }
            pending.insert(id, tx);
        }
        let _pending = PendingCall {
            pending: &self.pending,
            id,
        };

        let frame = BridgeFrame::Invoke {
            id,
            method: method.name().to_string(),
            args,
        };
        self.outgoing
            .send(frame)
            .await
            .map_err(|_| anyhow!(CLOSED_MESSAGE))?;

        rx.await
            .context("Connection closed before the native peer replied")?
    }

    async fn receive_notifications(&self) -> Vec<NativeEvent> {
        let mut incoming_rx = self.incoming.1.lock().await;
        let mut buffer = Vec::with_capacity(MAX_EVENTS_RECV);
        if incoming_rx.recv_many(&mut buffer, MAX_EVENTS_RECV).await == 0 {
            buffer.push(NativeEvent::Disconnected);
        }
        buffer
    }

    async fn disconnect(&self) {
        self.cancel();
    }
}
