use std::{collections::HashMap, time::Duration};

use anyhow::anyhow;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};

use crate::{
    prelude::*,
    transport::{Method, NativeEvent, Transport},
};

type EventRx = mpsc::Receiver<NativeEvent>;
type EventTx = mpsc::Sender<NativeEvent>;

enum MockReply {
    Value(Value, Duration),
    Fail(String),
}

/// Records every call and answers from canned replies. Methods without a reply never answer.
pub struct MockTransport {
    calls: Mutex<Vec<(Method, Value)>>,
    replies: Mutex<HashMap<Method, MockReply>>,
    events: (EventTx, Mutex<EventRx>),
    disconnected: Mutex<bool>,
}

impl Default for MockTransport {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel(20);
        Self {
            calls: Mutex::default(),
            replies: Mutex::default(),
            events: (tx, Mutex::new(rx)),
            disconnected: Mutex::new(false),
        }
    }
}

impl MockTransport {
    pub async fn reply(&self, method: Method, value: Value) {
        self.reply_after(method, value, Duration::ZERO).await;
    }

    pub async fn reply_after(&self, method: Method, value: Value, delay: Duration) {
        self.replies
            .lock()
            .await
            .insert(method, MockReply::Value(value, delay));
    }

    pub async fn fail(&self, method: Method, msg: &str) {
        self.replies
            .lock()
            .await
            .insert(method, MockReply::Fail(msg.to_string()));
    }

    pub async fn push_event(&self, event: NativeEvent) {
        self.events.0.send(event).await.expect("Failed to push event");
    }

    pub async fn calls(&self) -> Vec<(Method, Value)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn is_disconnected(&self) -> bool {
        *self.disconnected.lock().await
    }
}

impl Transport for MockTransport {
    async fn invoke(&self, method: Method, args: Value) -> Result<Value> {
        self.calls.lock().await.push((method, args));

        let reply = self
            .replies
            .lock()
            .await
            .get(&method)
            .map(|reply| match reply {
                MockReply::Value(value, delay) => Ok((value.clone(), *delay)),
                MockReply::Fail(msg) => Err(anyhow!("{msg}")),
            });

        match reply {
            Some(reply) => {
                let (value, delay) = reply?;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(value)
            }
            // Never answers, like a native layer that dropped the request
            None => std::future::pending().await,
        }
    }

    async fn receive_notifications(&self) -> Vec<NativeEvent> {
        let mut rx = self.events.1.lock().await;
        let mut buf = Vec::with_capacity(20);
        if rx.recv_many(&mut buf, 20).await == 0 {
            buf.push(NativeEvent::Disconnected);
        }
        buf
    }

    async fn disconnect(&self) {
        *self.disconnected.lock().await = true;
    }
}
