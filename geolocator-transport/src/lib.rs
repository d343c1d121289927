mod config;
pub mod protocol;
mod socket;

pub use config::{CONNECT_TIMEOUT, DEFAULT_SOCKET_NAME, socket_name};
pub use socket::SocketTransport;
