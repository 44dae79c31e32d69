//! Live-reload WebSocket broadcaster.
//!
//! Browsers load a small script from the HTTP server, open a socket
//! here, and reload the page when a rebuild completes.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::utils::plural;
use crate::{debug, log};

const MAX_PORT_RETRIES: u16 = 10;

/// URL the reload client script is served under.
pub const RELOAD_JS_PATH: &str = "/livereload.js";

/// HTML snippet injected into served pages.
pub const RELOAD_SCRIPT_TAG: &str = "<script src=\"/livereload.js\"></script>";

const RELOAD_JS_TEMPLATE: &str = r#"(function () {
  var connect = function () {
    var ws = new WebSocket("ws://" + location.hostname + ":{WS_PORT}");
    ws.onmessage = function (msg) {
      if (msg.data === "reload") location.reload();
    };
    ws.onclose = function () {
      setTimeout(connect, 1000);
    };
  };
  connect();
})();
"#;

/// Reload client script with the actual socket port baked in.
pub fn reload_script(ws_port: u16) -> String {
    RELOAD_JS_TEMPLATE.replace("{WS_PORT}", &ws_port.to_string())
}

/// Accepts sockets on a background thread and broadcasts reload pings.
#[derive(Clone)]
pub struct ReloadServer {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    port: u16,
}

impl ReloadServer {
    /// Bind (with port retry) and start the acceptor thread.
    pub fn start(interface: IpAddr, base_port: u16) -> anyhow::Result<Self> {
        let (listener, port) = bind_with_retry(interface, base_port)?;
        let clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>> = Arc::new(Mutex::new(Vec::new()));

        let acceptor_clients = Arc::clone(&clients);
        std::thread::spawn(move || accept_loop(listener, acceptor_clients));

        debug!("reload"; "ws://localhost:{port}");
        Ok(Self { clients, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Ping every connected browser; dead sockets are dropped.
    pub fn broadcast(&self) {
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| ws.send(Message::Text("reload".into())).is_ok());
        if !clients.is_empty() {
            debug!("reload"; "reload sent to {} client{}", clients.len(), plural(clients.len()));
        }
    }
}

fn accept_loop(listener: TcpListener, clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                match tungstenite::accept(stream) {
                    Ok(ws) => {
                        debug!("reload"; "client connected");
                        clients.lock().push(ws);
                    }
                    Err(e) => debug!("reload"; "handshake failed: {e}"),
                }
            }
            Err(e) => {
                log!("reload"; "accept error: {e}");
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

fn bind_with_retry(interface: IpAddr, base_port: u16) -> anyhow::Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                if offset > 0 {
                    log!("reload"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((listener, port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind live-reload socket after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_script_embeds_port() {
        let script = reload_script(35729);
        assert!(script.contains(":35729"));
        assert!(!script.contains("{WS_PORT}"));
    }

    #[test]
    fn test_bind_retry_skips_taken_port() {
        let interface: IpAddr = "127.0.0.1".parse().unwrap();
        let taken = TcpListener::bind(SocketAddr::new(interface, 0)).unwrap();
        let base = taken.local_addr().unwrap().port();

        let (_listener, port) = bind_with_retry(interface, base).unwrap();
        assert_ne!(port, base);
        assert!(port > base && port < base + MAX_PORT_RETRIES);
    }
}
