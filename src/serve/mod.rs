//! Development server.
//!
//! Serves the build output directory, injects the live-reload client
//! into HTML responses, runs the watch orchestrator on a background
//! thread, and forwards unmatched requests to the configured backend
//! origin.

mod proxy;
mod reload;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, thread};

use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::config::{BuildOptions, Config};
use crate::utils::mime;
use crate::{core, log, watch};

use proxy::Proxy;
use reload::ReloadServer;

const MAX_PORT_RETRIES: u16 = 10;

/// Run the dev server until shutdown. Blocks the calling thread.
pub fn run_serve(config: &Config, options: &BuildOptions) -> anyhow::Result<()> {
    let (server, addr) = bind_with_retry(config)?;
    let server = Arc::new(server);

    core::register_server(Arc::clone(&server));

    let reload_server = ReloadServer::start(config.serve.interface, config.serve.ws_port)?;

    // Watch thread rebuilds assets and pings connected browsers.
    let watch_handle = {
        let config = config.clone();
        let options = *options;
        let hook: watch::ReloadHook = {
            let reload = reload_server.clone();
            Arc::new(move || reload.broadcast())
        };
        thread::spawn(move || {
            if let Err(e) = watch::run_watch(&config, &options, Some(hook)) {
                log!("error"; "watch failed: {e}");
            }
        })
    };

    let proxy = match &config.serve.proxy {
        Some(origin) => {
            log!("proxy"; "forwarding unmatched requests to {origin}");
            Some(Proxy::new(origin)?)
        }
        None => None,
    };
    let proxy = Arc::new(proxy);

    log!("serve"; "http://{addr}");

    run_request_loop(&server, config, &proxy, &reload_server);

    // The request loop only ends once the shutdown handler unblocks the
    // listener; give the watch thread a moment to notice.
    for _ in 0..40 {
        if watch_handle.is_finished() {
            let _ = watch_handle.join();
            break;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }

    log!("serve"; "stopped");
    Ok(())
}

fn bind_with_retry(config: &Config) -> anyhow::Result<(Server, SocketAddr)> {
    let base_port = config.serve.port;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(config.serve.interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

fn run_request_loop(
    server: &Server,
    config: &Config,
    proxy: &Arc<Option<Proxy>>,
    reload_server: &ReloadServer,
) {
    // A small pool keeps slow proxied requests from blocking asset loads.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create request thread pool");

    let config = Arc::new(config.clone());
    for request in server.incoming_requests() {
        let config = Arc::clone(&config);
        let proxy = Arc::clone(proxy);
        let ws_port = reload_server.port();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, proxy.as_ref().as_ref(), ws_port) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

fn handle_request(
    request: Request,
    config: &Config,
    proxy: Option<&Proxy>,
    ws_port: u16,
) -> anyhow::Result<()> {
    if core::is_shutdown() {
        return respond_unavailable(request);
    }

    // The reload client is served from memory, never from the tree.
    if request.url() == reload::RELOAD_JS_PATH {
        let body = reload::reload_script(ws_port);
        return send_body(request, 200, mime::types::JAVASCRIPT, body.into_bytes());
    }

    if let Some(path) = resolve_path(request.url(), &config.output_dir()) {
        return respond_file(request, &path);
    }

    if let Some(proxy) = proxy {
        return proxy.forward(request);
    }

    respond_not_found(request)
}

/// Respond with a static file, injecting the reload client into HTML.
fn respond_file(request: Request, path: &Path) -> anyhow::Result<()> {
    let content_type = mime::from_path(path);

    if request.method() == &Method::Head {
        let response = Response::empty(StatusCode(200))
            .with_header(make_header("Content-Type", content_type));
        return request.respond(response).map_err(Into::into);
    }

    let body = fs::read(path)?;
    let body = if mime::is_html(content_type) {
        inject_reload_tag(&body)
    } else {
        body
    };
    send_body(request, 200, content_type, body)
}

fn respond_not_found(request: Request) -> anyhow::Result<()> {
    send_body(
        request,
        404,
        mime::types::PLAIN,
        b"404 Not Found".to_vec(),
    )
}

fn respond_unavailable(request: Request) -> anyhow::Result<()> {
    send_body(
        request,
        503,
        mime::types::PLAIN,
        b"503 Service Unavailable".to_vec(),
    )
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> anyhow::Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response).map_err(Into::into)
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}

/// Insert the reload script tag before the final `</body>`, appending
/// when none exists.
fn inject_reload_tag(content: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";
    let tag = reload::RELOAD_SCRIPT_TAG.as_bytes();

    let mut result = Vec::with_capacity(content.len() + tag.len());
    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(tag);
        result.extend_from_slice(&content[pos..]);
    } else {
        result.extend_from_slice(content);
        result.extend_from_slice(tag);
    }
    result
}

/// Resolve a URL to a file under the serve root, with `index.html`
/// fallback for directories. Traversal outside the root is rejected.
fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.contains("..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize to resolve symlinks before the containment check.
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Decode the URL, strip the query string, trim slashes.
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    let path = decoded.split('?').next().unwrap_or(&decoded);
    path.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn serve_root() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<html><body>hi</body></html>").unwrap();
        fs::create_dir_all(tmp.path().join("js")).unwrap();
        fs::write(tmp.path().join("js/app.js"), "var x;").unwrap();
        tmp
    }

    #[test]
    fn test_resolve_plain_file() {
        let root = serve_root();
        let path = resolve_path("/js/app.js", root.path()).unwrap();
        assert!(path.ends_with("js/app.js"));
    }

    #[test]
    fn test_resolve_directory_falls_back_to_index() {
        let root = serve_root();
        let path = resolve_path("/", root.path()).unwrap();
        assert!(path.ends_with("index.html"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = serve_root();
        assert!(resolve_path("/../etc/passwd", root.path()).is_none());
        assert!(resolve_path("/%2e%2e/etc/passwd", root.path()).is_none());
    }

    #[test]
    fn test_resolve_strips_query_string() {
        let root = serve_root();
        let path = resolve_path("/js/app.js?v=3", root.path()).unwrap();
        assert!(path.ends_with("js/app.js"));
    }

    #[test]
    fn test_resolve_missing_is_none() {
        let root = serve_root();
        assert!(resolve_path("/nope.css", root.path()).is_none());
    }

    #[test]
    fn test_inject_before_body_close() {
        let out = inject_reload_tag(b"<html><body>hi</body></html>");
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("hi<script src=\"/livereload.js\"></script></body>"));
    }

    #[test]
    fn test_inject_appends_without_body_tag() {
        let out = inject_reload_tag(b"plain fragment");
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("plain fragment"));
        assert!(text.ends_with("</script>"));
    }
}
