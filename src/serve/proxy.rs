//! Reverse proxy for requests the asset tree cannot answer.
//!
//! Unmatched URLs are forwarded to the configured backend origin so the
//! dev server can front an API during development.

use std::io::Read;
use std::time::Duration;

use tiny_http::{Header, Request, Response, StatusCode};

use crate::log;

/// Hop-by-hop headers that must not be forwarded either way.
const HOP_BY_HOP: [&str; 5] = [
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "keep-alive",
];

pub struct Proxy {
    base: String,
    client: reqwest::blocking::Client,
}

impl Proxy {
    pub fn new(origin: &str) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            // Redirects belong to the browser, not the proxy.
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            base: origin.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Forward one request to the backend and relay the response.
    /// Upstream failures answer 502 rather than erroring the server loop.
    pub fn forward(&self, mut request: Request) -> anyhow::Result<()> {
        let url = format!("{}{}", self.base, request.url());
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())?;

        let mut body = Vec::new();
        request.as_reader().read_to_end(&mut body)?;

        let mut upstream = self.client.request(method, &url);
        for header in request.headers() {
            let name = header.field.as_str().as_str();
            if HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h)) {
                continue;
            }
            upstream = upstream.header(name, header.value.as_str());
        }

        let upstream_response = match upstream.body(body).send() {
            Ok(r) => r,
            Err(e) => {
                log!("proxy"; "upstream error for {url}: {e}");
                let response = Response::from_string("502 Bad Gateway")
                    .with_status_code(StatusCode(502));
                return request.respond(response).map_err(Into::into);
            }
        };

        let status = upstream_response.status().as_u16();
        let headers: Vec<Header> = upstream_response
            .headers()
            .iter()
            .filter(|(name, _)| {
                !HOP_BY_HOP
                    .iter()
                    .any(|h| name.as_str().eq_ignore_ascii_case(h))
            })
            .filter_map(|(name, value)| {
                Header::from_bytes(name.as_str().as_bytes(), value.as_bytes()).ok()
            })
            .collect();
        let bytes = upstream_response.bytes()?;

        let mut response =
            Response::from_data(bytes.to_vec()).with_status_code(StatusCode(status));
        for header in headers {
            response = response.with_header(header);
        }
        request.respond(response).map_err(Into::into)
    }
}
