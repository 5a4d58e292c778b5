use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};

/// Normalized outcome of one forwarded request. The gateway folds transport
/// failures into the `Err` side of its `Result`; they never surface as
/// panics or propagated errors.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
    pub size: usize,
}

/// One request in, one normalized response out. Implemented by the real
/// reqwest-backed client and by test stubs.
pub trait RequestGateway: Send + Sync {
    fn send(
        &self,
        method: &str,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> impl Future<Output = std::result::Result<GatewayResponse, String>> + Send;
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    host: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout_secs: u64, proxy: Option<&str>) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::configuration(format!("invalid target url '{}': {}", base_url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::configuration(format!("target url '{}' has no host", base_url)))?
            .to_string();

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(false);

        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::configuration(format!("invalid proxy '{}': {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
        })
    }
}

impl RequestGateway for HttpGateway {
    async fn send(
        &self,
        method: &str,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<GatewayResponse, String> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url, path);

        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| format!("invalid http method '{}'", method))?;

        let mut request = self.client.request(method, &url);

        // HTTP/1.1 compliance defaults, overridable by caller headers.
        if !headers.contains_key("Host") {
            request = request.header("Host", &self.host);
        }
        if !headers.contains_key("Connection") {
            request = request.header("Connection", "keep-alive");
        }
        for (key, value) in headers {
            request = request.header(key, value);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let headers: HashMap<String, String> = response
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                    .collect();

                let body = response.text().await.unwrap_or_default();
                let elapsed_ms = start.elapsed().as_millis() as u64;
                let size = body.len();

                Ok(GatewayResponse {
                    status,
                    headers,
                    body,
                    elapsed_ms,
                    size,
                })
            }
            Err(e) => Err(e.to_string()),
        }
    }
}
