//! HttpSink - one JSON POST per event, no retries

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{ContractError, DeliveryOutcome, DestinationConfig, EventSink, NestedEvent};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument};

/// Configuration for HttpSink
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Target URL
    pub url: Url,
    /// Per-request timeout (None = wait indefinitely)
    pub timeout: Option<Duration>,
    /// Extra headers sent with every request
    pub headers: HeaderMap,
}

impl HttpSinkConfig {
    /// Create config for a URL with no timeout and no extra headers
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: None,
            headers: HeaderMap::new(),
        }
    }

    /// Create config from the destination section
    pub fn from_destination(config: &DestinationConfig) -> Result<Self, String> {
        let url = Url::parse(&config.url)
            .map_err(|e| format!("invalid url '{}': {}", config.url, e))?;

        Ok(Self {
            url,
            timeout: config.timeout_ms.map(Duration::from_millis),
            headers: parse_headers(&config.headers)?,
        })
    }
}

fn parse_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("invalid header name '{}': {}", name, e))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| format!("invalid value for header '{}': {}", name, e))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Sink that POSTs nested events as JSON
pub struct HttpSink {
    name: String,
    config: HttpSinkConfig,
    client: reqwest::Client,
}

impl HttpSink {
    /// Create a new HttpSink
    pub fn new(name: impl Into<String>, config: HttpSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ContractError::sink_setup(&name, format!("http client: {e}")))?;

        debug!(sink = %name, target = %config.url, "HttpSink ready");

        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Create from the destination section (for factory)
    pub fn from_destination(config: &DestinationConfig) -> Result<Self, ContractError> {
        let sink_config = HttpSinkConfig::from_destination(config)
            .map_err(|e| ContractError::sink_setup(&config.name, e))?;
        Self::new(&config.name, sink_config)
    }

    pub fn url(&self) -> &Url {
        &self.config.url
    }

    fn serialize_event(&self, event: &NestedEvent) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(event).map_err(|e| ContractError::serialize(e.to_string()))
    }

    fn classify(status: StatusCode) -> DeliveryOutcome {
        if status == StatusCode::OK {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Rejected {
                status: status.as_u16(),
            }
        }
    }
}

impl EventSink for HttpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_deliver",
        skip(self, event),
        fields(sink = %self.name, event = %event.event)
    )]
    async fn deliver(&self, event: &NestedEvent) -> Result<DeliveryOutcome, ContractError> {
        let body = self.serialize_event(event)?;

        let response = self
            .client
            .post(self.config.url.clone())
            .headers(self.config.headers.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ContractError::sink_transport(&self.name, e.to_string()))?;

        // body is never inspected, dropping the response releases it
        let status = response.status();
        debug!(sink = %self.name, status = status.as_u16(), "Response received");

        Ok(Self::classify(status))
    }
}
