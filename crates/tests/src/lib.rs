//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 入口 -> 队列 -> 分发 -> 假目标服务 的端到端测试
//! - 配置文件加载

#[cfg(test)]
mod support {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use bytes::Bytes;
    use contracts::{DestinationConfig, DispatchConfig, KeyPolicy, OverflowPolicy};
    use dispatcher::{create_sink, DispatchLoop, DispatchSummary};
    use ingestion::{intake_router, IntakeQueue, IntakeState};
    use mapper::Mapper;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    /// Bodies captured by the fake destination
    pub type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    /// In-process stand-in for the downstream service
    ///
    /// Answers 200 unless the posted record's `event` equals `fail_event`,
    /// which gets a 500.
    pub struct FakeDestination {
        pub addr: SocketAddr,
        pub received: Received,
    }

    impl FakeDestination {
        pub async fn start(fail_event: Option<&str>) -> Self {
            let received: Received = Arc::default();
            let fail_event = fail_event.map(str::to_string);

            let app = Router::new()
                .route(
                    "/ingest",
                    post(move |State(received): State<Received>, body: Bytes| {
                        let fail_event = fail_event.clone();
                        async move {
                            let value: serde_json::Value = match serde_json::from_slice(&body) {
                                Ok(value) => value,
                                Err(_) => return StatusCode::BAD_REQUEST,
                            };
                            let failed = fail_event.as_deref() == value["event"].as_str();
                            received.lock().unwrap().push(value);
                            if failed {
                                StatusCode::INTERNAL_SERVER_ERROR
                            } else {
                                StatusCode::OK
                            }
                        }
                    }),
                )
                .with_state(received.clone());

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await });

            Self { addr, received }
        }

        pub fn url(&self) -> String {
            format!("http://{}/ingest", self.addr)
        }

        pub fn count(&self) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    /// A running relay wired the same way the binary wires it
    pub struct TestRelay {
        pub addr: SocketAddr,
        pub queue: IntakeQueue,
        token: CancellationToken,
        server: JoinHandle<std::io::Result<()>>,
        dispatch: JoinHandle<DispatchSummary>,
    }

    impl TestRelay {
        pub async fn start(destination_url: &str, capacity: usize, policy: OverflowPolicy) -> Self {
            Self::start_with(destination_url, capacity, policy, KeyPolicy::default(), 8).await
        }

        pub async fn start_with(
            destination_url: &str,
            capacity: usize,
            policy: OverflowPolicy,
            key_policy: KeyPolicy,
            max_in_flight: usize,
        ) -> Self {
            let sink = create_sink(&DestinationConfig {
                url: destination_url.to_string(),
                timeout_ms: Some(5_000),
                ..Default::default()
            })
            .unwrap();

            let queue = IntakeQueue::new(capacity, policy);
            let dispatch = DispatchLoop::new(
                queue.receiver(),
                sink,
                Mapper::new(key_policy),
                &DispatchConfig {
                    max_in_flight,
                    shutdown_grace_ms: 5_000,
                },
            )
            .spawn();

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let token = CancellationToken::new();
            let router = intake_router(IntakeState::new(queue.clone(), None));
            let server = tokio::spawn(ingestion::serve(listener, router, token.clone()));

            Self {
                addr,
                queue,
                token,
                server,
                dispatch,
            }
        }

        pub fn webhook_url(&self) -> String {
            format!("http://{}/webhook", self.addr)
        }

        /// Stop intake, drain the queue and wait for deliveries
        pub async fn shutdown(self) -> DispatchSummary {
            self.token.cancel();
            self.server.await.unwrap().unwrap();
            self.queue.close();
            self.dispatch.await.unwrap()
        }
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{FlatEvent, NestedEvent};

    #[test]
    fn test_nested_wire_field_names() {
        let nested = mapper::map_event(FlatEvent {
            ev: "page_view".into(),
            atrk1: "k".into(),
            atrv1: "v".into(),
            atrt1: "string".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&nested).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();

        for name in [
            "event",
            "event_type",
            "app_id",
            "user_id",
            "message_id",
            "page_title",
            "page_url",
            "browser_language",
            "screen_size",
            "attributes",
            "traits",
        ] {
            assert!(keys.iter().any(|k| k == name), "missing {name}");
        }
        assert_eq!(keys.len(), 11);
        assert_eq!(json["attributes"]["k"]["type"], "string");

        let back: NestedEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, nested);
    }
}

#[cfg(test)]
mod e2e_tests {
    use crate::support::{FakeDestination, TestRelay};
    use contracts::{KeyPolicy, OverflowPolicy};
    use tokio::net::TcpListener;
    use serde_json::json;
    use std::time::Duration;

    fn body(ev: &str) -> serde_json::Value {
        json!({
            "ev": ev,
            "et": "click",
            "id": "app-1",
            "uid": "user-1",
            "mid": format!("msg-{ev}"),
            "t": "Home",
            "p": "https://example.com/",
            "l": "en-US",
            "sc": "1920x1080",
            "atrk1": "button",
            "atrv1": "signup",
            "atrt1": "string",
            "uatrk1": "plan",
            "uatrv1": "pro",
            "uatrt1": "string"
        })
    }

    /// End-to-end: POST /webhook -> IntakeQueue -> DispatchLoop -> destination
    #[tokio::test]
    async fn test_e2e_single_event() {
        let destination = FakeDestination::start(None).await;
        let relay = TestRelay::start(&destination.url(), 16, OverflowPolicy::Block).await;

        let response = reqwest::Client::new()
            .post(relay.webhook_url())
            .json(&body("signup_clicked"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), r#"{"status":"success"}"#);

        let summary = relay.shutdown().await;
        assert_eq!(summary.metrics.delivered, 1);

        let received = destination.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let record = &received[0];
        assert_eq!(record["event"], "signup_clicked");
        assert_eq!(record["app_id"], "app-1");
        assert_eq!(record["screen_size"], "1920x1080");
        assert_eq!(record["attributes"]["button"]["value"], "signup");
        assert_eq!(record["traits"]["plan"]["value"], "pro");
        // empty second attribute slot under last-write-wins
        assert_eq!(record["attributes"][""]["value"], "");
    }

    /// N concurrent posts -> N x 200, destination receives N records
    #[tokio::test]
    async fn test_e2e_concurrent_posts() {
        const N: usize = 50;
        let destination = FakeDestination::start(None).await;
        let relay = TestRelay::start(&destination.url(), 8, OverflowPolicy::Block).await;
        let client = reqwest::Client::new();

        let mut requests = Vec::with_capacity(N);
        for i in 0..N {
            let client = client.clone();
            let url = relay.webhook_url();
            requests.push(tokio::spawn(async move {
                client
                    .post(url)
                    .json(&body(&format!("e{i}")))
                    .send()
                    .await
                    .unwrap()
                    .status()
            }));
        }
        for request in requests {
            assert_eq!(request.await.unwrap(), 200);
        }

        let summary = relay.shutdown().await;
        assert_eq!(summary.metrics.delivered, N as u64);
        assert_eq!(destination.count(), N);

        let mut events: Vec<String> = destination
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|r| r["event"].as_str().unwrap().to_string())
            .collect();
        events.sort();
        events.dedup();
        assert_eq!(events.len(), N);
    }

    /// A failing delivery does not affect the others
    #[tokio::test]
    async fn test_e2e_failure_isolation() {
        let destination = FakeDestination::start(Some("boom")).await;
        let relay = TestRelay::start(&destination.url(), 16, OverflowPolicy::Block).await;
        let client = reqwest::Client::new();

        for ev in ["before", "boom", "after"] {
            let status = client
                .post(relay.webhook_url())
                .json(&body(ev))
                .send()
                .await
                .unwrap()
                .status();
            // the caller never sees delivery failures
            assert_eq!(status, 200);
        }

        let summary = relay.shutdown().await;
        assert_eq!(summary.metrics.delivered, 2);
        assert_eq!(summary.metrics.rejected, 1);
        assert_eq!(destination.count(), 3);
    }

    /// Unreachable destination: accepted at intake, failed at delivery
    #[tokio::test]
    async fn test_e2e_unreachable_destination() {
        let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/ingest", unused.local_addr().unwrap());
        drop(unused);

        let relay = TestRelay::start(&url, 16, OverflowPolicy::Block).await;
        let status = reqwest::Client::new()
            .post(relay.webhook_url())
            .json(&body("lost"))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, 200);

        let summary = relay.shutdown().await;
        assert_eq!(summary.metrics.failed, 1);
        assert_eq!(summary.metrics.delivered, 0);
    }

    /// Malformed body -> 400, nothing reaches the destination
    #[tokio::test]
    async fn test_e2e_malformed_body() {
        let destination = FakeDestination::start(None).await;
        let relay = TestRelay::start(&destination.url(), 16, OverflowPolicy::Block).await;

        let response = reqwest::Client::new()
            .post(relay.webhook_url())
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert!(!response.text().await.unwrap().is_empty());

        let summary = relay.shutdown().await;
        assert_eq!(summary.metrics.dispatched, 0);
        assert_eq!(destination.count(), 0);
    }

    #[tokio::test]
    async fn test_e2e_skip_empty_keys() {
        let destination = FakeDestination::start(None).await;
        let relay = TestRelay::start_with(
            &destination.url(),
            16,
            OverflowPolicy::Block,
            KeyPolicy::SkipEmptyKeys,
            4,
        )
        .await;

        reqwest::Client::new()
            .post(relay.webhook_url())
            .json(&body("clean"))
            .send()
            .await
            .unwrap();
        relay.shutdown().await;

        let received = destination.received.lock().unwrap();
        let attributes = received[0]["attributes"].as_object().unwrap();
        assert_eq!(attributes.len(), 1);
        assert!(attributes.contains_key("button"));
    }

    /// Posts after shutdown began are refused
    #[tokio::test]
    async fn test_closed_queue_answers_503() {
        let destination = FakeDestination::start(None).await;
        let relay = TestRelay::start(&destination.url(), 16, OverflowPolicy::Block).await;
        relay.queue.close();

        let response = reqwest::Client::new()
            .post(relay.webhook_url())
            .json(&body("late"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
        assert_eq!(
            response.text().await.unwrap(),
            r#"{"status":"shutting_down"}"#
        );

        relay.shutdown().await;
        assert_eq!(destination.count(), 0);
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;
    use contracts::{OverflowPolicy, SinkType};
    use std::io::Write;

    #[test]
    fn test_load_config_file_and_build_sink() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[queue]
capacity = 4
overflow = "reject"

[destination]
url = "http://127.0.0.1:9/ingest"
timeout_ms = 500

[destination.headers]
x-source = "webhook-relay"
"#
        )
        .unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.queue.overflow, OverflowPolicy::Reject);
        assert_eq!(bp.destination.kind, SinkType::Http);

        let sink = dispatcher::create_sink(&bp.destination).unwrap();
        assert!(matches!(sink, dispatcher::Destination::Http(_)));
    }

    #[test]
    fn test_json_config_equivalent_to_toml() {
        let toml = "[dispatch]\nmax_in_flight = 3\n\n[destination]\nkind = \"log\"\n";
        let bp = ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, config_loader::ConfigFormat::Json).unwrap();
        assert_eq!(bp2.dispatch.max_in_flight, 3);
        assert_eq!(bp2.destination.kind, SinkType::Log);
    }
}
