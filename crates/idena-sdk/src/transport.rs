//! Transport layer for RPC communication

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::SdkError;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get the `result` value
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError>;
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SdkError> {
    serde_json::from_value(value).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// Scripted answer for one mock call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// `{"result": value}`
    Result(Value),
    /// `{"error": {"code": code, "message": message}}`
    Error {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },
    /// A response carrying neither `result` nor `error`
    Empty,
    /// The node could not be reached
    Unreachable,
}

#[derive(Default)]
struct MockState {
    persistent: HashMap<String, MockReply>,
    queued: HashMap<String, VecDeque<MockReply>>,
    calls: Vec<(String, Vec<Value>)>,
}

/// Mock transport for testing
///
/// Answers, in order of precedence: the next queued one-shot reply for the
/// method, the persistent reply set for it, then a built-in default. Every
/// call is recorded. Clones share state, so a test can keep a handle after
/// moving one clone into a client.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    defaults: Arc<HashMap<String, Value>>,
}

/// Address used by the mock's default identity record
pub const MOCK_IDENTITY_ADDRESS: &str = "0xd65fd9617609a5bc7cbe6f3cfdb53b51d6c33e5c";

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();

        defaults.insert(
            "dna_epoch".to_string(),
            json!({
                "epoch": 42,
                "nextValidation": "2026-10-20T13:30:00Z",
                "currentPeriod": "None"
            }),
        );
        defaults.insert(
            "dna_getBalance".to_string(),
            json!({ "stake": "0", "balance": "10", "nonce": 5 }),
        );
        defaults.insert("bcn_feePerGas".to_string(), Value::String("10000000000".to_string()));
        defaults.insert(
            "bcn_transaction".to_string(),
            json!({
                "hash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
                "type": "send",
                "from": "0x754b6e821cfb21e63b28ffdeae2e593882d332d3",
                "to": "0x754b6e821cfb21e63b28ffdeae2e593882d332d3",
                "amount": "0.001",
                "tips": "0",
                "maxFee": "0.00002",
                "nonce": 6,
                "epoch": 42,
                "payload": "0x",
                "blockHash": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
                "usedFee": "0.0000021",
                "timestamp": 1760000000
            }),
        );
        defaults.insert(
            "dna_identity".to_string(),
            json!({
                "address": MOCK_IDENTITY_ADDRESS,
                "profileHash": "",
                "stake": "12.5",
                "invites": 0,
                "age": 3,
                "state": "Human",
                "pubkey": "",
                "requiredFlips": 3,
                "availableFlips": 0,
                "flipKeyWordPairs": null,
                "madeFlips": 3,
                "totalQualifiedFlips": 20,
                "totalShortFlipPoints": 18.5,
                "flips": [],
                "online": false,
                "generation": 1,
                "code": "0x",
                "invitees": null,
                "penalty": "0",
                "lastValidationFlags": null
            }),
        );

        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            defaults: Arc::new(defaults),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        // Mutex poisoning indicates a panicked test thread
        self.state.lock().expect("MockTransport mutex poisoned")
    }

    /// Set a persistent response for a specific method
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_response(&self, method: &str, response: Value) {
        self.state()
            .persistent
            .insert(method.to_string(), MockReply::Result(response));
    }

    /// Make a method persistently answer with an error object
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        self.state().persistent.insert(
            method.to_string(),
            MockReply::Error {
                code,
                message: message.to_string(),
            },
        );
    }

    /// Queue a one-shot reply, consumed before any persistent one
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn push_reply(&self, method: &str, reply: MockReply) {
        self.state()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Number of calls made for `method`
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|(m, _)| m == method).count()
    }

    /// Parameters of every call made for `method`, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn calls(&self, method: &str) -> Vec<Vec<Value>> {
        self.state()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// Clear custom responses and the call log
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn clear_responses(&self) {
        let mut state = self.state();
        state.persistent.clear();
        state.queued.clear();
        state.calls.clear();
    }

    fn default_reply(&self, method: &str, params: &[Value]) -> Option<Value> {
        // Distinct transactions get distinct hashes
        if method == "bcn_sendRawTx" {
            let raw = params.first()?.as_str()?;
            let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).ok()?;
            return Some(Value::String(idena_crypto::keccak256(&bytes).to_hex()));
        }
        self.defaults.get(method).cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let scripted = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| SdkError::NetworkUnavailable("MockTransport mutex poisoned".to_string()))?;
            state.calls.push((method.to_string(), params.clone()));
            let queued = state.queued.get_mut(method).and_then(VecDeque::pop_front);
            queued.or_else(|| state.persistent.get(method).cloned())
        };

        match scripted {
            Some(MockReply::Result(value)) => Ok(value),
            Some(MockReply::Error { code, message }) => Err(SdkError::Rpc { code, message }),
            Some(MockReply::Empty) => Err(SdkError::UnknownRpcError {
                method: method.to_string(),
            }),
            Some(MockReply::Unreachable) => Err(SdkError::NetworkUnavailable(format!(
                "{}: connection refused",
                method
            ))),
            None => self.default_reply(method, &params).ok_or_else(|| SdkError::Rpc {
                code: -32601,
                message: format!("the method {} does not exist/is not available", method),
            }),
        }
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            api_key: None,
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Attach the node API key sent with every request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }

    fn body(&self, method: &str, params: Vec<Value>) -> Value {
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": method,
            "params": params,
        });
        if let (Some(key), Some(obj)) = (&self.api_key, request.as_object_mut()) {
            obj.insert("key".to_string(), Value::String(key.clone()));
        }
        request
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let request = self.body(method, params);
        tracing::debug!(method, url = %self.url, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SdkError::NetworkUnavailable(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| SdkError::NetworkUnavailable(format!("{}: {}", method, e)))?;

        response.into_result(method)
    }
}

#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(serde::Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl JsonRpcResponse {
    fn into_result(self, method: &str) -> Result<Value, SdkError> {
        if let Some(error) = self.error {
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or_else(|| SdkError::UnknownRpcError {
            method: method.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let transport = MockTransport::new();

        let result = transport.request_json("dna_epoch", vec![]).await.unwrap();
        assert_eq!(result["epoch"], 42);

        let result = transport.request_json("bcn_feePerGas", vec![]).await.unwrap();
        assert_eq!(result, Value::String("10000000000".to_string()));
    }

    #[tokio::test]
    async fn test_mock_transport_custom_response() {
        let transport = MockTransport::new();
        transport.set_response("dna_epoch", json!({ "epoch": 7 }));

        let result = transport.request_json("dna_epoch", vec![]).await.unwrap();
        assert_eq!(result["epoch"], 7);
    }

    #[tokio::test]
    async fn test_mock_transport_queue_precedes_persistent() {
        let transport = MockTransport::new();
        transport.set_response("dna_epoch", json!({ "epoch": 7 }));
        transport.push_reply("dna_epoch", MockReply::Result(json!({ "epoch": 1 })));

        let first = transport.request_json("dna_epoch", vec![]).await.unwrap();
        let second = transport.request_json("dna_epoch", vec![]).await.unwrap();
        assert_eq!(first["epoch"], 1);
        assert_eq!(second["epoch"], 7);
        assert_eq!(transport.call_count("dna_epoch"), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_error_reply() {
        let transport = MockTransport::new();
        transport.set_error("bcn_sendRawTx", -32000, "insufficient funds");

        match transport.request_json("bcn_sendRawTx", vec![]).await {
            Err(SdkError::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "insufficient funds");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_transport_hashes_raw_tx() {
        let transport = MockTransport::new();
        let a = transport
            .request_json("bcn_sendRawTx", vec![json!("0x01")])
            .await
            .unwrap();
        let b = transport
            .request_json("bcn_sendRawTx", vec![json!("0x02")])
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str().unwrap().len(), 66);
        assert_eq!(transport.calls("bcn_sendRawTx")[1], vec![json!("0x02")]);
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let transport = MockTransport::new();
        let result = transport.request_json("unknown_method", vec![]).await;
        assert!(matches!(result, Err(SdkError::Rpc { code: -32601, .. })));
    }

    #[test]
    fn test_response_without_result_or_error() {
        let response: JsonRpcResponse = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert!(matches!(
            response.into_result("dna_epoch"),
            Err(SdkError::UnknownRpcError { .. })
        ));
    }

    #[test]
    fn test_response_error_message_verbatim() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"id":1,"error":{"code":-32000,"message":"insufficient funds"}}"#,
        )
        .unwrap();
        match response.into_result("bcn_sendRawTx") {
            Err(SdkError::Rpc { message, .. }) => assert_eq!(message, "insufficient funds"),
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_body_includes_api_key() {
        let transport = HttpTransport::new("http://localhost:9009").with_api_key("secret");
        let body = transport.body("dna_epoch", vec![]);
        assert_eq!(body["key"], "secret");
        assert_eq!(body["method"], "dna_epoch");
        assert_eq!(body["id"], 1);

        let plain = HttpTransport::new("http://localhost:9009");
        assert!(plain.body("dna_epoch", vec![]).get("key").is_none());
    }
}
