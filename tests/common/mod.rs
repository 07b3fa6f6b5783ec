//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crm_frontend::api::request::ApiRequest;
use crm_frontend::api::transport::{RawResponse, Transport, TransportError};

pub enum Scripted {
    Respond(u16, serde_json::Value),
    Hang,
    Refuse,
}

/// Answers requests from a script and records what was sent.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<(String, ApiRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(String, ApiRequest)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), request.clone()));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Respond(status, body)) => Ok(RawResponse {
                status,
                status_text: String::new(),
                headers: BTreeMap::from([(
                    "content-type".to_string(),
                    "application/json".to_string(),
                )]),
                body: body.to_string(),
            }),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Other("never answered".into()))
            }
            Some(Scripted::Refuse) | None => {
                Err(TransportError::Connect("connection refused".into()))
            }
        }
    }
}


pub fn server_config() -> crm_frontend::models::config::ServerConfig {
    use crm_frontend::models::config::{
        ApiConfig, NotificationConfig, PaginationConfig, SearchConfig, ServerConfig,
        SessionConfig,
    };

    ServerConfig {
        domain: "localhost".to_string(),
        address: "127.0.0.1".to_string(),
        port: 8080,
        templates_dir: "templates/**/*".to_string(),
        secret: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".to_string(),
        api: ApiConfig {
            base_url: Some("http://backend/api/v1".to_string()),
            ..ApiConfig::default()
        },
        session: SessionConfig::default(),
        search: SearchConfig::default(),
        pagination: PaginationConfig::default(),
        notification: NotificationConfig::default(),
    }
}
