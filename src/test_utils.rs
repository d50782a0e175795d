//! Shared fixtures for unit tests: a scripted transport and page builders.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::infrastructure::transport::{RawResponse, Transport, TransportError};

/// Transport replaying a fixed script of responses and recording requested URLs
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: impl Into<String>) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(200, body))
    }

    pub fn timeout() -> Result<RawResponse, TransportError> {
        Err(TransportError::Timeout {
            url: "scripted".to_string(),
            message: "operation timed out".to_string(),
        })
    }

    pub fn refused() -> Result<RawResponse, TransportError> {
        Err(TransportError::Connect {
            url: "scripted".to_string(),
            message: "connection refused".to_string(),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for {url}"))
    }
}

/// Result page with a counter and `count` listings named "<prefix> <n>"
pub fn result_page(counter: &str, prefix: &str, count: usize) -> String {
    let items: String = (1..=count)
        .map(|n| {
            format!(
                r#"<li class="results-item">
                     <a class="item__info-link" href="https://produto.mercadolivre.com.br/MLB-{prefix}-{n}">
                       <span class="main-title">{prefix} {n}</span>
                     </a>
                     <span class="price__fraction">{n}0</span><span class="price__decimals">50</span>
                   </li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="quantity-results">{counter}</div><ol id="searchResults">{items}</ol></body></html>"#
    )
}

/// Well-formed page that has not rendered its listings yet
pub fn loading_page() -> String {
    r#"<html><body><div class="loading">Carregando...</div></body></html>"#.to_string()
}
