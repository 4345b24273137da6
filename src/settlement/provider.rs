// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Contract with the recharge / bill / payout gateways, and the HTTP client
//! that speaks it.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::Service;
use crate::utils::http_client;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome codes on the submit call: 1 = success, 2 = pending, 3 = failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Success,
    Pending,
    Failed,
}

impl ProviderStatus {
    pub fn from_code(code: i64) -> EngineResult<Self> {
        match code {
            1 => Ok(ProviderStatus::Success),
            2 => Ok(ProviderStatus::Pending),
            3 => Ok(ProviderStatus::Failed),
            other => Err(EngineError::InvalidProviderResponse(format!(
                "status code {} outside 1..=3",
                other
            ))),
        }
    }

    /// Status names returned by the poll call.
    pub fn from_poll(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(ProviderStatus::Success),
            "PENDING" => Ok(ProviderStatus::Pending),
            "FAILURE" | "FAILED" => Ok(ProviderStatus::Failed),
            other => Err(EngineError::InvalidProviderResponse(format!(
                "unknown poll status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub client_ref: String,
    pub service: Service,
    pub target: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResponse {
    pub status: ProviderStatus,
    pub provider_ref: String,
    pub message: String,
}

/// A settlement gateway. Calls are synchronous and block the worker.
pub trait Provider {
    fn submit(&self, req: &SubmitRequest) -> EngineResult<SubmitResponse>;
    fn poll_status(&self, provider_ref: &str) -> EngineResult<ProviderStatus>;
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    status: i64,
    #[serde(default)]
    provider_ref: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct PollBody {
    status: String,
}

pub fn parse_submit_body(body: &str) -> EngineResult<SubmitResponse> {
    let b: SubmitBody = serde_json::from_str(body)
        .map_err(|e| EngineError::InvalidProviderResponse(format!("unparseable body: {}", e)))?;
    let status = ProviderStatus::from_code(b.status)?;
    let provider_ref = b.provider_ref.unwrap_or_default();
    if provider_ref.is_empty() && status != ProviderStatus::Failed {
        return Err(EngineError::InvalidProviderResponse(
            "accepted response without provider_ref".into(),
        ));
    }
    Ok(SubmitResponse {
        status,
        provider_ref,
        message: b.message,
    })
}

pub fn parse_poll_body(body: &str) -> EngineResult<ProviderStatus> {
    let b: PollBody = serde_json::from_str(body)
        .map_err(|e| EngineError::InvalidProviderResponse(format!("unparseable body: {}", e)))?;
    ProviderStatus::from_poll(&b.status)
}

pub struct HttpProvider {
    client: reqwest::blocking::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> EngineResult<Self> {
        let client = http_client(timeout).map_err(|e| EngineError::ProviderUnavailable(e.to_string()))?;
        let base_url = Url::parse(base_url)
            .map_err(|e| EngineError::ProviderUnavailable(format!("bad provider url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::ProviderUnavailable(format!(
                "provider url {} cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn from_config(cfg: &EngineConfig) -> EngineResult<Self> {
        Self::new(&cfg.provider_url, cfg.provider_api_key.clone(), cfg.provider_timeout)
    }

    /// `{base}/v1/transactions[/{provider_ref}]`, with the ref encoded as a
    /// single path segment.
    fn transactions_url(&self, provider_ref: Option<&str>) -> EngineResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                EngineError::ProviderUnavailable(format!("provider url {} cannot carry a path", self.base_url))
            })?;
            segments.pop_if_empty().extend(["v1", "transactions"]);
            if let Some(r) = provider_ref {
                segments.push(r);
            }
        }
        Ok(url)
    }

    fn send(&self, rb: reqwest::blocking::RequestBuilder) -> EngineResult<String> {
        let rb = match &self.api_key {
            Some(k) => rb.bearer_auth(k),
            None => rb,
        };
        let resp = rb
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| EngineError::ProviderUnavailable(e.to_string()))?;
        resp.text()
            .map_err(|e| EngineError::ProviderUnavailable(e.to_string()))
    }
}

impl Provider for HttpProvider {
    fn submit(&self, req: &SubmitRequest) -> EngineResult<SubmitResponse> {
        let url = self.transactions_url(None)?;
        tracing::debug!(%url, client_ref = %req.client_ref, "submitting to provider");
        let body = self.send(self.client.post(url).json(req))?;
        parse_submit_body(&body)
    }

    fn poll_status(&self, provider_ref: &str) -> EngineResult<ProviderStatus> {
        let url = self.transactions_url(Some(provider_ref))?;
        tracing::debug!(%url, "polling provider");
        let body = self.send(self.client.get(url))?;
        parse_poll_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ProviderStatus::from_code(1).unwrap(), ProviderStatus::Success);
        assert_eq!(ProviderStatus::from_code(2).unwrap(), ProviderStatus::Pending);
        assert_eq!(ProviderStatus::from_code(3).unwrap(), ProviderStatus::Failed);
        assert!(matches!(
            ProviderStatus::from_code(4),
            Err(EngineError::InvalidProviderResponse(_))
        ));
        assert!(ProviderStatus::from_code(0).is_err());
    }

    #[test]
    fn submit_body_parsing() {
        let ok = parse_submit_body(r#"{"status":2,"provider_ref":"OP-881","message":"queued"}"#)
            .unwrap();
        assert_eq!(ok.status, ProviderStatus::Pending);
        assert_eq!(ok.provider_ref, "OP-881");

        let failed = parse_submit_body(r#"{"status":3,"message":"operator down"}"#).unwrap();
        assert_eq!(failed.status, ProviderStatus::Failed);

        assert!(matches!(
            parse_submit_body(r#"{"status":1}"#),
            Err(EngineError::InvalidProviderResponse(_))
        ));
        assert!(matches!(
            parse_submit_body("<html>502</html>"),
            Err(EngineError::InvalidProviderResponse(_))
        ));
        assert!(matches!(
            parse_submit_body(r#"{"status":7,"provider_ref":"X"}"#),
            Err(EngineError::InvalidProviderResponse(_))
        ));
    }

    #[test]
    fn poll_body_parsing() {
        assert_eq!(
            parse_poll_body(r#"{"status":"FAILURE"}"#).unwrap(),
            ProviderStatus::Failed
        );
        assert_eq!(
            parse_poll_body(r#"{"status":"success"}"#).unwrap(),
            ProviderStatus::Success
        );
        assert!(parse_poll_body(r#"{"status":"REFUNDED"}"#).is_err());
    }

    #[test]
    fn provider_ref_stays_one_path_segment() {
        let p = HttpProvider::new("http://gw.local/api/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            p.transactions_url(None).unwrap().as_str(),
            "http://gw.local/api/v1/transactions"
        );
        assert_eq!(
            p.transactions_url(Some("OP/7?x#y")).unwrap().as_str(),
            "http://gw.local/api/v1/transactions/OP%2F7%3Fx%23y"
        );

        let bare = HttpProvider::new("http://127.0.0.1:8085", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            bare.transactions_url(Some("OP-1")).unwrap().as_str(),
            "http://127.0.0.1:8085/v1/transactions/OP-1"
        );
        assert!(HttpProvider::new("not a url", None, Duration::from_secs(1)).is_err());
        assert!(HttpProvider::new("mailto:ops@gw.local", None, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn unreachable_gateway_is_provider_unavailable() {
        // port 9 (discard) on localhost is not expected to accept HTTP
        let p = HttpProvider::new("http://127.0.0.1:9", None, Duration::from_millis(300)).unwrap();
        let err = p.poll_status("X").unwrap_err();
        assert!(matches!(err, EngineError::ProviderUnavailable(_)));
    }
}
