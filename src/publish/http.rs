// ABOUTME: HTTP publisher speaking JSON over a raw hyper http1 connection.
// ABOUTME: One POST per artifact plus a read-only status probe.

use super::{PublishError, PublishReceipt, Publisher};
use crate::config::PublisherConfig;
use crate::stage::BuildArtifact;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

/// Publisher adapter for a remote publish API.
///
/// Endpoint configuration is injected at construction; nothing is read from
/// ambient process state.
pub struct HttpPublisher {
    config: PublisherConfig,
}

impl HttpPublisher {
    pub fn new(config: PublisherConfig) -> Self {
        Self { config }
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(u16, Bytes), PublishError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| PublishError::Unreachable(format!("{addr}: {e}")))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| PublishError::Unreachable(format!("HTTP handshake failed: {e}")))?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("publisher connection error: {}", e);
            }
        });

        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(path)
            .header("Host", self.config.host.as_str())
            .header("Content-Type", "application/json");

        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| PublishError::Unreachable(format!("failed to build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| PublishError::Unreachable(format!("request failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| PublishError::MalformedResponse(format!("failed to read body: {e}")))?;

        Ok((status, body.to_bytes()))
    }
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    bytecode: &'a str,
    abi: &'a str,
    args: &'a [serde_json::Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    compiler_version: Option<&'a str>,
}

#[derive(Deserialize)]
struct PublishResponse {
    result: Option<PublishResult>,
}

#[derive(Deserialize)]
struct PublishResult {
    address: Option<String>,
    #[serde(rename = "txHash")]
    tx_hash: Option<String>,
    #[serde(rename = "gasUsed")]
    gas_used: Option<String>,
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(
        &self,
        target_env: &str,
        artifact: &BuildArtifact,
        init_args: &[serde_json::Value],
    ) -> Result<PublishReceipt, PublishError> {
        let path = format!(
            "/api/v0/envs/{}/artifacts/{}/publish",
            urlencoding::encode(target_env),
            urlencoding::encode(&artifact.name)
        );

        let body = serde_json::to_vec(&PublishRequest {
            bytecode: &artifact.bytecode,
            abi: &artifact.abi,
            args: init_args,
            compiler_version: artifact.compiler_version.as_deref(),
        })
        .map_err(|e| PublishError::MalformedResponse(format!("failed to encode request: {e}")))?;

        let (status, bytes) = self.request("POST", &path, Some(body)).await?;

        if !(200..300).contains(&status) {
            return Err(PublishError::Rejected {
                status,
                message: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        let parsed: PublishResponse = serde_json::from_slice(&bytes)
            .map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        let result = parsed.result.unwrap_or(PublishResult {
            address: None,
            tx_hash: None,
            gas_used: None,
        });

        Ok(PublishReceipt {
            placement: result.address,
            transaction: result.tx_hash,
            cost: result.gas_used,
        })
    }

    async fn test_connection(&self) -> Result<(), PublishError> {
        let (status, bytes) = self.request("GET", "/api/v0/status", None).await?;

        if !(200..300).contains(&status) {
            return Err(PublishError::Rejected {
                status,
                message: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        Ok(())
    }
}
