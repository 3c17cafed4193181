//! HTTP client matching the IOTA tagged-data block API used by the
//! original implementation (`iota/client.py`).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::TryFrom;
use std::time::Duration;

use dfs3_types::BlockId;

use crate::errors::LedgerError;
use crate::LedgerClient;

/// TaggedData payload type code, per the IOTA block format.
const TAGGED_DATA_PAYLOAD_TYPE: u8 = 5;

/// Tag every dfs3 block is published under, hex-encoded on the wire.
const TAG: &str = "dfs3";

#[derive(Debug, Serialize)]
struct BlockSubmission {
    #[serde(rename = "protocolVersion")]
    protocol_version: u8,
    payload: TaggedDataPayload,
}

#[derive(Debug, Serialize)]
struct TaggedDataPayload {
    #[serde(rename = "type")]
    kind: u8,
    tag: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "blockId")]
    block_id: String,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    payload: Option<FetchedPayload>,
}

#[derive(Debug, Deserialize)]
struct FetchedPayload {
    #[serde(rename = "type")]
    kind: u8,
    data: Option<String>,
}

/// Publishes and fetches envelopes against a live ledger node over HTTP.
pub struct HttpLedgerClient {
    client: Client,
    node_url: String,
}

impl HttpLedgerClient {
    pub fn new(node_url: impl Into<String>) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            node_url: node_url.into(),
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn publish(&self, envelope_bytes: &[u8]) -> Result<BlockId, LedgerError> {
        let block = json!(BlockSubmission {
            protocol_version: 2,
            payload: TaggedDataPayload {
                kind: TAGGED_DATA_PAYLOAD_TYPE,
                tag: format!("0x{}", hex::encode(TAG)),
                data: format!("0x{}", hex::encode(envelope_bytes)),
            },
        });

        let response = self
            .client
            .post(&self.node_url)
            .json(&block)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LedgerError::Connection(format!("cannot reach ledger at {}", self.node_url))
                } else {
                    LedgerError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::CREATED || status == StatusCode::ACCEPTED {
            let parsed: PublishResponse = response.json().await?;
            BlockId::try_from(parsed.block_id)
                .map_err(|e| LedgerError::Decode(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn fetch(&self, block_id: &BlockId) -> Result<Vec<u8>, LedgerError> {
        let url = format!("{}/{}", self.node_url, block_id.as_str());
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                LedgerError::Connection(format!("cannot reach ledger at {}", self.node_url))
            } else {
                LedgerError::Http(e)
            }
        })?;

        if response.status() != StatusCode::OK {
            return Err(LedgerError::NotFound(block_id.to_string()));
        }

        let parsed: FetchResponse = response.json().await?;
        let payload = parsed.payload.ok_or(LedgerError::NotTaggedData)?;
        if payload.kind != TAGGED_DATA_PAYLOAD_TYPE {
            return Err(LedgerError::NotTaggedData);
        }

        let data_hex = payload.data.ok_or(LedgerError::NotTaggedData)?;
        let stripped = data_hex.strip_prefix("0x").unwrap_or(&data_hex);
        hex::decode(stripped).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_encodes_to_expected_hex() {
        assert_eq!(hex::encode(TAG), "64667333");
    }

    #[test]
    fn publish_response_deserializes_block_id() {
        let json = serde_json::json!({"blockId": "0x".to_string() + &"a".repeat(64)});
        let parsed: PublishResponse = serde_json::from_value(json).unwrap();
        assert!(parsed.block_id.starts_with("0x"));
    }
}
