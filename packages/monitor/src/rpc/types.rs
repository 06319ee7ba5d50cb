use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::TransportError;

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

impl<'a> JsonRpcRequest<'a> {
    /// Parameterless call, which is all the sync and health queries need
    pub(crate) fn new(method: &'a str) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params: serde_json::json!([]),
            id: 1,
        }
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcError {
    code: i64,
    message: String,
}

impl<T: DeserializeOwned> JsonRpcResponse<T> {
    pub(crate) fn from_slice(body: &[u8]) -> Result<Self, TransportError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub(crate) fn into_result(self) -> Result<T, TransportError> {
        if let Some(error) = self.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        self.result.ok_or(TransportError::MissingResult)
    }
}
