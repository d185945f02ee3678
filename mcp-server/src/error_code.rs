//! JSON-RPC error codes, per https://www.jsonrpc.org/specification#error_object

pub(crate) const INVALID_REQUEST_ERROR_CODE: i64 = -32600;
pub(crate) const INTERNAL_ERROR_CODE: i64 = -32603;
