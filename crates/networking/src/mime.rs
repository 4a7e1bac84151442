//! Recognized content-type identifiers
//!
//! Only [`JSON`] and [`POST_FORM`] have a request body encoder (see
//! [`crate::body`]); the rest are identifiers for callers to pass through.

/// `application/json`
pub const JSON: &str = "application/json";
/// `text/html`
pub const HTML: &str = "text/html";
/// `application/xml`
pub const XML: &str = "application/xml";
/// `text/xml`
pub const XML2: &str = "text/xml";
/// `text/plain`
pub const PLAIN: &str = "text/plain";
/// `application/x-www-form-urlencoded`
pub const POST_FORM: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`
pub const MULTIPART_POST_FORM: &str = "multipart/form-data";
/// `application/x-protobuf`
pub const PROTOBUF: &str = "application/x-protobuf";
/// `application/x-msgpack`
pub const MSGPACK: &str = "application/x-msgpack";
/// `application/msgpack`
pub const MSGPACK2: &str = "application/msgpack";
