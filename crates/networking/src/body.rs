//! Request body encoding
//!
//! Turns a caller payload into request bytes based on the content type.
//! Matching is exact: `application/json; charset=utf-8` is not JSON here.

use crate::mime;
use serde::Serialize;
use serde_json::Value;

/// Encode `payload` for `content_type`
///
/// - [`mime::POST_FORM`]: the payload must serialize to a string, which is
///   sent verbatim. Anything else yields no body.
/// - [`mime::JSON`]: the payload as a JSON document followed by a newline.
/// - any other content type: no body.
///
/// Returns `Ok(None)` when no body should be sent.
///
/// # Errors
/// Returns the serializer error when a JSON payload cannot be encoded.
pub fn encode<P>(content_type: &str, payload: &P) -> Result<Option<Vec<u8>>, serde_json::Error>
where
    P: Serialize + ?Sized,
{
    match content_type {
        mime::POST_FORM => Ok(form_text(payload).map(String::into_bytes)),
        mime::JSON => {
            let mut body = serde_json::to_vec(payload)?;
            body.push(b'\n');
            Ok(Some(body))
        }
        _ => Ok(None),
    }
}

fn form_text<P>(payload: &P) -> Option<String>
where
    P: Serialize + ?Sized,
{
    match serde_json::to_value(payload) {
        Ok(Value::String(text)) => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Serializer;
    use std::collections::BTreeMap;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    #[test]
    fn test_json_body_has_trailing_newline() {
        let body = encode(mime::JSON, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(body.as_deref(), Some(&b"{\"a\":1}\n"[..]));
    }

    #[test]
    fn test_json_body_keeps_field_order() {
        #[derive(Serialize)]
        struct Item {
            zeta: u8,
            alpha: &'static str,
        }

        let body = encode(mime::JSON, &Item { zeta: 2, alpha: "x" }).unwrap().unwrap();
        assert_eq!(body, b"{\"zeta\":2,\"alpha\":\"x\"}\n");
    }

    #[test]
    fn test_json_encode_failure() {
        assert!(encode(mime::JSON, &Unencodable).is_err());
    }

    #[test]
    fn test_form_text_is_verbatim() {
        let body = encode(mime::POST_FORM, "a=1&b=hello%20world").unwrap();
        assert_eq!(body.as_deref(), Some(&b"a=1&b=hello%20world"[..]));

        let owned = String::from("x=y");
        let body = encode(mime::POST_FORM, &owned).unwrap();
        assert_eq!(body.as_deref(), Some(&b"x=y"[..]));
    }

    #[test]
    fn test_form_requires_text_payload() {
        let mut fields = BTreeMap::new();
        fields.insert("a", "1");
        assert_eq!(encode(mime::POST_FORM, &fields).unwrap(), None);
        assert_eq!(encode(mime::POST_FORM, &42).unwrap(), None);
        assert_eq!(encode(mime::POST_FORM, &Unencodable).unwrap(), None);
    }

    #[test]
    fn test_other_content_types_have_no_body() {
        for content_type in [
            mime::HTML,
            mime::XML,
            mime::XML2,
            mime::PLAIN,
            mime::MULTIPART_POST_FORM,
            mime::PROTOBUF,
            mime::MSGPACK,
            mime::MSGPACK2,
            "application/json; charset=utf-8",
        ] {
            assert_eq!(encode(content_type, "payload").unwrap(), None, "{content_type}");
        }
    }
}
