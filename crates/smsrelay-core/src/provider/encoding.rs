//! Request body encoders

use std::collections::BTreeMap;
use std::str::FromStr;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{Error, Result};

/// Body encodings understood by [`encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
    /// `multipart/form-data`
    Multipart,
}

impl ContentType {
    /// MIME type without parameters
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::Multipart => "multipart/form-data",
        }
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application/json" => Ok(Self::Json),
            "application/x-www-form-urlencoded" => Ok(Self::FormUrlEncoded),
            "multipart/form-data" => Ok(Self::Multipart),
            _ => Err(Error::UnsupportedContentType(s.to_string())),
        }
    }
}

/// An encoded request body with its `Content-Type` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// Header value, including the boundary for multipart bodies
    pub content_type: String,
    /// Encoded body
    pub payload: String,
}

/// Encode `body` according to `content_type`.
pub fn encode(content_type: &str, body: &BTreeMap<String, String>) -> Result<EncodedBody> {
    let encoded = match content_type.parse::<ContentType>()? {
        ContentType::Json => EncodedBody {
            content_type: ContentType::Json.as_str().to_string(),
            payload: serde_json::to_string(body)?,
        },
        ContentType::FormUrlEncoded => {
            let payload = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(body)
                .finish();
            EncodedBody {
                content_type: ContentType::FormUrlEncoded.as_str().to_string(),
                payload,
            }
        }
        ContentType::Multipart => encode_multipart(body, &boundary()),
    };

    Ok(encoded)
}

fn boundary() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

fn encode_multipart(body: &BTreeMap<String, String>, boundary: &str) -> EncodedBody {
    let mut payload = String::new();
    for (name, value) in body {
        let name = name.replace('"', "%22");
        payload.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    payload.push_str(&format!("--{boundary}--\r\n"));

    EncodedBody {
        content_type: format!("{}; boundary={boundary}", ContentType::Multipart.as_str()),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("from".to_string(), "SVC".to_string()),
            ("message".to_string(), "disk full & more".to_string()),
            ("to".to_string(), "+15551234567".to_string()),
        ])
    }

    #[test]
    fn test_json() {
        let encoded = encode("application/json", &body()).unwrap();

        assert_eq!(encoded.content_type, "application/json");
        assert_eq!(
            encoded.payload,
            r#"{"from":"SVC","message":"disk full & more","to":"+15551234567"}"#
        );
    }

    #[test]
    fn test_form_urlencoded() {
        let encoded = encode("application/x-www-form-urlencoded", &body()).unwrap();

        assert_eq!(encoded.content_type, "application/x-www-form-urlencoded");
        assert_eq!(
            encoded.payload,
            "from=SVC&message=disk+full+%26+more&to=%2B15551234567"
        );
    }

    #[test]
    fn test_multipart() {
        let encoded = encode_multipart(&body(), "XYZ");

        assert_eq!(encoded.content_type, "multipart/form-data; boundary=XYZ");
        assert!(encoded.payload.starts_with(
            "--XYZ\r\nContent-Disposition: form-data; name=\"from\"\r\n\r\nSVC\r\n"
        ));
        assert!(encoded.payload.ends_with("--XYZ--\r\n"));
        assert_eq!(encoded.payload.matches("Content-Disposition").count(), 3);
    }

    #[test]
    fn test_multipart_random_boundary_in_header() {
        let encoded = encode("multipart/form-data", &body()).unwrap();
        let boundary = encoded
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();

        assert_eq!(boundary.len(), 30);
        assert!(encoded.payload.starts_with(&format!("--{boundary}\r\n")));
    }

    #[test]
    fn test_content_type_is_case_insensitive() {
        assert_eq!("Application/JSON".parse::<ContentType>().unwrap(), ContentType::Json);
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = encode("text/xml", &body()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedContentType(ref ct) if ct == "text/xml"));
    }
}
