//! S3 event-notification records.
//!
//! The trigger delivers the standard S3 `ObjectCreated` notification shape:
//! a `Records` array where each record carries the bucket name and the
//! URL-encoded object key. Parsing is tolerant: a record missing its
//! bucket or key yields no [`SourceReference`] and is skipped by the
//! caller instead of failing the whole delivery.

use serde::Deserialize;

/// One source object, as referenced by a trigger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

/// An S3 event notification payload.
#[derive(Debug, Deserialize)]
pub struct S3Event {
    #[serde(default, rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct S3EventRecord {
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<BucketRef>,
    #[serde(default)]
    pub object: Option<ObjectRef>,
}

#[derive(Debug, Deserialize)]
pub struct BucketRef {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectRef {
    pub key: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl S3EventRecord {
    /// Extract the source reference, or `None` for a malformed record.
    pub fn source(&self) -> Option<SourceReference> {
        let s3 = self.s3.as_ref()?;
        let bucket = s3.bucket.as_ref()?.name.clone()?;
        let object = s3.object.as_ref()?;
        let key = object.key.clone()?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(SourceReference {
            bucket,
            key: decode_key(&key),
            size: object.size.unwrap_or(0),
        })
    }
}

/// S3 notifications URL-encode object keys, with spaces as `+`.
fn decode_key(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_decoded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_put_notification() {
        let payload = r#"{
            "Records": [
                {
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": {"name": "uploads-bucket"},
                        "object": {"key": "uploads/photo.jpg", "size": 34567}
                    }
                }
            ]
        }"#;
        let event: S3Event = serde_json::from_str(payload).unwrap();
        assert_eq!(event.records.len(), 1);
        let source = event.records[0].source().unwrap();
        assert_eq!(source.bucket, "uploads-bucket");
        assert_eq!(source.key, "uploads/photo.jpg");
        assert_eq!(source.size, 34567);
    }

    #[test]
    fn decodes_url_encoded_keys() {
        let payload = r#"{
            "Records": [
                {
                    "s3": {
                        "bucket": {"name": "b"},
                        "object": {"key": "uploads/my+photo%281%29.jpg"}
                    }
                }
            ]
        }"#;
        let event: S3Event = serde_json::from_str(payload).unwrap();
        let source = event.records[0].source().unwrap();
        assert_eq!(source.key, "uploads/my photo(1).jpg");
    }

    #[test]
    fn malformed_record_yields_no_source() {
        let payload = r#"{"Records": [{"s3": {"bucket": {"name": "b"}}}, {}]}"#;
        let event: S3Event = serde_json::from_str(payload).unwrap();
        assert_eq!(event.records.len(), 2);
        assert!(event.records[0].source().is_none());
        assert!(event.records[1].source().is_none());
    }

    #[test]
    fn missing_size_defaults_to_zero() {
        let payload = r#"{
            "Records": [
                {"s3": {"bucket": {"name": "b"}, "object": {"key": "k.png"}}}
            ]
        }"#;
        let event: S3Event = serde_json::from_str(payload).unwrap();
        assert_eq!(event.records[0].source().unwrap().size, 0);
    }

    #[test]
    fn empty_records_array() {
        let event: S3Event = serde_json::from_str(r#"{"Records": []}"#).unwrap();
        assert!(event.records.is_empty());
    }
}
