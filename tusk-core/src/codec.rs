//! JSON wire codec for federation documents.
//!
//! ActivityStreams documents travel as JSON(-LD). The codec does no JSON-LD
//! expansion: `@context` and every property the vocabulary types do not
//! model are carried through untouched in each type's `extra` map, so
//! `decode(encode(doc)) == doc` for every document `encode` accepts.
//!
//! Decoding picks the document variant from `type`. An [`Object`] built
//! with a reserved type name would come back as a different variant (or
//! not at all), so `encode` refuses it.
//!
//! [`Object`]: crate::Object

use std::fmt;

use crate::document::{Addressable, Document};

/// Codec errors.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// Encoding failed
    Encode(String),
    /// Input was not valid JSON or matched no document type
    Decode(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode(e) => write!(f, "Document encode error: {e}"),
            CodecError::Decode(e) => write!(f, "Document decode error: {e}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Decode a document from JSON bytes.
pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| {
        log::debug!("Rejected {} byte document: {e}", bytes.len());
        CodecError::Decode(e.to_string())
    })
}

/// Encode a document to compact JSON bytes.
pub fn encode(document: &Document) -> Result<Vec<u8>, CodecError> {
    check_type(document)?;
    serde_json::to_vec(document).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Encode a document to indented JSON, for display.
pub fn encode_pretty(document: &Document) -> Result<String, CodecError> {
    check_type(document)?;
    serde_json::to_string_pretty(document).map_err(|e| CodecError::Encode(e.to_string()))
}

fn check_type(document: &Document) -> Result<(), CodecError> {
    if document.is_well_typed() {
        return Ok(());
    }
    Err(CodecError::Encode(format!(
        "`{}` is reserved and cannot be encoded as a plain object",
        document.type_name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Object;
    use crate::document::DocumentKind;
    use crate::identifier::Identifier;
    use serde_json::Value;

    const PERSON: &str = r#"{
        "@context": ["https://www.w3.org/ns/activitystreams", "https://w3id.org/security/v1"],
        "type": "Person",
        "id": "https://example.com/users/alice",
        "preferredUsername": "alice",
        "name": "Alice",
        "inbox": "https://example.com/users/alice/inbox",
        "outbox": "https://example.com/users/alice/outbox",
        "followers": "https://example.com/users/alice/followers",
        "following": {
            "type": "OrderedCollection",
            "id": "https://example.com/users/alice/following",
            "totalItems": 0
        }
    }"#;

    #[test]
    fn test_decode_person_keeps_unmodelled_properties() {
        let doc = decode(PERSON.as_bytes()).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Actor);
        let actor = doc.as_actor().unwrap();
        assert_eq!(actor.preferred_username.as_deref(), Some("alice"));
        assert_eq!(actor.extra.get("name").and_then(|v| v.as_str()), Some("Alice"));
        assert!(actor.extra.contains_key("@context"));
        assert!(actor.following.as_ref().unwrap().embedded().is_some());
    }

    #[test]
    fn test_encode_decode_is_lossless() {
        let doc = decode(PERSON.as_bytes()).unwrap();
        let bytes = encode(&doc).unwrap();
        let again = decode(&bytes).unwrap();
        assert_eq!(again, doc);
        assert_eq!(again.id(), doc.id());
    }

    #[test]
    fn test_encode_refuses_object_with_reserved_type() {
        let mut collection = Object::new("OrderedCollection");
        collection.id = Some(Identifier::parse("https://example.com/c/1").unwrap());
        assert!(matches!(
            encode(&Document::from(collection.clone())),
            Err(CodecError::Encode(_))
        ));
        assert!(matches!(
            encode_pretty(&Document::from(collection)),
            Err(CodecError::Encode(_))
        ));

        // Carries everything a Follow needs, yet would decode as an Activity
        let mut follow = Object::new("Follow");
        follow
            .extra
            .insert("actor".to_string(), Value::from("https://remote.example/users/b"));
        assert!(matches!(encode(&Document::from(follow)), Err(CodecError::Encode(_))));
    }

    #[test]
    fn test_object_round_trip_keeps_variant() {
        let mut note = Object::new("Note");
        note.id = Some(Identifier::parse("https://example.com/notes/1").unwrap());
        note.extra.insert("content".to_string(), Value::from("hi"));
        let doc = Document::from(note);

        let again = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(again.kind(), DocumentKind::Object);
        assert_eq!(again, doc);
    }

    #[test]
    fn test_decode_rejects_untyped_and_garbage() {
        assert!(matches!(decode(b"not json"), Err(CodecError::Decode(_))));
        assert!(matches!(
            decode(br#"{"id": "https://example.com/x"}"#),
            Err(CodecError::Decode(_))
        ));
    }
}
