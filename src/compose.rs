//! Build outbound Activity Streams objects and their canonical bytes.
//!
//! Serialization must be deterministic: the outbox names files after the
//! digest of these bytes, so the same logical message must always produce
//! the same byte sequence. Field order is the literal order below (the
//! `preserve_order` feature of serde_json keeps it), and the output is
//! pretty-printed with tab indentation.

use std::io;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Value, json};

use crate::error::TootError;

pub(crate) const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// One composed outbound object. Built per segment, serialized once,
/// then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActivityObject(Value);

impl ActivityObject {
    /// A public timeline post. Carries no `to` field at all.
    pub(crate) fn note(content: &str, attributed_to: &str) -> ActivityObject {
        ActivityObject(json!({
            "@context": ACTIVITY_STREAMS_CONTEXT,
            "type": "Note",
            "attributedTo": attributed_to,
            "content": content,
        }))
    }

    /// A direct message addressed to one or more resolved actors.
    pub(crate) fn direct_note(
        content: &str,
        attributed_to: &str,
        to: &[String],
    ) -> ActivityObject {
        ActivityObject(json!({
            "@context": ACTIVITY_STREAMS_CONTEXT,
            "type": "Note",
            "to": to,
            "attributedTo": attributed_to,
            "content": content,
        }))
    }

    /// A reply to an existing post, addressed to its author.
    pub(crate) fn reply(
        content: &str,
        attributed_to: &str,
        to: &str,
        in_reply_to: &str,
    ) -> ActivityObject {
        ActivityObject(json!({
            "@context": ACTIVITY_STREAMS_CONTEXT,
            "type": "Note",
            "to": to,
            "attributedTo": attributed_to,
            "inReplyTo": in_reply_to,
            "content": content,
        }))
    }

    /// A like of an existing post. No content.
    pub(crate) fn like(actor: &str, to: &str, object: &str) -> ActivityObject {
        ActivityObject(json!({
            "@context": ACTIVITY_STREAMS_CONTEXT,
            "type": "Like",
            "to": to,
            "actor": actor,
            "object": object,
        }))
    }

    /// Canonical bytes of this object: UTF-8 JSON, tab indented.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, TootError> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"\t");
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        self.0.serialize(&mut ser).map_err(io::Error::from)?;
        Ok(buf)
    }
}
