//! Message decoding and attachment selection.

use log::debug;
use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use super::error::{MailboxError, Result};

/// A decoded message reduced to what attachment selection needs.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    pub subject: Option<String>,
    /// Parts in document order, containers included.
    pub parts: Vec<MessagePart>,
}

/// One MIME part of a [`ParsedMessage`].
#[derive(Debug, Clone, Default)]
pub struct MessagePart {
    pub content_type: String,
    /// True for containers (`multipart/*` and embedded `message/rfc822`),
    /// which never carry a payload themselves.
    pub is_multipart: bool,
    /// True when the part declares an `attachment` or `inline` disposition.
    pub has_disposition: bool,
    pub filename: Option<String>,
    /// Decoded payload, `None` when the part carries none or it could not be decoded.
    pub content: Option<Vec<u8>>,
}

/// The payload selected for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAttachment {
    /// Filename declared by the sender, unsanitized.
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl ParsedMessage {
    /// Decodes a raw RFC 5322 message.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| MailboxError::ParseError("Failed to parse email message".to_string()))?;

        let mut parts = Vec::with_capacity(message.parts.len());
        collect_parts(&message, &mut parts);

        Ok(Self {
            subject: message.subject().map(|s| s.to_string()),
            parts,
        })
    }

    /// Whether the subject passes the keyword filter.
    ///
    /// No filter (or an empty one) accepts everything. A message without a
    /// subject never matches a non-empty keyword.
    pub fn matches_keyword(&self, keyword: Option<&str>) -> bool {
        match keyword {
            None | Some("") => true,
            Some(keyword) => self
                .subject
                .as_deref()
                .is_some_and(|subject| subject.contains(keyword)),
        }
    }
}

/// Flattens `message` into `out` in document order. An embedded message
/// contributes its own parts right after the part that carries it, so a
/// forwarded message's attachments are reachable.
fn collect_parts(message: &Message<'_>, out: &mut Vec<MessagePart>) {
    for part in &message.parts {
        let (is_multipart, content) = match &part.body {
            PartType::Binary(data) | PartType::InlineBinary(data) => (false, Some(data.to_vec())),
            PartType::Text(text) | PartType::Html(text) => (false, Some(text.as_bytes().to_vec())),
            PartType::Message(_) | PartType::Multipart(_) => (true, None),
        };

        let content_type = part
            .content_type()
            .map(|ct| match ct.subtype() {
                Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                None => ct.ctype().to_string(),
            })
            .unwrap_or_else(|| "text/plain".to_string())
            .to_ascii_lowercase();

        let has_disposition = part.content_disposition().is_some_and(|d| {
            d.ctype().eq_ignore_ascii_case("attachment") || d.ctype().eq_ignore_ascii_case("inline")
        });

        out.push(MessagePart {
            content_type,
            is_multipart,
            has_disposition,
            filename: part.attachment_name().map(|s| s.to_string()),
            content,
        });

        if let PartType::Message(inner) = &part.body {
            collect_parts(inner, out);
        }
    }
}

/// Returns the first attachment of `message` worth printing.
///
/// The message is skipped entirely when its subject fails the keyword filter.
/// Otherwise parts are scanned in order: containers and parts without an
/// attachment/inline disposition are skipped, and the first part with a
/// non-empty payload wins.
pub fn extract_first_attachment(
    message: &ParsedMessage,
    keyword: Option<&str>,
) -> Option<ExtractedAttachment> {
    if !message.matches_keyword(keyword) {
        debug!(
            "Subject {:?} does not contain keyword {:?}, skipping",
            message.subject.as_deref().unwrap_or("(no subject)"),
            keyword.unwrap_or_default()
        );
        return None;
    }

    for part in &message.parts {
        if part.is_multipart || !part.has_disposition {
            continue;
        }

        match &part.content {
            Some(content) if !content.is_empty() => {
                debug!(
                    "Selected attachment {:?} ({}, {} bytes)",
                    part.filename.as_deref().unwrap_or("(unnamed)"),
                    part.content_type,
                    content.len()
                );
                return Some(ExtractedAttachment {
                    filename: part.filename.clone(),
                    content: content.clone(),
                });
            }
            _ => debug!(
                "Skipping empty part {:?} ({})",
                part.filename.as_deref().unwrap_or("(unnamed)"),
                part.content_type
            ),
        }
    }

    None
}
