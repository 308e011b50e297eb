//! Builders for test messages and cycle settings.

#![allow(dead_code)]

use std::time::Duration;

use mailprint::email::{MessagePart, ParsedMessage};
use mailprint::CycleSettings;

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%test\n";

/// Builder for `ParsedMessage` instances.
pub struct MessageBuilder {
    subject: Option<String>,
    parts: Vec<MessagePart>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            subject: None,
            parts: vec![MessagePart {
                content_type: "multipart/mixed".to_string(),
                is_multipart: true,
                ..MessagePart::default()
            }],
        }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Add a plain-text body part without a disposition.
    pub fn body(mut self, text: &str) -> Self {
        self.parts.push(MessagePart {
            content_type: "text/plain".to_string(),
            content: Some(text.as_bytes().to_vec()),
            ..MessagePart::default()
        });
        self
    }

    /// Add an attachment part.
    pub fn attachment(mut self, filename: &str, content: &[u8]) -> Self {
        self.parts.push(MessagePart {
            content_type: "application/octet-stream".to_string(),
            has_disposition: true,
            filename: Some(filename.to_string()),
            content: Some(content.to_vec()),
            ..MessagePart::default()
        });
        self
    }

    pub fn pdf(self, filename: &str) -> Self {
        self.attachment(filename, PDF_BYTES)
    }

    pub fn build(self) -> ParsedMessage {
        ParsedMessage {
            subject: self.subject,
            parts: self.parts,
        }
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CycleSettings`.
pub struct SettingsBuilder {
    settings: CycleSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: CycleSettings {
                keyword: None,
                delete_after_read: false,
                queue: "Office".to_string(),
                job_label: "mailprint".to_string(),
                poll_interval: Duration::from_millis(10),
            },
        }
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.settings.keyword = Some(keyword.to_string());
        self
    }

    pub fn delete_after_read(mut self) -> Self {
        self.settings.delete_after_read = true;
        self
    }

    pub fn queue(mut self, queue: &str) -> Self {
        self.settings.queue = queue.to_string();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    pub fn build(self) -> CycleSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
