use crate::config::Presentation;
use crate::events::LogEntry;
use serde::Serialize;

/// JSON document posted to the webhook
///
/// Attachment mode fills `attachments` and leaves `text` unset; plain mode does
/// the opposite. Unset fields are omitted from the serialized document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Colored sidebar attachment holding the entry body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    /// One-line summary for clients that cannot render attachments
    pub fallback: String,
    pub color: String,
    pub pretext: String,
    pub text: String,
}

impl WebhookPayload {
    pub fn build(entry: &LogEntry, presentation: &Presentation) -> Self {
        if presentation.attach {
            Self::attachment(entry, presentation)
        } else {
            Self::plain(entry, presentation)
        }
    }

    fn attachment(entry: &LogEntry, presentation: &Presentation) -> Self {
        let attachment = Attachment {
            fallback: format!(
                "New log entry in {}. \n{}\n[...]{}\n",
                entry.file,
                entry.first_line(),
                entry.last_line()
            ),
            color: presentation.color.clone(),
            pretext: format!("{} New log entry in {}", presentation.prefix, entry.file),
            text: format!("  {}", entry.lines.join("\n  ")),
        };

        Self {
            username: presentation.username.clone(),
            text: None,
            attachments: vec![attachment],
        }
    }

    fn plain(entry: &LogEntry, presentation: &Presentation) -> Self {
        let text = format!(
            "{} New log entry in {}\n```{}\n{}\n```",
            presentation.prefix,
            entry.file,
            presentation.syntax,
            entry.lines.join("\n")
        );

        Self {
            username: presentation.username.clone(),
            text: Some(text),
            attachments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogLine;
    use serde_json::json;
    use std::sync::Arc;

    fn entry(lines: &[&str]) -> LogEntry {
        LogEntry::from_lines(
            Arc::from("/var/log/app.log"),
            lines.iter().map(|l| LogLine::new(*l)).collect(),
        )
        .unwrap()
    }

    fn presentation(attach: bool) -> Presentation {
        Presentation {
            username: "logbot".to_string(),
            prefix: ":fire:".to_string(),
            color: "#00FF00".to_string(),
            syntax: "java".to_string(),
            attach,
        }
    }

    #[test]
    fn test_attachment_payload_shape() {
        let payload = WebhookPayload::build(
            &entry(&["ERROR boom", "  at a", "  at b"]),
            &presentation(true),
        );

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "username": "logbot",
                "attachments": [{
                    "fallback": "New log entry in /var/log/app.log. \nERROR boom\n[...]  at b\n",
                    "color": "#00FF00",
                    "pretext": ":fire: New log entry in /var/log/app.log",
                    "text": "  ERROR boom\n    at a\n    at b",
                }]
            })
        );
    }

    #[test]
    fn test_plain_payload_shape() {
        let payload =
            WebhookPayload::build(&entry(&["ERROR boom", "  at a"]), &presentation(false));

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "username": "logbot",
                "text": ":fire: New log entry in /var/log/app.log\n```java\nERROR boom\n  at a\n```",
            })
        );
    }

    #[test]
    fn test_plain_payload_without_syntax() {
        let mut p = presentation(false);
        p.syntax = String::new();
        let payload = WebhookPayload::build(&entry(&["one line"]), &p);
        assert_eq!(
            payload.text.as_deref(),
            Some(":fire: New log entry in /var/log/app.log\n```\none line\n```")
        );
        assert!(payload.attachments.is_empty());
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let payload = WebhookPayload::build(
            &entry(&[r#"msg="quoted" \ path"#, "tab\there"]),
            &presentation(false),
        );
        let json = serde_json::to_string(&payload).unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(back["text"]
            .as_str()
            .unwrap()
            .contains(r#"msg="quoted" \ path"#));
    }
}
