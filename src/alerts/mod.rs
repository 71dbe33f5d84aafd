/// Webhook payload construction
pub mod payload;

/// HTTP delivery of serialized payloads
pub mod webhook;

/// Entry screening, payload building and delivery with retry
pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use payload::{Attachment, WebhookPayload};
pub use webhook::{HttpWebhook, WebhookSink};
