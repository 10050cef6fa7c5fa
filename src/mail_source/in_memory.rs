use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::InboundMessage;
use super::MailSource;
use super::MailSourceError;

/// In-process `MailSource` for tests and the SHADOW-phase demo harness.
/// Messages are seeded up front; `list_new` filters out anything already
/// marked consumed.
#[derive(Debug, Default)]
pub struct InMemoryMailSource {
    messages: Mutex<Vec<InboundMessage>>,
    consumed: Mutex<HashSet<String>>,
}

impl InMemoryMailSource {
    pub fn new(messages: Vec<InboundMessage>) -> Self {
        Self { messages: Mutex::new(messages), consumed: Mutex::new(HashSet::new()) }
    }

    pub fn push(&self, message: InboundMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

#[async_trait]
impl MailSource for InMemoryMailSource {
    async fn list_new(&self) -> Result<Vec<InboundMessage>, MailSourceError> {
        let consumed = self.consumed.lock().unwrap();
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !consumed.contains(&m.source_message_id))
            .cloned()
            .collect())
    }

    async fn mark_consumed(&self, source_message_id: &str) -> Result<(), MailSourceError> {
        self.consumed.lock().unwrap().insert(source_message_id.to_string());
        Ok(())
    }

    async fn fetch_attachment(
        &self,
        source_message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, MailSourceError> {
        let messages = self.messages.lock().unwrap();
        let message = messages
            .iter()
            .find(|m| m.source_message_id == source_message_id)
            .ok_or_else(|| MailSourceError::Permanent("unknown message".into()))?;
        if message.attachments.iter().any(|a| a.attachment_id == attachment_id) {
            Ok(Vec::new())
        } else {
            Err(MailSourceError::Permanent("unknown attachment".into()))
        }
    }
}
