//! Interface lookup over a parsed agent record.

use afm_types::agent::AgentRecord;
use afm_types::error::AfmError;
use afm_types::interface::{
    ConsoleChatInterface, Interface, InterfaceKind, WebChatInterface, WebhookInterface,
};

/// Declared interfaces, or a single console chat when none are declared.
pub fn interfaces(record: &AgentRecord) -> Vec<Interface> {
    match &record.metadata.interfaces {
        Some(list) if !list.is_empty() => list.clone(),
        _ => vec![Interface::ConsoleChat(ConsoleChatInterface::default())],
    }
}

/// The first interface of `kind`.
pub fn interface_of(record: &AgentRecord, kind: InterfaceKind) -> Result<Interface, AfmError> {
    let all = interfaces(record);
    if let Some(found) = all.iter().find(|i| i.kind() == kind) {
        return Ok(found.clone());
    }
    let available = all
        .iter()
        .map(|i| i.kind().as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(AfmError::InterfaceNotFound {
        requested: kind.to_string(),
        available,
    })
}

/// At most one interface of each kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceSet {
    pub consolechat: Option<ConsoleChatInterface>,
    pub webchat: Option<WebChatInterface>,
    pub webhook: Option<WebhookInterface>,
}

impl InterfaceSet {
    pub fn has_http(&self) -> bool {
        self.webchat.is_some() || self.webhook.is_some()
    }
}

/// Group interfaces by kind, rejecting duplicates.
pub fn split_interfaces(record: &AgentRecord) -> Result<InterfaceSet, AfmError> {
    let mut set = InterfaceSet::default();
    for interface in interfaces(record) {
        let kind = interface.kind();
        let duplicate = match interface {
            Interface::ConsoleChat(i) => set.consolechat.replace(i).is_some(),
            Interface::WebChat(i) => set.webchat.replace(i).is_some(),
            Interface::Webhook(i) => set.webhook.replace(i).is_some(),
        };
        if duplicate {
            return Err(AfmError::Validation(format!(
                "multiple interfaces of type '{kind}' are not supported"
            )));
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use afm_types::agent::AgentMetadata;

    fn record(interfaces: Option<Vec<Interface>>) -> AgentRecord {
        AgentRecord {
            metadata: AgentMetadata {
                interfaces,
                ..AgentMetadata::default()
            },
            ..AgentRecord::default()
        }
    }

    #[test]
    fn test_defaults_to_console_chat() {
        let all = interfaces(&record(None));
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind(), InterfaceKind::ConsoleChat);
        assert_eq!(interfaces(&record(Some(vec![]))).len(), 1);
    }

    #[test]
    fn test_interface_of_reports_available() {
        let rec = record(Some(vec![Interface::WebChat(WebChatInterface::default())]));
        assert!(interface_of(&rec, InterfaceKind::WebChat).is_ok());

        let err = interface_of(&rec, InterfaceKind::Webhook).unwrap_err();
        match err {
            AfmError::InterfaceNotFound {
                requested,
                available,
            } => {
                assert_eq!(requested, "webhook");
                assert_eq!(available, "webchat");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_split_interfaces() {
        let rec = record(Some(vec![
            Interface::ConsoleChat(ConsoleChatInterface::default()),
            Interface::WebChat(WebChatInterface::default()),
        ]));
        let set = split_interfaces(&rec).unwrap();
        assert!(set.consolechat.is_some());
        assert!(set.webchat.is_some());
        assert!(set.webhook.is_none());
        assert!(set.has_http());
    }

    #[test]
    fn test_split_rejects_duplicates() {
        let rec = record(Some(vec![
            Interface::WebChat(WebChatInterface::default()),
            Interface::WebChat(WebChatInterface::default()),
        ]));
        let err = split_interfaces(&rec).unwrap_err();
        assert!(err.to_string().contains("webchat"));
    }
}
