pub const DOCUMENT_EVENTS_TOPIC: &str = "document-events";
pub const FOLDER_EVENTS_TOPIC: &str = "folder-events";
pub const GENERAL_EVENTS_TOPIC: &str = "general-events";

/// The closed set of event types this system emits.
pub const SUPPORTED_EVENT_TYPES: &[&str] = &[
    "document.uploaded",
    "document.processed",
    "document.quarantined",
    "document.failed",
    "document.downloaded",
    "document.deleted",
    "folder.created",
    "folder.updated",
    "folder.deleted",
];

/// Routes an event type to its topic by dotted prefix: `document.*` to
/// `document-events`, `folder.*` to `folder-events`, everything else to
/// `general-events`.
#[must_use]
pub fn topic_for(event_type: &str) -> &'static str {
    if event_type.starts_with("document.") {
        DOCUMENT_EVENTS_TOPIC
    } else if event_type.starts_with("folder.") {
        FOLDER_EVENTS_TOPIC
    } else {
        GENERAL_EVENTS_TOPIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_document_events() {
        assert_eq!(topic_for("document.processed"), DOCUMENT_EVENTS_TOPIC);
    }

    #[test]
    fn routes_folder_events() {
        assert_eq!(topic_for("folder.created"), FOLDER_EVENTS_TOPIC);
    }

    #[test]
    fn routes_unknown_prefixes_to_general() {
        assert_eq!(topic_for("tenant.suspended"), GENERAL_EVENTS_TOPIC);
    }
}
