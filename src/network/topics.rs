use libp2p::gossipsub::IdentTopic;

const CHAT_PREFIX: &str = "/topic/chat/";
const STREAMS_PREFIX: &str = "/topic/streams/";
const VIEWERS_SUFFIX: &str = "/viewers";

/// A gossipsub topic this client understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomTopic {
    Chat(String),
    Viewers(String),
}

pub fn chat_topic(stream_id: &str) -> IdentTopic {
    IdentTopic::new(format!("{CHAT_PREFIX}{stream_id}"))
}

pub fn viewers_topic(stream_id: &str) -> IdentTopic {
    IdentTopic::new(format!("{STREAMS_PREFIX}{stream_id}{VIEWERS_SUFFIX}"))
}

/// Maps a raw topic string back to its room. Identity topics hash to the
/// topic string itself, so this works on `TopicHash::as_str` too.
pub fn parse_topic(raw: &str) -> Option<RoomTopic> {
    if let Some(stream_id) = raw.strip_prefix(CHAT_PREFIX) {
        return valid_id(stream_id).map(RoomTopic::Chat);
    }

    raw.strip_prefix(STREAMS_PREFIX)
        .and_then(|rest| rest.strip_suffix(VIEWERS_SUFFIX))
        .and_then(valid_id)
        .map(RoomTopic::Viewers)
}

fn valid_id(stream_id: &str) -> Option<String> {
    if stream_id.is_empty() || stream_id.contains('/') {
        None
    } else {
        Some(stream_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_follow_room_layout() {
        assert_eq!(chat_topic("42").to_string(), "/topic/chat/42");
        assert_eq!(viewers_topic("42").to_string(), "/topic/streams/42/viewers");
    }

    #[test]
    fn parses_own_topic_hashes() {
        let chat = chat_topic("abc").hash();
        let viewers = viewers_topic("abc").hash();

        assert_eq!(parse_topic(chat.as_str()), Some(RoomTopic::Chat("abc".into())));
        assert_eq!(
            parse_topic(viewers.as_str()),
            Some(RoomTopic::Viewers("abc".into()))
        );
    }

    #[test]
    fn ignores_foreign_topics() {
        assert_eq!(parse_topic("rust-p2p-chat-global"), None);
        assert_eq!(parse_topic("/topic/chat/"), None);
        assert_eq!(parse_topic("/topic/chat/a/b"), None);
        assert_eq!(parse_topic("/topic/streams/abc/likes"), None);
    }
}
