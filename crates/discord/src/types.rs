use serde::{Deserialize, Serialize};

/// Body of the deferred-interaction edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionReply {
    /// Message text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Rich embed objects. Up to 10 embeds per message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
}

/// A rich embed for message formatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Embed color as a decimal integer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<EmbedField>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

/// A field within an embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

/// Footer for an embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_serializes_embeds_only() {
        let reply = InteractionReply {
            content: None,
            embeds: Some(vec![Embed {
                title: Some("Match analysis".into()),
                description: Some("You played well.".into()),
                color: Some(5_763_719),
                fields: Some(vec![EmbedField {
                    name: "Overall".into(),
                    value: "78.4".into(),
                    inline: Some(true),
                }]),
                footer: Some(EmbedFooter {
                    text: "scores v1".into(),
                }),
            }]),
        };

        let json = serde_json::to_value(&reply).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["embeds"][0]["title"], "Match analysis");
        assert_eq!(json["embeds"][0]["fields"][0]["value"], "78.4");
    }

    #[test]
    fn empty_optionals_are_omitted() {
        let json = serde_json::to_value(Embed::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
