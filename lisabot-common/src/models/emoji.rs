use serde::{Deserialize, Serialize};

/// A guild's custom emoji, as listed in its emoji catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildEmoji {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

impl GuildEmoji {
    /// The inline token that renders this emoji in a message body.
    pub fn token(&self) -> String {
        if self.animated {
            format!("<a:{}:{}>", self.name, self.id)
        } else {
            format!("<:{}:{}>", self.name, self.id)
        }
    }

    /// Whether a classifier label names this emoji. Colons and case are ignored,
    /// so `:Pog:` matches an emoji called `pog`.
    pub fn matches_label(&self, label: &str) -> bool {
        let wanted = label.replace(':', "");
        !wanted.is_empty() && self.name.eq_ignore_ascii_case(&wanted)
    }
}
