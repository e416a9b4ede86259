// File: lisabot-core/src/services/trigger_service.rs

use std::fmt;
use tracing::debug;

type ResponseProducer = Box<dyn Fn() -> String + Send + Sync>;

/// A keyword and the canned response it produces.
pub struct Trigger {
    pub keyword: String,
    respond: ResponseProducer,
}

impl Trigger {
    pub fn new<F>(keyword: impl Into<String>, respond: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self { keyword: keyword.into(), respond: Box::new(respond) }
    }

    /// A trigger that always answers with the same text.
    pub fn canned(keyword: impl Into<String>, response: impl Into<String>) -> Self {
        let response = response.into();
        Self::new(keyword, move || response.clone())
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger").field("keyword", &self.keyword).finish_non_exhaustive()
    }
}

/// Ordered list of keyword triggers. Matching is a case-sensitive substring test and,
/// when several keywords occur in one message, the last one in table order wins.
#[derive(Debug, Default)]
pub struct TriggerTable {
    triggers: Vec<Trigger>,
}

impl TriggerTable {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }

    /// Returns the canned reply for `text`, or `None` when nothing matched or the
    /// matching producer returned an empty string.
    pub fn respond_to(&self, text: &str) -> Option<String> {
        let mut reply = String::new();
        for trigger in &self.triggers {
            if text.contains(trigger.keyword.as_str()) {
                debug!("Trigger keyword '{}' matched", trigger.keyword);
                reply = (trigger.respond)();
            }
        }
        if reply.is_empty() { None } else { Some(reply) }
    }

    /// The stock set of in-jokes.
    pub fn builtin() -> Self {
        Self::new(vec![
            Trigger::canned(
                "erm actually",
                "https://tenor.com/view/nerd-dog-nerd-dog-gif-nerd-dog-alen-orbanic-gif-15562966513664309472",
            ),
            Trigger::canned(
                "lisa burger",
                "https://media.discordapp.net/attachments/1113266262345273428/1187365137598922802/imageedit_9_9053779888.png?ex=65969ef4&is=658429f4&hm=8ea4ed39282ce942d2556cced752afcc23353607d02a60e7b5119a4ac9c8e43f&=&format=webp&quality=lossless&width=462&height=462",
            ),
            Trigger::canned(
                "in my opinion",
                "https://cdn.discordapp.com/attachments/1168400523104358442/1193073645715734578/y147cc9pwqac1.png?ex=65ab636b&is=6598ee6b&hm=c081a2716fbb8415c6a8be0d8ad8fa24fbfa639a5d97d0d673b15c65e2b984ca&",
            ),
            Trigger::canned("are you the real lisa?", "I am the real Lisa"),
            Trigger::canned(
                "fortnite blake",
                "https://tenor.com/view/fortnite-fish-guy-fortnite-wow-gif-27449064",
            ),
            Trigger::canned(
                "ramesh",
                "https://tenor.com/view/sleeping-sleep-dog-dawg-eeper-gif-5083970977419902566",
            ),
            Trigger::canned(
                "too powerful",
                "https://cdn.discordapp.com/emojis/853892024879808513.gif?size=128&quality=lossless",
            ),
        ])
    }
}
