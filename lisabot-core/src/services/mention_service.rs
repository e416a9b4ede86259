// File: lisabot-core/src/services/mention_service.rs

use crate::random::RandomSource;

/// Result of looking for the bot's own mention in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressing {
    pub mentioned: bool,
    /// The text the rest of the pipeline works on: mention tokens stripped and trimmed
    /// when mentioned, the raw content otherwise.
    pub operative_text: String,
}

/// Finds references to the bot in message text.
#[derive(Debug, Clone)]
pub struct MentionDetector {
    plain: String,
    structured: [String; 2],
}

impl MentionDetector {
    pub fn new(bot_id: u64) -> Self {
        Self {
            plain: format!("@{bot_id}"),
            structured: [format!("<@{bot_id}>"), format!("<@!{bot_id}>")],
        }
    }

    pub fn is_mentioned(&self, text: &str) -> bool {
        text.contains(self.plain.as_str()) || self.structured.iter().any(|m| text.contains(m.as_str()))
    }

    pub fn inspect(&self, text: &str) -> Addressing {
        if !self.is_mentioned(text) {
            return Addressing { mentioned: false, operative_text: text.to_string() };
        }
        let mut cleaned = text.to_string();
        for token in &self.structured {
            cleaned = cleaned.replace(token.as_str(), "");
        }
        Addressing { mentioned: true, operative_text: cleaned.trim().to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikertCategory {
    StrongAgree,
    Agree,
    Neutral,
    Disagree,
    StrongDisagree,
}

impl LikertCategory {
    pub const ALL: [LikertCategory; 5] = [
        LikertCategory::StrongAgree,
        LikertCategory::Agree,
        LikertCategory::Neutral,
        LikertCategory::Disagree,
        LikertCategory::StrongDisagree,
    ];

    fn phrases(self) -> &'static [&'static str] {
        match self {
            LikertCategory::StrongAgree => &["YES", "YESSSS", "Absolutely!"],
            LikertCategory::Agree => &[
                "yes",
                "yessir",
                "ya",
                "shut up yes",
                "https://tenor.com/view/kkekekekekkeke-kk-gif-27232250",
            ],
            LikertCategory::Neutral => &[
                "I actually dont know",
                "um duh",
                "period",
                "not rn",
                "lol",
                "I wish I could tell you but I don't want to",
                "AYO????",
                "https://cdn.discordapp.com/attachments/1113266262345273428/1213985020901851146/IMG_7578.png?ex=65f776a7&is=65e501a7&hm=20b5210081b1362c97ca5a5fd5dd02dd33f15b2da783cc44aab2fa1a670d6878&",
            ],
            LikertCategory::Disagree => &["nope", "ewww no", "naurrr", "joever"],
            LikertCategory::StrongDisagree => &["WHAT NO", "NO", "Absolutely not!!!"],
        }
    }
}

/// Answer given to a bare "?".
pub const BARE_QUESTION_ANSWER: &str = "?";

/// Opinionated answers to yes/no questions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LikertResponder;

impl LikertResponder {
    /// Every phrase the responder can produce.
    pub fn all_phrases() -> impl Iterator<Item = &'static str> {
        LikertCategory::ALL.into_iter().flat_map(|c| c.phrases().iter().copied())
    }

    /// Returns an answer when `text` reads as a question, `None` otherwise.
    /// Category first, then phrase, each drawn uniformly.
    pub fn answer(&self, text: &str, rng: &mut dyn RandomSource) -> Option<String> {
        let text = text.trim();
        if !text.ends_with('?') {
            return None;
        }
        if text.chars().count() <= 1 {
            return Some(BARE_QUESTION_ANSWER.to_string());
        }
        let category = LikertCategory::ALL[rng.pick(LikertCategory::ALL.len())];
        let phrases = category.phrases();
        Some(phrases[rng.pick(phrases.len())].to_string())
    }
}
