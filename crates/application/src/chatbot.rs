//! 聊天机器人插话
//!
//! 每条聊天消息之后有一定概率在延迟后广播一句台词，
//! 提到 "chatbot" 时概率更高。

/// 台词来源
pub trait Sentences: Send + Sync {
    fn sentences(&self) -> Vec<String>;
}

/// `%user` 会被替换为触发者的名字
const DEFAULT_SENTENCES: &[&str] = &[
    "Did somebody call me, %user?",
    "I'm listening, %user. I'm always listening.",
    "%user, have you tried turning it off and on again?",
    "Beep boop. I agree with %user.",
    "Interesting point %user, tell me more.",
    "Nobody asked for my opinion, but here it is: %user is right.",
    "Hmm... %user, are you sure about that?",
    "I was about to say the same thing, %user!",
    "Roses are red, bots are blue, %user is typing, and so am I too.",
    "Please keep it civil, %user :)",
];

#[derive(Debug, Default)]
pub struct DefaultSentences;

impl Sentences for DefaultSentences {
    fn sentences(&self) -> Vec<String> {
        DEFAULT_SENTENCES.iter().map(|s| s.to_string()).collect()
    }
}

/// 提到机器人时的插话概率分母
pub const TRIGGERED_ODDS: i64 = 5;
/// 普通消息的插话概率分母
pub const AMBIENT_ODDS: i64 = 400;

pub fn interjection_odds(text: &str) -> i64 {
    if text.to_lowercase().contains("chatbot") {
        TRIGGERED_ODDS
    } else {
        AMBIENT_ODDS
    }
}

/// 只替换第一个 `%user`
pub fn compose_line(template: &str, user: &str) -> String {
    template.replacen("%user", user, 1)
}
