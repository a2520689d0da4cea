//! HTML chat-bubble templates and renderers.
//!
//! Two message templates ("bot" and "user") each contain exactly one
//! [`PLACEHOLDER`]; [`CSS_TEMPLATE`] is the shared stylesheet. Content is
//! substituted verbatim: escaping is left to the rendering surface.

use crate::models::Turn;

/// The substitution token inside each message template.
pub const PLACEHOLDER: &str = "{{MSG}}";

pub const CSS_TEMPLATE: &str = r#"
<style>
.chat-message {
    padding: 1.5rem; border-radius: 0.5rem; margin-bottom: 1rem; display: flex
}
.chat-message.user {
    background-color: #2b313e
}
.chat-message.bot {
    background-color: #475063
}
.chat-message .avatar {
  width: 20%;
}
.chat-message .avatar img {
  max-width: 78px;
  max-height: 78px;
  border-radius: 50%;
  object-fit: cover;
}
.chat-message .message {
  width: 80%;
  padding: 0 1.5rem;
  color: #fff;
}
</style>
"#;

pub const BOT_TEMPLATE: &str = r#"
<div class="chat-message bot" style="display: flex; align-items: center;">
    <div class="avatar">
        <img src="https://t4.ftcdn.net/jpg/04/46/38/69/360_F_446386956_DiOrdcxDFWKWFuzVUCugstxz0zOGMHnA.jpg" style="max-height: 78px; max-width: 78px; border-radius: 50%; object-fit: cover;">
    </div>
    <div class="message">{{MSG}}</div>
</div>
"#;

pub const USER_TEMPLATE: &str = r#"
<div class="chat-message user" style="display: flex; align-items: center;">
    <div class="avatar">
        <img src="https://e7.pngegg.com/pngimages/178/595/png-clipart-user-profile-computer-icons-login-user-avatars-monochrome-black.png">
    </div>
    <div class="message">{{MSG}}</div>
</div>
"#;

/// Who a message block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    pub fn template(self) -> &'static str {
        match self {
            Speaker::User => USER_TEMPLATE,
            Speaker::Bot => BOT_TEMPLATE,
        }
    }
}

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    pub speaker: Speaker,
    pub html: String,
}

/// Substitute `content` into `template`'s placeholder.
pub fn render_message(template: &str, content: &str) -> String {
    template.replacen(PLACEHOLDER, content, 1)
}

/// Render one bubble for `speaker`.
pub fn block(speaker: Speaker, content: &str) -> MessageBlock {
    MessageBlock {
        speaker,
        html: render_message(speaker.template(), content),
    }
}

/// Recover the content substituted into `template` by stripping the
/// wrapper markup on both sides of the placeholder.
///
/// Returns `None` if `rendered` was not produced from `template`.
pub fn extract_message<'a>(rendered: &'a str, template: &str) -> Option<&'a str> {
    let (prefix, suffix) = template.split_once(PLACEHOLDER)?;
    let inner = rendered.strip_prefix(prefix)?.strip_suffix(suffix)?;
    Some(inner)
}

/// Render a chat history most-recent-first: one (user, bot) pair per turn,
/// stepping backward through the turns.
pub fn render_history(turns: &[Turn]) -> Vec<MessageBlock> {
    turns
        .iter()
        .rev()
        .flat_map(|turn| {
            [
                block(Speaker::User, &turn.question),
                block(Speaker::Bot, &turn.answer),
            ]
        })
        .collect()
}

/// Render (question, answer) pairs in their natural order.
pub fn render_pairs<Q: AsRef<str>, A: AsRef<str>>(pairs: &[(Q, A)]) -> Vec<MessageBlock> {
    pairs
        .iter()
        .flat_map(|(q, a)| {
            [
                block(Speaker::User, q.as_ref()),
                block(Speaker::Bot, a.as_ref()),
            ]
        })
        .collect()
}
