//! Invitation message composition.
//!
//! # Responsibility
//! - Build subject and body for one group from roster snapshots.
//! - Merge timezones and topics without repeats.
//!
//! # Invariants
//! - Names, recipients and merged lists follow the group's canonical email order.
//! - Retort and joke selection consume exactly one draw each.

use crate::model::participant::Participant;
use crate::notify::OutgoingMessage;
use crate::pairing::dedup::uniqify;
use crate::pairing::key::decode_key;
use crate::pairing::random::{choose, RandomSource};

/// Sender display name used when config does not override it.
pub const DEFAULT_SENDER_NAME: &str = "Coffeebot";

const COFFEE_JOKES: &[&str] = &[
    "Barista: How do you take your coffee?\nMe: Very, very seriously.",
    "Q: Where do birds go for coffee?\nA: To the NESTcafe",
    "Q: What's the opposite of coffee?\nA: Sneezy.",
    "Q: What do you call it when you walk into a cafe you're sure you've been to before?\nA: Deja brew",
    "Q: Why should you be wary of 5-cent espresso?\nA: It's a cheap shot.",
    "Q: Why did the espresso keep checking his watch?\nA: Because he was pressed for time.",
    "Drinking too much espresso can cause a latte problems.",
];

const NOT_A_COFFEE_PERSON: &[&str] = &[
    "Don't tell that to coffeebot :( Just keep it to yourself okay?",
    "Don't let coffeebot tell you how to lead your life, you just follow your heart, okay?",
    "Me either. Just drink some other liquid!",
    "Don't worry, no one can tell what you're drinking over video calls!",
];

/// Composes the invitation for one group.
///
/// `members` must already be in canonical email order.
pub fn compose_message<R: RandomSource + ?Sized>(
    members: &[Participant],
    sender_name: &str,
    rng: &mut R,
) -> OutgoingMessage {
    let names: Vec<&str> = members.iter().map(|member| member.name.as_str()).collect();
    let all_names = names.join(" & ");
    let all_timezones = uniqify(members.iter().map(|member| member.timezone.clone())).join(", ");
    let all_topics = uniqify(members.iter().flat_map(Participant::topic_list)).join(", ");
    let retort = choose(NOT_A_COFFEE_PERSON, rng).copied().unwrap_or_default();
    let joke = choose(COFFEE_JOKES, rng).copied().unwrap_or_default();

    let body = format!(
        "Hey {all_names}!\n\
         \n\
         You're invited to chat over coffee this week!\n\
         \n\
         Don't like coffee? {retort}\n\
         \n\
         When scheduling a time to chat, please mind everyone's timezones, which are: {all_timezones}\n\
         \n\
         What should you talk about? Well that's up to you, but maybe you could talk about: {all_topics}\n\
         \n\
         P.S.\n\
         {joke}\n\
         \n\
         Happy chatting!\n\
         {sender_name}\n"
    );

    OutgoingMessage {
        sender_name: sender_name.to_string(),
        recipients: members.iter().map(|member| member.email.clone()).collect(),
        subject: format!("Coffee Time with {all_names}!"),
        body,
    }
}

/// Orders `group_key` members by canonical email order, looking each one up.
///
/// Returns the first email `lookup` cannot resolve as the error.
pub fn resolve_members<F>(group_key: &str, mut lookup: F) -> Result<Vec<Participant>, String>
where
    F: FnMut(&str) -> Option<Participant>,
{
    decode_key(group_key)
        .into_iter()
        .map(|email| lookup(&email).ok_or(email))
        .collect()
}
