//! History-aware random partitioning of eligible participants.
//!
//! # Responsibility
//! - Partition an eligible list into disjoint groups of two or three.
//! - Prefer pairs whose canonical key is absent from history.
//!
//! # Invariants
//! - Every input email lands in exactly one group; groups hold 2 or 3 emails,
//!   except a lone participant (n = 1) who forms a group of one.
//! - 0 participants yield no groups; 1..=3 yield one group with everyone.
//! - Only 2-member candidates are checked against history. The final group
//!   of 2 or 3 is taken as-is.
//! - The retry budget is spent per anchor and is never shared across anchors.
//! - The engine never mutates history and performs no I/O beyond diagnostics.

use crate::model::participant::Participant;
use crate::pairing::key::encode_key;
use crate::pairing::random::{index_for, RandomSource};
use log::warn;
use std::collections::HashSet;

/// Number of partner draws per anchor before accepting a repeat.
pub const MAX_PAIRING_TRIES: u32 = 20;

/// Largest remainder emitted as one final group.
const FINAL_GROUP_MAX: usize = 3;

/// One emitted group, emails in canonical (lexicographic) order.
pub type Group = Vec<String>;

/// Result of one bounded partner search for an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerDraw {
    /// Pool index of a partner whose pairing is not in history.
    Novel(usize),
    /// Every draw collided; pool index of the last candidate drawn.
    Exhausted(usize),
}

impl PartnerDraw {
    /// Pool index of the accepted partner, novel or not.
    pub fn index(self) -> usize {
        match self {
            Self::Novel(index) | Self::Exhausted(index) => index,
        }
    }
}

/// Output of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingOutcome {
    /// Disjoint groups in the order they were formed.
    pub groups: Vec<Group>,
    /// Canonical keys of pairs accepted although history already held them.
    pub repeated_keys: Vec<String>,
}

impl PairingOutcome {
    /// Canonical keys of all groups, in group order.
    pub fn keys(&self) -> Vec<String> {
        self.groups.iter().map(|group| encode_key(group)).collect()
    }

    /// Whether every pair avoided history.
    pub fn is_fully_novel(&self) -> bool {
        self.repeated_keys.is_empty()
    }
}

/// Tunables for the partitioning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingOptions {
    /// Partner draws per anchor; values below 1 are treated as 1.
    pub max_tries: u32,
}

impl Default for PairingOptions {
    fn default() -> Self {
        Self {
            max_tries: MAX_PAIRING_TRIES,
        }
    }
}

/// Partitions `participants` into groups of 2-3, avoiding `history` pairs.
///
/// `participants` should already be shuffled: the first remaining participant
/// is always the anchor that gets a partner drawn for it.
pub fn random_unique_pairing<R: RandomSource + ?Sized>(
    history: &HashSet<String>,
    participants: &[Participant],
    rng: &mut R,
) -> PairingOutcome {
    random_unique_pairing_with(history, participants, rng, PairingOptions::default())
}

/// Same as [`random_unique_pairing`] with explicit options.
pub fn random_unique_pairing_with<R: RandomSource + ?Sized>(
    history: &HashSet<String>,
    participants: &[Participant],
    rng: &mut R,
    options: PairingOptions,
) -> PairingOutcome {
    let mut outcome = PairingOutcome::default();
    if participants.is_empty() {
        return outcome;
    }

    // Reversed so the anchor pops off the end and pool position `i`
    // (counted from the anchor side) lives at `remaining[len - 1 - i]`.
    let mut remaining: Vec<&str> = participants
        .iter()
        .rev()
        .map(|participant| participant.email.as_str())
        .collect();

    while remaining.len() > FINAL_GROUP_MAX {
        let Some(anchor) = remaining.pop() else {
            break;
        };

        let draw = draw_partner(history, anchor, &remaining, rng, options.max_tries);
        let partner = remaining.swap_remove(remaining.len() - 1 - draw.index());
        let key = encode_key(&[anchor, partner]);

        if let PartnerDraw::Exhausted(_) = draw {
            warn!(
                "event=pairing_retry_exhausted module=engine status=repeated tries={} key={}",
                options.max_tries.max(1),
                key
            );
            outcome.repeated_keys.push(key);
        }

        outcome.groups.push(canonical_group([anchor, partner]));
    }

    outcome.groups.push(canonical_group(remaining));
    outcome
}

/// Draws partners for `anchor` until one is novel or the budget runs out.
///
/// `remaining` is the pool in reversed order; the returned index counts from
/// the anchor side, i.e. it addresses the pool in its original order.
fn draw_partner<R: RandomSource + ?Sized>(
    history: &HashSet<String>,
    anchor: &str,
    remaining: &[&str],
    rng: &mut R,
    max_tries: u32,
) -> PartnerDraw {
    let pool_len = remaining.len();
    let mut last = 0;

    for _ in 0..max_tries.max(1) {
        let index = index_for(rng.next_unit(), pool_len);
        let candidate = remaining[pool_len - 1 - index];
        if !history.contains(&encode_key(&[anchor, candidate])) {
            return PartnerDraw::Novel(index);
        }
        last = index;
    }

    PartnerDraw::Exhausted(last)
}

fn canonical_group<'a>(emails: impl IntoIterator<Item = &'a str>) -> Group {
    let mut group: Group = emails.into_iter().map(str::to_string).collect();
    group.sort_unstable();
    group
}

#[cfg(test)]
mod tests {
    use super::{
        draw_partner, random_unique_pairing, random_unique_pairing_with, PairingOptions,
        PartnerDraw,
    };
    use crate::model::participant::Participant;
    use crate::pairing::random::ScriptedRandom;
    use std::collections::HashSet;

    fn people(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|name| Participant::new(*name, format!("{name}@gmail.com")))
            .collect()
    }

    #[test]
    fn draw_partner_reports_novel_index_in_pool_order() {
        // Reversed pool for [bar, bam, baz].
        let remaining = ["baz@gmail.com", "bam@gmail.com", "bar@gmail.com"];
        let mut rng = ScriptedRandom::new([0.1], 0.5);
        let draw = draw_partner(&HashSet::new(), "foo@gmail.com", &remaining, &mut rng, 20);
        assert_eq!(draw, PartnerDraw::Novel(0));
    }

    #[test]
    fn draw_partner_spends_exactly_the_budget_before_giving_up() {
        let remaining = ["bar@gmail.com"];
        let history = HashSet::from(["bar@gmail.com,foo@gmail.com".to_string()]);
        let mut rng = ScriptedRandom::new(vec![0.3; 5], 0.9);

        let draw = draw_partner(&history, "foo@gmail.com", &remaining, &mut rng, 3);

        assert_eq!(draw, PartnerDraw::Exhausted(0));
        assert_eq!(rng.remaining(), 2);
    }

    #[test]
    fn zero_budget_still_draws_once() {
        let participants = people(&["foo", "bar", "bam", "baz"]);
        let mut rng = ScriptedRandom::new([0.9], 0.0);
        let outcome = random_unique_pairing_with(
            &HashSet::new(),
            &participants,
            &mut rng,
            PairingOptions { max_tries: 0 },
        );
        assert_eq!(outcome.groups[0], vec!["baz@gmail.com", "foo@gmail.com"]);
    }

    #[test]
    fn five_participants_end_with_a_triple() {
        let participants = people(&["a", "b", "c", "d", "e"]);
        let mut rng = ScriptedRandom::new([0.0], 0.0);
        let outcome = random_unique_pairing(&HashSet::new(), &participants, &mut rng);

        assert_eq!(outcome.groups.len(), 2);
        assert_eq!(outcome.groups[0], vec!["a@gmail.com", "b@gmail.com"]);
        assert_eq!(
            outcome.groups[1],
            vec!["c@gmail.com", "d@gmail.com", "e@gmail.com"]
        );
    }
}
