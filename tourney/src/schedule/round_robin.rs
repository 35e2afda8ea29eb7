//! Round robin pairing generation using the circle method.

use serde::{Deserialize, Serialize};

/// Two competitors meeting in one match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing<T> {
    pub home: T,
    pub visitor: T,
}

impl<T: PartialEq> Pairing<T> {
    pub fn new(home: T, visitor: T) -> Self {
        Self { home, visitor }
    }

    /// Whether the two pairings have a competitor in common
    pub fn shares_competitor(&self, other: &Pairing<T>) -> bool {
        self.home == other.home
            || self.home == other.visitor
            || self.visitor == other.home
            || self.visitor == other.visitor
    }
}

/// Minimum competitor count for the anti-adjacency pass
const ANTI_ADJACENCY_MIN_COMPETITORS: usize = 5;

/// Generate a complete round robin for the competitors, in seeding order.
///
/// Every competitor meets every other competitor exactly once, so `n`
/// competitors yield `n * (n - 1) / 2` pairings. Pairings are returned in
/// round order, then in order within the round. For more than four
/// competitors the sequence is passed through [`reduce_adjacency`].
///
/// # Example
///
/// ```
/// use tourney::schedule::{Pairing, round_robin};
///
/// let pairings = round_robin(&[1, 2, 3, 4]);
/// assert_eq!(pairings[0], Pairing::new(1, 4));
/// assert_eq!(pairings.len(), 6);
/// ```
pub fn round_robin<T: Copy + PartialEq>(competitors: &[T]) -> Vec<Pairing<T>> {
    // `None` is the bye placeholder for an odd competitor count
    let mut slots: Vec<Option<T>> = competitors.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let slot_count = slots.len();
    if slot_count < 2 {
        return Vec::new();
    }

    let rounds = slot_count - 1;
    let half = slot_count / 2;

    let mut home: Vec<Option<T>> = slots[..half].to_vec();
    let mut visitor: Vec<Option<T>> = slots[half..].iter().rev().copied().collect();
    let fixed = home[0];

    let mut pairings = Vec::with_capacity(competitors.len() * competitors.len().saturating_sub(1) / 2);
    for round in 0..rounds {
        for (h, v) in home.iter().zip(visitor.iter()) {
            if let (Some(h), Some(v)) = (h, v) {
                pairings.push(Pairing::new(*h, *v));
            }
        }

        if round + 1 == rounds {
            break;
        }

        // Rotate around the fixed slot
        let home_to_visitor = home[half - 1];
        let visitor_to_home = visitor[0];
        let mut next_home = Vec::with_capacity(half);
        next_home.push(fixed);
        next_home.push(visitor_to_home);
        next_home.extend_from_slice(&home[1..half - 1]);
        visitor.remove(0);
        visitor.push(home_to_visitor);
        home = next_home;
    }

    if competitors.len() < ANTI_ADJACENCY_MIN_COMPETITORS {
        return pairings;
    }
    reduce_adjacency(&pairings)
}

/// Best-effort reordering that avoids a competitor playing twice in a row.
///
/// Single forward scan: when a pairing shares a competitor with the pairing
/// right before it in the input, it is swapped with the following pairing
/// and the swapped-in pairing is not examined again. The first and last
/// pairings are never moved. This does not guarantee a conflict-free order.
pub fn reduce_adjacency<T: Copy + PartialEq>(pairings: &[Pairing<T>]) -> Vec<Pairing<T>> {
    let mut ordered = Vec::with_capacity(pairings.len());
    let mut i = 0;
    while i < pairings.len() {
        let current = pairings[i];
        if i > 0 && i + 1 < pairings.len() && pairings[i - 1].shares_competitor(&current) {
            ordered.push(pairings[i + 1]);
            ordered.push(current);
            i += 2;
        } else {
            ordered.push(current);
            i += 1;
        }
    }
    ordered
}
