//! Stateless deck generators.
//!
//! Cards are plain string tokens (`"A♥"`, `"R-Skip"`, `"W-Wild"`) so a
//! persisted deck is just an array of strings. Nothing here remembers
//! anything between calls; the caller owns the returned deck.

use rand::Rng;
use rand::seq::SliceRandom;

const SUITS: [&str; 4] = ["♥", "♦", "♣", "♠"];
const VALUES: [&str; 13] = ["A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K"];

const UNO_COLORS: [&str; 4] = ["R", "G", "B", "Y"];
const UNO_ACTIONS: [&str; 3] = ["Skip", "Reverse", "Draw2"];
const UNO_WILDS: [&str; 2] = ["Wild", "WildDraw4"];

/// The 52-card French deck in suit-major order, unshuffled.
pub fn standard_52() -> Vec<String> {
    SUITS
        .iter()
        .flat_map(|suit| VALUES.iter().map(move |value| format!("{value}{suit}")))
        .collect()
}

/// The 108-card Uno deck, unshuffled.
///
/// Per color: one `0`, two each of `1`-`9`, two each of Skip, Reverse,
/// Draw2. Then four `W-Wild` and four `W-WildDraw4`.
pub fn uno() -> Vec<String> {
    let mut deck = Vec::with_capacity(108);
    for color in UNO_COLORS {
        deck.push(format!("{color}-0"));
        for n in 1..=9 {
            deck.push(format!("{color}-{n}"));
            deck.push(format!("{color}-{n}"));
        }
        for action in UNO_ACTIONS {
            deck.push(format!("{color}-{action}"));
            deck.push(format!("{color}-{action}"));
        }
    }
    for wild in UNO_WILDS {
        for _ in 0..4 {
            deck.push(format!("W-{wild}"));
        }
    }
    deck
}

/// The unshuffled deck a `game_mode` plays with. Uno gets its own deck;
/// every other mode uses the standard 52.
pub fn for_mode(game_mode: &str) -> Vec<String> {
    if game_mode.eq_ignore_ascii_case("uno") {
        uno()
    } else {
        standard_52()
    }
}

/// [`for_mode`], shuffled with `rng`.
pub fn shuffled_for_mode<R: Rng + ?Sized>(game_mode: &str, rng: &mut R) -> Vec<String> {
    let mut deck = for_mode(game_mode);
    deck.shuffle(rng);
    deck
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_standard_52_has_unique_cards() {
        let deck = standard_52();
        assert_eq!(deck.len(), 52);
        assert_eq!(deck.iter().collect::<HashSet<_>>().len(), 52);
        assert_eq!(deck[0], "A♥");
        assert_eq!(deck[51], "K♠");
        assert!(deck.contains(&"10♣".to_string()));
    }

    #[test]
    fn test_uno_has_108_cards() {
        let deck = uno();
        assert_eq!(deck.len(), 108);
        assert_eq!(deck.iter().filter(|c| *c == "R-0").count(), 1);
        assert_eq!(deck.iter().filter(|c| *c == "B-7").count(), 2);
        assert_eq!(deck.iter().filter(|c| *c == "Y-Draw2").count(), 2);
        assert_eq!(deck.iter().filter(|c| *c == "W-WildDraw4").count(), 4);
    }

    #[test]
    fn test_for_mode_picks_deck_by_mode() {
        assert_eq!(for_mode("UNO").len(), 108);
        assert_eq!(for_mode("poker").len(), 52);
        assert_eq!(for_mode("whatever").len(), 52);
    }

    #[test]
    fn test_shuffled_for_mode_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut shuffled = shuffled_for_mode("poker", &mut rng);
        assert_ne!(shuffled, standard_52());
        shuffled.sort();
        let mut original = standard_52();
        original.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn test_shuffled_for_mode_same_seed_same_order() {
        let a = shuffled_for_mode("uno", &mut StdRng::seed_from_u64(42));
        let b = shuffled_for_mode("uno", &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
