//! Per-mode player ceilings.

/// Mode used when a session names one this table doesn't know.
pub const DEFAULT_MODE: &str = "default";

const CEILINGS: &[(&str, usize)] = &[
    ("poker", 9),
    ("blackjack", 7),
    ("uno", 10),
    ("rummy", 6),
    (DEFAULT_MODE, 4),
];

/// The most active players a session of `game_mode` can hold.
/// Case-insensitive; unknown modes get the default ceiling of 4.
pub fn max_players_for(game_mode: &str) -> usize {
    CEILINGS
        .iter()
        .find(|(mode, _)| mode.eq_ignore_ascii_case(game_mode))
        .or_else(|| CEILINGS.iter().find(|(mode, _)| *mode == DEFAULT_MODE))
        .map_or(4, |(_, ceiling)| *ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_players_for_known_modes() {
        assert_eq!(max_players_for("poker"), 9);
        assert_eq!(max_players_for("blackjack"), 7);
        assert_eq!(max_players_for("uno"), 10);
        assert_eq!(max_players_for("rummy"), 6);
    }

    #[test]
    fn test_max_players_for_is_case_insensitive() {
        assert_eq!(max_players_for("UNO"), 10);
        assert_eq!(max_players_for("Poker"), 9);
    }

    #[test]
    fn test_max_players_for_unknown_mode_defaults_to_four() {
        assert_eq!(max_players_for("exploding-kittens"), 4);
        assert_eq!(max_players_for(""), 4);
    }
}
