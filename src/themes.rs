//! Theme resolution: what prompt a round (or phase 2) plays to.
//!
//! The theme bank is user-editable and lives outside the engine, so it comes
//! in through a read-only provider instead of a hidden global. A slot with
//! custom text always wins; otherwise the theme is a seeded pick from the
//! pool, so the same room seed yields the same prompt sequence.

use crate::random::{mix_seed, seeded_pick};
use crate::types::GameConfig;

/// Salt for the phase-2 draw, keeping it distinct from any round draw.
const PHASE2_THEME_SALT: u64 = 0x7002;

/// Read-only view of the theme bank.
pub trait ThemesProvider {
    fn phase1_pool(&self) -> Vec<String>;
    fn phase2_pool(&self) -> Vec<String>;
}

/// Built-in prompts used when the user's bank has nothing for a phase.
pub struct DefaultThemes;

const DEFAULT_P1_POOL: &[&str] = &[
    "Something you'd never say at a job interview",
    "The worst possible superpower",
    "A terrible name for a pet",
    "The last thing you'd want to hear from your dentist",
    "An unlikely sponsor for the olympics",
    "A rejected flavor of ice cream",
    "The first rule of a very bad club",
    "Something you shouldn't whisper in an elevator",
    "A motto for a failing airline",
    "The worst opening line for a wedding speech",
];

const DEFAULT_P2_POOL: &[&str] = &[
    "Which of these would survive longest in the wild?",
    "Which of these deserves a movie adaptation?",
    "Which of these would win a street fight?",
    "Which of these should be carved into a monument?",
    "Which of these will still be funny in ten years?",
];

impl ThemesProvider for DefaultThemes {
    fn phase1_pool(&self) -> Vec<String> {
        DEFAULT_P1_POOL.iter().map(|s| s.to_string()).collect()
    }

    fn phase2_pool(&self) -> Vec<String> {
        DEFAULT_P2_POOL.iter().map(|s| s.to_string()).collect()
    }
}

/// Fixed pools, mainly for tests and for rooms that want a frozen bank.
pub struct StaticThemes {
    pub phase1: Vec<String>,
    pub phase2: Vec<String>,
}

impl ThemesProvider for StaticThemes {
    fn phase1_pool(&self) -> Vec<String> {
        self.phase1.clone()
    }

    fn phase2_pool(&self) -> Vec<String> {
        self.phase2.clone()
    }
}

/// Theme for a phase-1 round (1-based). Slot text wins; otherwise a
/// deterministic pick seeded by the room seed and the round number.
pub fn round_theme(config: &GameConfig, themes: &dyn ThemesProvider, round: u32) -> String {
    let slot = config
        .p1_theme_slots
        .get(round.saturating_sub(1) as usize)
        .map(|s| s.trim())
        .unwrap_or("");
    if !slot.is_empty() {
        return slot.to_string();
    }

    let mut pool = themes.phase1_pool();
    if pool.is_empty() {
        pool = DefaultThemes.phase1_pool();
    }
    pick_from(&pool, mix_seed(config.seed, round as u64))
}

/// Theme for phase 2. Same precedence as rounds, fixed salt.
pub fn phase2_theme(config: &GameConfig, themes: &dyn ThemesProvider) -> String {
    let slot = config.p2_theme_slot.trim();
    if !slot.is_empty() {
        return slot.to_string();
    }

    let mut pool = themes.phase2_pool();
    if pool.is_empty() {
        pool = DefaultThemes.phase2_pool();
    }
    pick_from(&pool, mix_seed(config.seed, PHASE2_THEME_SALT))
}

fn pick_from(pool: &[String], seed: u64) -> String {
    seeded_pick(pool, seed).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_seed(seed: u64) -> GameConfig {
        GameConfig {
            seed,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_slot_text_overrides_pool() {
        let mut config = config_with_seed(7);
        config.p1_theme_slots = vec!["  Custom round one  ".to_string(), String::new()];
        assert_eq!(
            round_theme(&config, &DefaultThemes, 1),
            "Custom round one"
        );
        // Round 2 slot is empty, so it draws from the pool instead.
        let drawn = round_theme(&config, &DefaultThemes, 2);
        assert!(DEFAULT_P1_POOL.contains(&drawn.as_str()));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let config = config_with_seed(12345);
        let first: Vec<String> = (1..=5)
            .map(|r| round_theme(&config, &DefaultThemes, r))
            .collect();
        let second: Vec<String> = (1..=5)
            .map(|r| round_theme(&config, &DefaultThemes, r))
            .collect();
        assert_eq!(first, second);
        assert_eq!(
            phase2_theme(&config, &DefaultThemes),
            phase2_theme(&config, &DefaultThemes)
        );
    }

    #[test]
    fn test_different_rounds_can_differ() {
        let config = config_with_seed(5);
        let themes: Vec<String> = (1..=10)
            .map(|r| round_theme(&config, &DefaultThemes, r))
            .collect();
        // Not all ten draws should collapse to a single prompt.
        assert!(themes.iter().any(|t| *t != themes[0]));
    }

    #[test]
    fn test_empty_bank_falls_back_to_builtin() {
        let config = config_with_seed(9);
        let empty = StaticThemes {
            phase1: Vec::new(),
            phase2: Vec::new(),
        };
        let theme = round_theme(&config, &empty, 1);
        assert!(DEFAULT_P1_POOL.contains(&theme.as_str()));
        let p2 = phase2_theme(&config, &empty);
        assert!(DEFAULT_P2_POOL.contains(&p2.as_str()));
    }

    #[test]
    fn test_custom_bank_is_used() {
        let config = config_with_seed(9);
        let bank = StaticThemes {
            phase1: vec!["only one".to_string()],
            phase2: vec!["final only".to_string()],
        };
        assert_eq!(round_theme(&config, &bank, 3), "only one");
        assert_eq!(phase2_theme(&config, &bank), "final only");
    }
}
