//! Canonical spec-id-to-role table.
//!
//! Single source of truth for role precedence; nothing else in the crate
//! may classify specs. Expressed as one `match`, which makes duplicate or
//! conflicting assignments unrepresentable.

use crate::domain::SpecId;

/// Tank rank, sorts first within a composition key.
pub const TANK: u8 = 1;
/// Healer rank, sorts after tanks.
pub const HEALER: u8 = 2;
/// Damage rank, sorts last; also the default for unrecognized spec ids.
pub const DAMAGE: u8 = 3;

/// Ordinal role rank for a spec id (tank < healer < damage).
///
/// Used only to canonicalize composition keys; unrecognized ids classify
/// as damage.
pub fn role_rank(spec: SpecId) -> u8 {
    match spec.0 {
        // Tanks: Protection Paladin/Warrior, Guardian, Blood, Brewmaster, Vengeance
        66 | 73 | 104 | 250 | 268 | 581 => TANK,
        // Healers: Holy Paladin/Priest, Restoration Druid/Shaman, Discipline,
        // Mistweaver, Preservation
        65 | 105 | 256 | 257 | 264 | 270 | 1468 => HEALER,
        _ => DAMAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tanks_rank_first() {
        for id in [66, 73, 104, 250, 268, 581] {
            assert_eq!(role_rank(SpecId(id)), TANK);
        }
    }

    #[test]
    fn test_known_healers_rank_second() {
        for id in [65, 105, 256, 257, 264, 270, 1468] {
            assert_eq!(role_rank(SpecId(id)), HEALER);
        }
    }

    #[test]
    fn test_everything_else_is_damage() {
        for id in [62, 63, 251, 259, 577, 1467, 0, 999_999] {
            assert_eq!(role_rank(SpecId(id)), DAMAGE);
        }
    }
}
