//! Modifier model
//!
//! Pure functions turning track and equipment state into multipliers, and
//! the composition of those multipliers into per-tick move and fall chances.
//! Nothing here holds state or touches the RNG.

use super::competitor::{Item, ItemKind};
use super::track::{TrackCondition, TrackShape};
use crate::clamp_unit;
use crate::consts::FIGURE_EIGHT_CROSSING_SPEED;

/// Movement multiplier for a surface condition
pub fn speed_modifier(condition: TrackCondition) -> f64 {
    match condition {
        TrackCondition::Dry => 1.0,
        TrackCondition::Muddy => 0.8,
        TrackCondition::Icy => 0.6,
    }
}

/// Additive fall risk for a surface condition
pub fn fall_risk_modifier(condition: TrackCondition) -> f64 {
    match condition {
        TrackCondition::Dry => 0.0,
        TrackCondition::Muddy => 0.1,
        TrackCondition::Icy => 0.3,
    }
}

/// Slowdown at a figure-eight crossing.
///
/// The crossing sits at every multiple of `length / 2` (integer division), so
/// an odd length puts it slightly before the true midpoint.
pub fn shape_speed_adjustment(shape: TrackShape, length: u32, distance_travelled: u32) -> f64 {
    match shape {
        TrackShape::Oval => 1.0,
        TrackShape::FigureEight => match distance_travelled.checked_rem(length / 2) {
            Some(0) => FIGURE_EIGHT_CROSSING_SPEED,
            _ => 1.0,
        },
    }
}

fn fold_equipment(items: &[Item], field: impl Fn(&Item) -> f64) -> f64 {
    items
        .iter()
        .filter(|item| item.kind == ItemKind::Equipment)
        .map(field)
        .product()
}

/// Product of speed multipliers over equipment (accessories excluded)
pub fn equipment_speed_modifier(items: &[Item]) -> f64 {
    fold_equipment(items, |item| item.speed_modifier)
}

/// Product of endurance multipliers over equipment (accessories excluded)
pub fn equipment_endurance_modifier(items: &[Item]) -> f64 {
    fold_equipment(items, |item| item.endurance_modifier)
}

/// Product of confidence multipliers over equipment (accessories excluded)
pub fn equipment_confidence_modifier(items: &[Item]) -> f64 {
    fold_equipment(items, |item| item.confidence_modifier)
}

/// Everything the chance formulas need about one competitor on one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceInputs {
    pub confidence: f64,
    pub distance_travelled: u32,
    pub length: u32,
    pub track_speed: f64,
    pub track_fall_risk: f64,
    pub shape_adjustment: f64,
    pub equipment_speed: f64,
    pub equipment_endurance: f64,
    pub equipment_confidence: f64,
}

impl ChanceInputs {
    /// Confidence after equipment, capped at 1.0
    pub fn effective_confidence(&self) -> f64 {
        (self.confidence * self.equipment_confidence).min(1.0)
    }

    /// Fraction of the track covered, in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.length == 0 {
            return 1.0;
        }
        clamp_unit(f64::from(self.distance_travelled) / f64::from(self.length))
    }

    /// Endurance decay factor: 1.0 at the start, shrinking with progress in
    /// proportion to how far the endurance modifier falls short of 1.0
    pub fn endurance_decay(&self) -> f64 {
        let weakness = clamp_unit(1.0 - self.equipment_endurance);
        1.0 - weakness * self.progress()
    }

    /// Unclamped chance of moving one unit this tick
    pub fn raw_move_chance(&self) -> f64 {
        self.effective_confidence()
            * self.track_speed
            * self.shape_adjustment
            * self.equipment_speed
            * self.endurance_decay()
    }

    /// Unclamped chance of falling this tick.
    ///
    /// Can exceed 1.0 when the equipment confidence modifier is small.
    pub fn raw_fall_chance(&self, base_fall_probability: f64) -> f64 {
        let eff = self.effective_confidence();
        (base_fall_probability * eff * eff + self.track_fall_risk) / self.equipment_confidence
    }

    /// Move chance ready for sampling
    pub fn move_chance(&self) -> f64 {
        crate::clamp_probability(self.raw_move_chance())
    }

    /// Fall chance ready for sampling
    pub fn fall_chance(&self, base_fall_probability: f64) -> f64 {
        crate::clamp_probability(self.raw_fall_chance(base_fall_probability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ChanceInputs {
        ChanceInputs {
            confidence: 0.5,
            distance_travelled: 0,
            length: 30,
            track_speed: 1.0,
            track_fall_risk: 0.0,
            shape_adjustment: 1.0,
            equipment_speed: 1.0,
            equipment_endurance: 1.0,
            equipment_confidence: 1.0,
        }
    }

    #[test]
    fn test_condition_modifiers() {
        assert_eq!(speed_modifier(TrackCondition::Dry), 1.0);
        assert_eq!(speed_modifier(TrackCondition::Muddy), 0.8);
        assert_eq!(speed_modifier(TrackCondition::Icy), 0.6);
        assert_eq!(fall_risk_modifier(TrackCondition::Dry), 0.0);
        assert_eq!(fall_risk_modifier(TrackCondition::Muddy), 0.1);
        assert_eq!(fall_risk_modifier(TrackCondition::Icy), 0.3);
    }

    #[test]
    fn test_oval_shape_is_neutral() {
        for d in 0..=30 {
            assert_eq!(shape_speed_adjustment(TrackShape::Oval, 30, d), 1.0);
        }
    }

    #[test]
    fn test_figure_eight_crossings() {
        for d in 0..=30 {
            let expected = if d == 0 || d == 15 || d == 30 { 0.7 } else { 1.0 };
            assert_eq!(shape_speed_adjustment(TrackShape::FigureEight, 30, d), expected, "d={d}");
        }
    }

    #[test]
    fn test_figure_eight_odd_length_uses_integer_half() {
        // 31 / 2 == 15, so the crossings are 0, 15, 30 and not 31
        assert_eq!(shape_speed_adjustment(TrackShape::FigureEight, 31, 15), 0.7);
        assert_eq!(shape_speed_adjustment(TrackShape::FigureEight, 31, 30), 0.7);
        assert_eq!(shape_speed_adjustment(TrackShape::FigureEight, 31, 31), 1.0);
    }

    #[test]
    fn test_figure_eight_degenerate_length_does_not_panic() {
        assert_eq!(shape_speed_adjustment(TrackShape::FigureEight, 1, 0), 1.0);
    }

    #[test]
    fn test_equipment_fold_skips_accessories() {
        let items = vec![
            Item::equipment("Racing Saddle", 1.2, 0.9, 1.1),
            Item::equipment("Horseshoes", 1.1, 1.0, 1.0),
            Item {
                // Same field shape, but accessories must never count
                speed_modifier: 5.0,
                endurance_modifier: 5.0,
                confidence_modifier: 5.0,
                ..Item::accessory("Ribbon")
            },
        ];
        assert!((equipment_speed_modifier(&items) - 1.32).abs() < 1e-9);
        assert!((equipment_endurance_modifier(&items) - 0.9).abs() < 1e-9);
        assert!((equipment_confidence_modifier(&items) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_equipment_is_neutral() {
        assert_eq!(equipment_speed_modifier(&[]), 1.0);
        assert_eq!(equipment_endurance_modifier(&[]), 1.0);
        assert_eq!(equipment_confidence_modifier(&[]), 1.0);
    }

    #[test]
    fn test_effective_confidence_capped() {
        let c = ChanceInputs {
            confidence: 0.9,
            equipment_confidence: 1.5,
            ..inputs()
        };
        assert_eq!(c.effective_confidence(), 1.0);
    }

    #[test]
    fn test_move_chance_composition() {
        let c = ChanceInputs {
            confidence: 0.5,
            track_speed: 0.8,
            shape_adjustment: 0.7,
            equipment_speed: 1.1,
            ..inputs()
        };
        assert!((c.move_chance() - 0.5 * 0.8 * 0.7 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_endurance_has_no_decay() {
        let c = ChanceInputs {
            distance_travelled: 29,
            ..inputs()
        };
        assert_eq!(c.endurance_decay(), 1.0);
    }

    #[test]
    fn test_weak_endurance_decays_toward_finish() {
        let start = ChanceInputs {
            equipment_endurance: 0.0,
            ..inputs()
        };
        let late = ChanceInputs {
            distance_travelled: 27,
            ..start
        };
        assert_eq!(start.endurance_decay(), 1.0);
        assert!((late.endurance_decay() - 0.1).abs() < 1e-9);
        assert!(late.move_chance() < start.move_chance());
    }

    #[test]
    fn test_endurance_boost_does_not_amplify() {
        let c = ChanceInputs {
            equipment_endurance: 1.4,
            distance_travelled: 20,
            ..inputs()
        };
        assert_eq!(c.endurance_decay(), 1.0);
    }

    #[test]
    fn test_fall_chance_formula() {
        let c = ChanceInputs {
            confidence: 0.5,
            track_fall_risk: 0.1,
            ..inputs()
        };
        assert!((c.fall_chance(0.01) - (0.01 * 0.25 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_fall_chance_is_clamped() {
        let c = ChanceInputs {
            track_fall_risk: 0.3,
            equipment_confidence: 0.1,
            ..inputs()
        };
        assert!(c.raw_fall_chance(0.01) > 1.0);
        assert_eq!(c.fall_chance(0.01), 1.0);

        let zero = ChanceInputs {
            equipment_confidence: 0.0,
            ..inputs()
        };
        // 0 / 0 must not leak NaN into the sampler
        assert_eq!(zero.fall_chance(0.01), 0.0);
    }
}
