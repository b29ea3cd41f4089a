//! Field dimensions, bulk defense templates and zone coverage patterns.
//!
//! Templates and patterns store positions normalized to `[0,1] x [0,1]`
//! field space, with `y` growing toward the offense backfield. The first
//! slots of every defense template are the coverage players (corners,
//! safeties, linebackers) so coverage patterns line up with them by index;
//! linemen come last and fall back to pursuit.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDimensions {
    pub width: f32,
    pub height: f32,
}

impl Default for FieldDimensions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl FieldDimensions {
    pub fn denormalize(&self, normalized: Vec2) -> Vec2 {
        Vec2 {
            x: normalized.x.clamp(0.0, 1.0) * self.width,
            y: normalized.y.clamp(0.0, 1.0) * self.height,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePattern {
    pub id: String,
    pub name: String,
    /// An empty list means man coverage: every defender pursues.
    pub targets: Vec<Vec2>,
}

impl CoveragePattern {
    pub fn is_man(&self) -> bool {
        self.targets.is_empty()
    }

    /// Zone target of the defender at `slot`, in field pixels.
    pub fn target_for_slot(&self, slot: usize, field: &FieldDimensions) -> Option<Vec2> {
        self.targets
            .get(slot)
            .map(|normalized| field.denormalize(*normalized))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefenseFormation {
    pub id: &'static str,
    pub name: &'static str,
    pub positions: &'static [(f32, f32)],
}

impl DefenseFormation {
    pub fn placements(&self, field: &FieldDimensions) -> Vec<Vec2> {
        self.positions
            .iter()
            .map(|&(x, y)| field.denormalize(Vec2::new(x, y)))
            .collect()
    }
}

const FORMATION_4_3: DefenseFormation = DefenseFormation {
    id: "4-3",
    name: "4-3",
    positions: &[
        (0.10, 0.45),
        (0.90, 0.45),
        (0.35, 0.22),
        (0.65, 0.22),
        (0.30, 0.38),
        (0.50, 0.38),
        (0.70, 0.38),
        (0.38, 0.48),
        (0.46, 0.48),
        (0.54, 0.48),
        (0.62, 0.48),
    ],
};

const FORMATION_3_4: DefenseFormation = DefenseFormation {
    id: "3-4",
    name: "3-4",
    positions: &[
        (0.10, 0.45),
        (0.90, 0.45),
        (0.35, 0.22),
        (0.65, 0.22),
        (0.26, 0.40),
        (0.42, 0.38),
        (0.58, 0.38),
        (0.74, 0.40),
        (0.42, 0.48),
        (0.50, 0.48),
        (0.58, 0.48),
    ],
};

const FORMATION_NICKEL: DefenseFormation = DefenseFormation {
    id: "nickel",
    name: "Nickel",
    positions: &[
        (0.10, 0.45),
        (0.90, 0.45),
        (0.35, 0.22),
        (0.65, 0.22),
        (0.22, 0.42),
        (0.42, 0.38),
        (0.58, 0.38),
        (0.38, 0.48),
        (0.46, 0.48),
        (0.54, 0.48),
        (0.62, 0.48),
    ],
};

const DEFENSE_FORMATIONS: &[DefenseFormation] =
    &[FORMATION_4_3, FORMATION_3_4, FORMATION_NICKEL];

pub fn defense_formations() -> &'static [DefenseFormation] {
    DEFENSE_FORMATIONS
}

pub fn find_defense_formation(name: &str) -> Option<&'static DefenseFormation> {
    let wanted = name.trim();
    DEFENSE_FORMATIONS
        .iter()
        .find(|formation| {
            formation.id.eq_ignore_ascii_case(wanted) || formation.name.eq_ignore_ascii_case(wanted)
        })
}

fn pattern(id: &str, name: &str, targets: &[(f32, f32)]) -> CoveragePattern {
    CoveragePattern {
        id: id.to_string(),
        name: name.to_string(),
        targets: targets.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
    }
}

/// Built-in patterns: man, cover 2, cover 3 and cover 4.
pub fn coverage_patterns() -> Vec<CoveragePattern> {
    vec![
        pattern("man", "Man", &[]),
        pattern(
            "cover-2",
            "Cover 2",
            &[
                (0.12, 0.38),
                (0.88, 0.38),
                (0.27, 0.12),
                (0.73, 0.12),
                (0.32, 0.33),
                (0.50, 0.30),
                (0.68, 0.33),
            ],
        ),
        pattern(
            "cover-3",
            "Cover 3",
            &[
                (0.15, 0.15),
                (0.85, 0.15),
                (0.50, 0.10),
                (0.25, 0.35),
                (0.40, 0.33),
                (0.60, 0.33),
                (0.78, 0.36),
            ],
        ),
        pattern(
            "cover-4",
            "Cover 4",
            &[
                (0.12, 0.15),
                (0.88, 0.15),
                (0.38, 0.15),
                (0.62, 0.15),
                (0.25, 0.38),
                (0.50, 0.35),
                (0.75, 0.38),
            ],
        ),
    ]
}

pub fn find_coverage_pattern(name: &str) -> Option<CoveragePattern> {
    let wanted = name.trim();
    coverage_patterns().into_iter().find(|pattern| {
        pattern.id.eq_ignore_ascii_case(wanted) || pattern.name.eq_ignore_ascii_case(wanted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denormalize_scales_and_clamps() {
        let field = FieldDimensions {
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(field.denormalize(Vec2::new(0.5, 0.25)), Vec2::new(100.0, 25.0));
        assert_eq!(field.denormalize(Vec2::new(1.5, -0.5)), Vec2::new(200.0, 0.0));
    }

    #[test]
    fn pattern_lookup_is_case_insensitive_by_id_or_name() {
        assert_eq!(
            find_coverage_pattern("cover 3").map(|pattern| pattern.id),
            Some("cover-3".to_string())
        );
        assert_eq!(
            find_coverage_pattern("COVER-2").map(|pattern| pattern.name),
            Some("Cover 2".to_string())
        );
        assert!(find_coverage_pattern("cover 9").is_none());
    }

    #[test]
    fn man_pattern_has_no_targets() {
        let man = find_coverage_pattern("man").expect("man pattern");
        assert!(man.is_man());
        assert_eq!(man.target_for_slot(0, &FieldDimensions::default()), None);
    }

    #[test]
    fn zone_targets_cover_the_back_seven_only() {
        let field = FieldDimensions::default();
        for pattern in coverage_patterns().iter().filter(|pattern| !pattern.is_man()) {
            assert_eq!(pattern.targets.len(), 7, "{}", pattern.name);
            assert!(pattern.target_for_slot(6, &field).is_some());
            assert!(pattern.target_for_slot(7, &field).is_none());
        }
    }

    #[test]
    fn formations_field_eleven_defenders_inside_the_field() {
        let field = FieldDimensions::default();
        for formation in defense_formations() {
            let placements = formation.placements(&field);
            assert_eq!(placements.len(), 11, "{}", formation.name);
            assert!(placements.iter().all(|p| p.x >= 0.0
                && p.x <= field.width
                && p.y >= 0.0
                && p.y <= field.height));
        }
        assert!(find_defense_formation("nickel").is_some());
    }
}
