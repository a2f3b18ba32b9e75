//! Static feature catalog
//!
//! Every optional gameplay behavior, its default state and its tunable
//! parameters. Loaded once by [`FeatureRegistry::init`](super::FeatureRegistry::init).

use super::{FeatureCategory, FeatureDef, ParamDef};

/// Feature ids
pub mod ids {
    pub const PIN_GRID: &str = "pinGrid";
    pub const WABI_SABI: &str = "wabiSabi";
    pub const PIN_SIZE_VARIATION: &str = "pinSizeVariation";
    pub const MOVING_PINS: &str = "movingPins";
    pub const CREATURE: &str = "creature";
    pub const HARDCORE_LAUNCH: &str = "hardcoreLaunch";
    pub const BUDGET_MODE: &str = "budgetMode";
    pub const GOLDEN_BALL: &str = "goldenBall";
    pub const POWER_UPS: &str = "powerUps";
    pub const MYSTERY_BUCKET: &str = "mysteryBucket";
    pub const LUCKY_ZONE: &str = "luckyZone";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const DAILY_CHALLENGE: &str = "dailyChallenge";
    pub const GLOBAL_LEADERBOARD: &str = "globalLeaderboard";
    pub const BALL_TRAIL: &str = "ballTrail";
    pub const COMBO_EFFECTS: &str = "comboEffects";
    pub const SCREEN_SHAKE: &str = "screenShake";
    pub const SOUND_EFFECTS: &str = "soundEffects";
}

use ids::*;

pub static FEATURES: &[FeatureDef] = &[
    // === Gameplay ===
    FeatureDef {
        id: PIN_GRID,
        name: "Pin grid",
        description: "Staggered field of pins the ball bounces through",
        category: FeatureCategory::Gameplay,
        enabled: true,
        params: &[
            ParamDef::number("rows", 10.0, 8.0, 15.0, 1.0),
            ParamDef::number("cols", 9.0, 6.0, 12.0, 1.0),
        ],
    },
    FeatureDef {
        id: WABI_SABI,
        name: "Wabi-sabi",
        description: "Pins are nudged off the perfect grid",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[ParamDef::number("jitter", 3.0, 0.0, 10.0, 0.5)],
    },
    FeatureDef {
        id: PIN_SIZE_VARIATION,
        name: "Pin size variation",
        description: "Each pin gets a random size",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[
            ParamDef::number("minScale", 0.3, 0.3, 2.0, 0.1),
            ParamDef::number("maxScale", 2.0, 0.3, 2.0, 0.1),
        ],
    },
    FeatureDef {
        id: MOVING_PINS,
        name: "Moving pins",
        description: "Even pin rows slide back and forth",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[
            ParamDef::number("speed", 50.0, 10.0, 200.0, 5.0),
            ParamDef::number("distance", 40.0, 10.0, 100.0, 5.0),
            ParamDef::boolean("alternateDirection", true),
        ],
    },
    FeatureDef {
        id: CREATURE,
        name: "Creatures",
        description: "Floating creatures wander the field and eat balls",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[
            ParamDef::number("count", 1.0, 1.0, 3.0, 1.0),
            ParamDef::number("speed", 80.0, 20.0, 200.0, 5.0),
            ParamDef::number("radius", 20.0, 10.0, 40.0, 1.0),
            ParamDef::number("dashIntensity", 1.0, 0.0, 3.0, 0.1),
        ],
    },
    FeatureDef {
        id: HARDCORE_LAUNCH,
        name: "Hardcore aiming",
        description: "Size, angle and force oscillate; launch locks in the live values",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[
            ParamDef::number("sizeMin", 0.6, 0.3, 1.0, 0.1),
            ParamDef::number("sizeMax", 1.6, 1.0, 2.5, 0.1),
            ParamDef::number("sizePeriod", 1100.0, 300.0, 4000.0, 100.0),
            ParamDef::number("angleRange", 40.0, 5.0, 80.0, 1.0),
            ParamDef::number("anglePeriod", 1700.0, 300.0, 4000.0, 100.0),
            ParamDef::number("forceMin", 150.0, 50.0, 400.0, 10.0),
            ParamDef::number("forceMax", 450.0, 200.0, 900.0, 10.0),
            ParamDef::number("forcePeriod", 1300.0, 300.0, 4000.0, 100.0),
        ],
    },
    FeatureDef {
        id: BUDGET_MODE,
        name: "Budget",
        description: "Bet currency for credits; each launch costs one credit",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[
            ParamDef::number("startingBalance", 1000.0, 0.0, 100_000.0, 10.0),
            ParamDef::number("exchangeRate", 0.1, 0.01, 10.0, 0.01),
        ],
    },
    FeatureDef {
        id: GOLDEN_BALL,
        name: "Golden ball",
        description: "Random launches become golden and score extra",
        category: FeatureCategory::Gameplay,
        enabled: true,
        params: &[
            ParamDef::number("chance", 0.05, 0.0, 1.0, 0.01),
            ParamDef::number("multiplier", 3.0, 1.0, 10.0, 0.5),
        ],
    },
    FeatureDef {
        id: POWER_UPS,
        name: "Power-ups",
        description: "Combo milestones unlock magnet, multi-ball, ghost and big ball",
        category: FeatureCategory::Gameplay,
        enabled: true,
        params: &[
            ParamDef::number("magnetLaunches", 3.0, 1.0, 10.0, 1.0),
            ParamDef::number("multiBallLaunches", 1.0, 1.0, 10.0, 1.0),
            ParamDef::number("ghostLaunches", 2.0, 1.0, 10.0, 1.0),
            ParamDef::number("bigBallLaunches", 3.0, 1.0, 10.0, 1.0),
            ParamDef::number("multiBallExtra", 2.0, 1.0, 4.0, 1.0),
        ],
    },
    FeatureDef {
        id: MYSTERY_BUCKET,
        name: "Mystery bucket",
        description: "One bucket pays a random multiple of its value",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[
            ParamDef::number("minMultiplier", 0.5, 0.0, 1.0, 0.1),
            ParamDef::number("maxMultiplier", 5.0, 1.0, 10.0, 0.5),
        ],
    },
    FeatureDef {
        id: LUCKY_ZONE,
        name: "Lucky zone",
        description: "One bucket pays a fixed multiple of its value",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[ParamDef::number("multiplier", 2.0, 1.0, 5.0, 0.5)],
    },
    FeatureDef {
        id: ACHIEVEMENTS,
        name: "Achievements",
        description: "Unlock achievements while playing",
        category: FeatureCategory::Gameplay,
        enabled: true,
        params: &[],
    },
    FeatureDef {
        id: DAILY_CHALLENGE,
        name: "Daily challenge",
        description: "A new challenge every day",
        category: FeatureCategory::Gameplay,
        enabled: true,
        params: &[],
    },
    FeatureDef {
        id: GLOBAL_LEADERBOARD,
        name: "Global leaderboard",
        description: "Submit scores to the online leaderboard",
        category: FeatureCategory::Gameplay,
        enabled: false,
        params: &[],
    },
    // === Visual ===
    FeatureDef {
        id: BALL_TRAIL,
        name: "Ball trail",
        description: "Balls leave a fading trail",
        category: FeatureCategory::Visual,
        enabled: true,
        params: &[ParamDef::number("length", 20.0, 5.0, 60.0, 1.0)],
    },
    FeatureDef {
        id: COMBO_EFFECTS,
        name: "Combo effects",
        description: "Particles and banners on combos",
        category: FeatureCategory::Visual,
        enabled: true,
        params: &[ParamDef::number("threshold", 3.0, 1.0, 20.0, 1.0)],
    },
    FeatureDef {
        id: SCREEN_SHAKE,
        name: "Screen shake",
        description: "Camera shakes on new combo hits",
        category: FeatureCategory::Visual,
        enabled: true,
        params: &[
            ParamDef::number("intensity", 0.004, 0.0, 0.02, 0.001),
            ParamDef::number("duration", 80.0, 0.0, 500.0, 10.0),
        ],
    },
    // === Audio ===
    FeatureDef {
        id: SOUND_EFFECTS,
        name: "Sound effects",
        description: "Play sound effects",
        category: FeatureCategory::Audio,
        enabled: true,
        params: &[ParamDef::number("volume", 0.8, 0.0, 1.0, 0.05)],
    },
];

/// Look up a feature definition by id
pub fn find(id: &str) -> Option<&'static FeatureDef> {
    FEATURES.iter().find(|f| f.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique() {
        let ids: HashSet<_> = FEATURES.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), FEATURES.len());
    }

    #[test]
    fn test_defaults_within_bounds() {
        for feature in FEATURES {
            let mut keys = HashSet::new();
            for param in feature.params {
                assert!(keys.insert(param.key), "duplicate key {}", param.key);
                if let (Some(v), Some(min), Some(max)) =
                    (param.default.as_number(), param.min, param.max)
                {
                    assert!(
                        (min..=max).contains(&v),
                        "{}.{} default out of range",
                        feature.id,
                        param.key
                    );
                }
            }
        }
    }

    #[test]
    fn test_grid_bounds_match_layout_limits() {
        let grid = find(PIN_GRID).unwrap();
        let rows = grid.param("rows").unwrap();
        assert_eq!((rows.min, rows.max), (Some(8.0), Some(15.0)));
        let cols = grid.param("cols").unwrap();
        assert_eq!((cols.min, cols.max), (Some(6.0), Some(12.0)));
    }
}
