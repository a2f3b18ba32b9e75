//! Score tiers

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierDef {
    pub id: &'static str,
    pub name_key: &'static str,
    pub min_score: u64,
    /// Theme tint unlocked with the tier (0xRRGGBB)
    pub color: u32,
}

/// Ascending by threshold
pub static TIERS: &[TierDef] = &[
    TierDef { id: "bronze", name_key: "tier.bronze", min_score: 0, color: 0xcd7f32 },
    TierDef { id: "silver", name_key: "tier.silver", min_score: 1_000, color: 0xc0c0c0 },
    TierDef { id: "gold", name_key: "tier.gold", min_score: 5_000, color: 0xffd700 },
    TierDef { id: "platinum", name_key: "tier.platinum", min_score: 15_000, color: 0xe5e4e2 },
    TierDef { id: "diamond", name_key: "tier.diamond", min_score: 50_000, color: 0xb9f2ff },
];

/// Highest tier whose threshold `score` meets
pub fn tier_for_score(score: u64) -> &'static TierDef {
    TIERS
        .iter()
        .rev()
        .find(|t| score >= t.min_score)
        .unwrap_or(&TIERS[0])
}

/// Position in [`TIERS`] (unknown ids rank lowest)
pub fn rank(id: &str) -> usize {
    TIERS.iter().position(|t| t.id == id).unwrap_or(0)
}

pub fn find(id: &str) -> Option<&'static TierDef> {
    TIERS.iter().find(|t| t.id == id)
}
