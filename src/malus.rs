//! Round maluses: difficulty modifiers that raise the score multiplier
//!
//! A round draws 2–4 maluses at random from [`MALUS_POOL`]. Each one turns on
//! a feature with specific parameters; the non-hardcore ones add their bonus
//! percentage, and any hardcore malus doubles the whole multiplier.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::features::{FeatureRegistry, FeatureSnapshot, ParamValue, ids};

/// A difficulty modifier
#[derive(Debug, Clone, PartialEq)]
pub struct MalusEntry {
    pub id: &'static str,
    pub name_key: &'static str,
    pub description_key: &'static str,
    pub icon: &'static str,
    pub bonus_percent: u32,
    /// Feature switched on by this malus
    pub feature_id: &'static str,
    /// Parameter overrides applied to that feature
    pub feature_params: &'static [(&'static str, ParamValue)],
    /// Doubles the multiplier instead of adding to the bonus pool
    pub is_hardcore: bool,
}

impl MalusEntry {
    pub fn is_creature(&self) -> bool {
        self.feature_id == ids::CREATURE
    }
}

macro_rules! malus {
    ($id:literal, $icon:literal, $bonus:expr, $feature:expr, $params:expr, $hardcore:expr) => {
        MalusEntry {
            id: $id,
            name_key: concat!("malus.", $id, ".name"),
            description_key: concat!("malus.", $id, ".description"),
            icon: $icon,
            bonus_percent: $bonus,
            feature_id: $feature,
            feature_params: $params,
            is_hardcore: $hardcore,
        }
    };
}

use ParamValue::{Bool, Number};

pub static MALUS_POOL: &[MalusEntry] = &[
    malus!(
        "moving_pins",
        "arrows-h",
        25,
        ids::MOVING_PINS,
        &[("speed", Number(60.0)), ("distance", Number(40.0)), ("alternateDirection", Bool(true))],
        false
    ),
    malus!("wabi_sabi", "leaf", 10, ids::WABI_SABI, &[("jitter", Number(3.0))], false),
    malus!(
        "pin_chaos",
        "circle-dot",
        20,
        ids::PIN_SIZE_VARIATION,
        &[("minScale", Number(0.3)), ("maxScale", Number(2.0))],
        false
    ),
    malus!(
        "dense_grid",
        "grid",
        15,
        ids::PIN_GRID,
        &[("rows", Number(15.0)), ("cols", Number(12.0))],
        false
    ),
    malus!(
        "lone_creature",
        "ghost",
        30,
        ids::CREATURE,
        &[("count", Number(1.0)), ("speed", Number(60.0))],
        false
    ),
    malus!(
        "creature_hunter",
        "skull",
        50,
        ids::CREATURE,
        &[("count", Number(2.0)), ("speed", Number(150.0))],
        false
    ),
    malus!(
        "creature_swarm",
        "bug",
        60,
        ids::CREATURE,
        &[("count", Number(3.0)), ("speed", Number(80.0))],
        false
    ),
    malus!("hardcore", "crosshair", 0, ids::HARDCORE_LAUNCH, &[], true),
];

/// Result of a random draw; immutable once computed
#[derive(Debug, Clone, PartialEq)]
pub struct MalusConfiguration {
    selected: Vec<MalusEntry>,
    multiplier: f64,
}

impl MalusConfiguration {
    pub fn new(selected: Vec<MalusEntry>) -> Self {
        let multiplier = calculate_malus_multiplier(&selected);
        Self {
            selected,
            multiplier,
        }
    }

    /// No maluses, multiplier 1
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn selected_maluses(&self) -> &[MalusEntry] {
        &self.selected
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Switch on every selected feature with its overrides.
    /// Returns the prior state so the round can restore it.
    pub fn apply(&self, registry: &mut FeatureRegistry) -> FeatureSnapshot {
        let snapshot = registry.snapshot();
        for entry in &self.selected {
            registry.set_enabled(entry.feature_id, true);
            for &(key, value) in entry.feature_params {
                registry.set_parameter(entry.feature_id, key, value);
            }
            log::info!("Malus {} active (+{}%)", entry.id, entry.bonus_percent);
        }
        snapshot
    }
}

/// `(1 + Σ bonus / 100) × (2 if any hardcore)`
pub fn calculate_malus_multiplier<'a>(selected: impl IntoIterator<Item = &'a MalusEntry>) -> f64 {
    let mut bonus = 0u32;
    let mut hardcore = false;
    for entry in selected {
        if entry.is_hardcore {
            hardcore = true;
        } else {
            bonus += entry.bonus_percent;
        }
    }
    let base = 1.0 + f64::from(bonus) / 100.0;
    if hardcore { base * 2.0 } else { base }
}

/// Walk an already-shuffled pool, taking entries until `target` are chosen.
/// Only the first creature variant encountered is taken.
pub fn select_maluses<'a>(
    shuffled: impl IntoIterator<Item = &'a MalusEntry>,
    target: usize,
) -> Vec<MalusEntry> {
    let mut selected: Vec<MalusEntry> = Vec::with_capacity(target);
    for entry in shuffled {
        if selected.len() >= target {
            break;
        }
        if entry.is_creature() && selected.iter().any(MalusEntry::is_creature) {
            continue;
        }
        selected.push(entry.clone());
    }
    selected
}

/// Draw a random configuration of `min_count..=max_count` maluses
pub fn generate_random_malus_config<R: Rng>(
    rng: &mut R,
    min_count: usize,
    max_count: usize,
) -> MalusConfiguration {
    let mut pool: Vec<&MalusEntry> = MALUS_POOL.iter().collect();
    pool.shuffle(rng);

    let (lo, hi) = (min_count.min(max_count), min_count.max(max_count));
    let target = rng.random_range(lo..=hi);
    let config = MalusConfiguration::new(select_maluses(pool, target));
    log::info!(
        "Drew {} malus(es), multiplier x{:.2}",
        config.selected.len(),
        config.multiplier
    );
    config
}

/// Default draw: 2 to 4 maluses
pub fn generate_default_malus_config<R: Rng>(rng: &mut R) -> MalusConfiguration {
    generate_random_malus_config(rng, 2, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Persistence;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::rc::Rc;

    fn entry(bonus: u32, hardcore: bool) -> MalusEntry {
        MalusEntry {
            id: "test",
            name_key: "",
            description_key: "",
            icon: "",
            bonus_percent: bonus,
            feature_id: ids::WABI_SABI,
            feature_params: &[],
            is_hardcore: hardcore,
        }
    }

    #[test]
    fn test_multiplier_exact() {
        let mut selected = vec![entry(50, false), entry(25, false)];
        assert_eq!(calculate_malus_multiplier(&selected), 1.75);
        selected.push(entry(0, true));
        assert_eq!(calculate_malus_multiplier(&selected), 3.5);
    }

    #[test]
    fn test_hardcore_bonus_not_added() {
        assert_eq!(calculate_malus_multiplier(&[entry(40, true)]), 2.0);
        assert_eq!(calculate_malus_multiplier(std::iter::empty()), 1.0);
    }

    #[test]
    fn test_select_skips_second_creature() {
        let order: Vec<&MalusEntry> = ["lone_creature", "creature_swarm", "wabi_sabi", "hardcore"]
            .iter()
            .map(|id| MALUS_POOL.iter().find(|m| m.id == *id).unwrap())
            .collect();
        let picked = select_maluses(order, 3);
        let ids: Vec<_> = picked.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["lone_creature", "wabi_sabi", "hardcore"]);
    }

    #[test]
    fn test_select_stops_at_target() {
        assert_eq!(select_maluses(MALUS_POOL, 2).len(), 2);
        assert!(select_maluses(MALUS_POOL, 0).is_empty());
    }

    #[test]
    fn test_random_draws_respect_invariants() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let config = generate_random_malus_config(&mut rng, 2, 4);
            let n = config.selected_maluses().len();
            assert!((2..=4).contains(&n));
            let creatures = config.selected_maluses().iter().filter(|m| m.is_creature()).count();
            assert!(creatures <= 1);
            assert_eq!(
                config.multiplier(),
                calculate_malus_multiplier(config.selected_maluses())
            );
        }
    }

    #[test]
    fn test_same_seed_same_draw() {
        let a = generate_default_malus_config(&mut Pcg32::seed_from_u64(42));
        let b = generate_default_malus_config(&mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_apply_and_restore() {
        let mut registry = FeatureRegistry::new(Rc::new(Persistence::in_memory()));
        registry.init();
        let swarm = MALUS_POOL.iter().find(|m| m.id == "creature_swarm").unwrap();
        let config = MalusConfiguration::new(vec![swarm.clone()]);

        let snapshot = config.apply(&mut registry);
        assert!(registry.is_enabled(ids::CREATURE));
        assert_eq!(registry.number(ids::CREATURE, "count"), Some(3.0));

        registry.restore(snapshot);
        assert!(!registry.is_enabled(ids::CREATURE));
        assert_eq!(registry.number(ids::CREATURE, "count"), Some(1.0));
    }
}
