//! The labor market: deficits, assignment, and workplaces.
//!
//! For a town of population `p`, each working occupation has an ideal count
//! `ceil(p * ratio)` (at least 1). An occupation nobody holds has priority
//! 1; otherwise its priority is the unfilled share of its ideal count. The
//! highest priority wins and ties go to the lexically smallest name, so the
//! same town state always yields the same assignment.

use std::collections::BTreeMap;

use hamlet_types::{AgentHandle, BuildingId, BuildingKind, Occupation, Position, TownId};
use hamlet_world::{Building, Town};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

use crate::agent::Agent;
use crate::config::OccupationConfig;
use crate::pool::AgentPool;

/// Priorities within this distance of each other count as a tie.
const PRIORITY_EPSILON: f64 = 1e-12;

/// Count occupations held by members of `town`, excluding children.
pub fn occupation_counts(pool: &AgentPool, town: TownId) -> BTreeMap<Occupation, usize> {
    let mut counts = BTreeMap::new();
    for (_, agent) in pool.iter() {
        if agent.town == Some(town) && agent.occupation != Occupation::Child {
            let entry = counts.entry(agent.occupation).or_insert(0_usize);
            *entry = entry.saturating_add(1);
        }
    }
    counts
}

/// Hiring priority of `occupation` in `[0, 1]`.
pub fn priority(
    occupation: Occupation,
    population: usize,
    counts: &BTreeMap<Occupation, usize>,
    config: &OccupationConfig,
) -> f64 {
    let current = counts.get(&occupation).copied().unwrap_or(0);
    if current == 0 {
        return 1.0;
    }
    let ideal = (population as f64 * config.ratio(occupation)).ceil().max(1.0);
    (ideal - current as f64).max(0.0) / ideal
}

/// The occupation with the largest deficit.
pub fn select_occupation(
    population: usize,
    counts: &BTreeMap<Occupation, usize>,
    config: &OccupationConfig,
) -> Occupation {
    let mut best: Option<(Occupation, f64)> = None;
    for occupation in Occupation::WORKING {
        let p = priority(occupation, population, counts, config);
        best = match best {
            None => Some((occupation, p)),
            Some((current, best_p)) => {
                let tie = (p - best_p).abs() < PRIORITY_EPSILON;
                if (!tie && p > best_p) || (tie && occupation.name() < current.name()) {
                    Some((occupation, p))
                } else {
                    best
                }
            }
        };
    }
    best.map_or(Occupation::Farmer, |(o, _)| o)
}

/// Pick an occupation for an adult: the town's largest deficit, or a
/// uniform draw with no town.
pub fn market_occupation(
    pool: &AgentPool,
    town: Option<&Town>,
    config: &OccupationConfig,
    rng: &mut impl Rng,
) -> Occupation {
    match town {
        Some(t) => select_occupation(t.population(), &occupation_counts(pool, t.id), config),
        None => Occupation::WORKING.choose(rng).copied().unwrap_or(Occupation::Farmer),
    }
}

/// Re-derive `handle`'s occupation from its town's market.
///
/// The agent's current job is left out of the town's counts, so it is
/// judged against the other members only.
pub fn reassign_occupation(
    pool: &AgentPool,
    handle: AgentHandle,
    town: Option<&Town>,
    config: &OccupationConfig,
    rng: &mut impl Rng,
) -> Occupation {
    let Some(t) = town else {
        return market_occupation(pool, None, config, rng);
    };
    let mut counts = occupation_counts(pool, t.id);
    if let Some(agent) = pool.get(handle).filter(|a| a.town == Some(t.id))
        && let Some(held) = counts.get_mut(&agent.occupation)
    {
        *held = held.saturating_sub(1);
    }
    select_occupation(t.population(), &counts, config)
}

/// The building an occupation reports to, nearest to `from`.
pub fn workplace_for(occupation: Occupation, town: &Town, from: Position) -> Option<BuildingId> {
    let filter: fn(&Building) -> bool = match occupation {
        Occupation::Farmer => Building::is_farm,
        Occupation::Merchant => Building::is_store,
        Occupation::Teacher => |b: &Building| b.kind == BuildingKind::School && !b.is_under_construction(),
        Occupation::Builder => Building::is_under_construction,
        _ => return None,
    };
    town.find_nearest_building(from, filter).map(|b| b.id)
}

/// Switch `agent` to `occupation`, moving its store job with it.
///
/// Returns the previous occupation when it changed.
pub fn change_occupation(
    agent: &mut Agent,
    handle: AgentHandle,
    town: Option<&mut Town>,
    occupation: Occupation,
) -> Option<Occupation> {
    let previous = agent.occupation;
    if previous == occupation {
        return None;
    }
    agent.occupation = occupation;
    agent.workplace = None;

    if let Some(town) = town {
        if previous == Occupation::Merchant {
            for b in town.stores().map(|b| b.id).collect::<Vec<_>>() {
                if let Some(store) = town.building_mut(b).and_then(Building::store_mut) {
                    store.employees.remove(&handle);
                }
            }
        }
        agent.workplace = workplace_for(occupation, town, agent.position);
        if occupation == Occupation::Merchant
            && let Some(store) = agent
                .workplace
                .and_then(|id| town.building_mut(id))
                .and_then(Building::store_mut)
        {
            store.employees.insert(handle);
        }
    }

    info!(agent = %agent.name, from = %previous, to = %occupation, "occupation changed");
    Some(previous)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_bank::BankConfig;
    use hamlet_world::TownConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn counts(pairs: &[(Occupation, usize)]) -> BTreeMap<Occupation, usize> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_occupation_has_top_priority() {
        let cfg = OccupationConfig::default();
        assert!((priority(Occupation::Doctor, 10, &BTreeMap::new(), &cfg) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_is_unfilled_share() {
        let cfg = OccupationConfig::default();
        // ideal = ceil(20 * 0.2) = 4; one farmer -> 3/4
        let p = priority(Occupation::Farmer, 20, &counts(&[(Occupation::Farmer, 1)]), &cfg);
        assert!((p - 0.75).abs() < 1e-9);
        // oversubscribed -> 0
        let p = priority(Occupation::Farmer, 20, &counts(&[(Occupation::Farmer, 9)]), &cfg);
        assert!(p.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_doctor_is_assigned() {
        let cfg = OccupationConfig::default();
        let held: Vec<(Occupation, usize)> = Occupation::WORKING
            .iter()
            .filter(|o| **o != Occupation::Doctor)
            .map(|o| (*o, 1))
            .collect();
        assert_eq!(select_occupation(8, &counts(&held), &cfg), Occupation::Doctor);
    }

    #[test]
    fn ties_break_lexically() {
        let cfg = OccupationConfig::default();
        // Nobody employed: every occupation has priority 1, Artist sorts first.
        assert_eq!(select_occupation(10, &BTreeMap::new(), &cfg), Occupation::Artist);
    }

    #[test]
    fn no_town_draws_a_working_occupation() {
        let pool = AgentPool::new(1);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..20 {
            let o = market_occupation(&pool, None, &OccupationConfig::default(), &mut rng);
            assert!(o.is_working());
        }
    }

    #[test]
    fn merchant_joins_and_leaves_store_staff() {
        use crate::agent::SpawnParams;
        use crate::config::AgentsConfig;

        let mut rng = SmallRng::seed_from_u64(10);
        let mut town = Town::new(
            TownId::from_random_bytes([1; 16]),
            "Tillbrook",
            Position::default(),
            TownConfig::default(),
            BankConfig::default(),
        );
        let store = town.construct(BuildingKind::Store, Position::new(5.0, 0.0), &mut rng);
        let mut agent = Agent::spawn(
            SpawnParams {
                age: Some(25.0),
                town: Some(town.id),
                ..SpawnParams::default()
            },
            &AgentsConfig::default(),
            &mut rng,
        );
        let h = AgentHandle::new(0, 0);

        let prev = change_occupation(&mut agent, h, Some(&mut town), Occupation::Merchant);
        assert_eq!(prev, Some(Occupation::Unemployed));
        assert_eq!(agent.workplace, Some(store));
        assert!(town.building(store).unwrap().store().unwrap().employees.contains(&h));

        change_occupation(&mut agent, h, Some(&mut town), Occupation::Guard);
        assert!(agent.workplace.is_none());
        assert!(town.building(store).unwrap().store().unwrap().employees.is_empty());
        assert!(change_occupation(&mut agent, h, Some(&mut town), Occupation::Guard).is_none());
    }
}
