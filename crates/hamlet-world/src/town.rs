//! The town aggregate economy.
//!
//! Each update runs in a fixed order:
//!
//! 1. **Resources** -- members consume food, water, and energy; stores with
//!    healthy stock regenerate food.
//! 2. **Happiness** -- resource, building, and density signals nudge
//!    happiness up or down.
//! 3. **Population** -- members whose pool slot was released are dropped
//!    from the roster.
//! 4. **Buildings** -- stores restock, food producers feed the town, banks
//!    run interest.
//!
//! Every resource and the happiness level are clamped to `[0, 100]` after
//! each mutation.

use std::collections::BTreeSet;

use hamlet_bank::{BankConfig, MonetaryPolicy};
use hamlet_types::{
    AgentHandle, BuildingId, BuildingKind, LEVEL_MAX, Position, Resources, TownId,
};
use rand::Rng;
use tracing::debug;

use crate::building::{Building, BuildingState};
use crate::config::TownConfig;
use crate::error::WorldError;

/// What one [`Town::update`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TownUpdate {
    /// Members dropped because their slot was released.
    pub departed: Vec<AgentHandle>,
    /// Food added by producing buildings.
    pub food_produced: f64,
    /// Store units restocked.
    pub restocked: u32,
    /// Banks whose interest timer fired.
    pub banks_charged: u32,
}

/// A town: roster, buildings, resources, and happiness.
#[derive(Debug, Clone)]
pub struct Town {
    /// Unique ID.
    pub id: TownId,
    /// Display name.
    pub name: String,
    /// Centre of the town.
    pub position: Position,
    /// Radius of the town's walkable area.
    pub radius: f64,
    /// Shared supplies, each in `[0, 100]`.
    pub resources: Resources,
    /// Happiness in `[0, 100]`.
    pub happiness: f64,
    members: BTreeSet<AgentHandle>,
    buildings: Vec<Building>,
    mayor: Option<AgentHandle>,
    config: TownConfig,
    bank_config: BankConfig,
}

impl Town {
    /// Found a town with full resources and full happiness.
    pub fn new(
        id: TownId,
        name: impl Into<String>,
        position: Position,
        config: TownConfig,
        bank_config: BankConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            radius: config.radius,
            resources: Resources::default(),
            happiness: LEVEL_MAX,
            members: BTreeSet::new(),
            buildings: Vec::new(),
            mayor: None,
            config,
            bank_config,
        }
    }

    /// The town's tunables.
    pub const fn config(&self) -> &TownConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Number of members on the roster.
    pub fn population(&self) -> usize {
        self.members.len()
    }

    /// Members in slot order.
    pub fn members(&self) -> impl Iterator<Item = AgentHandle> + '_ {
        self.members.iter().copied()
    }

    /// Whether `agent` is on the roster.
    pub fn is_member(&self, agent: AgentHandle) -> bool {
        self.members.contains(&agent)
    }

    /// Put `agent` on the roster.
    pub fn add_member(&mut self, agent: AgentHandle) -> Result<(), WorldError> {
        if !self.members.insert(agent) {
            return Err(WorldError::AlreadyMember {
                town: self.id,
                agent,
            });
        }
        Ok(())
    }

    /// Take `agent` off the roster, clearing every role it held here.
    pub fn remove_member(&mut self, agent: AgentHandle) -> Result<(), WorldError> {
        if !self.members.remove(&agent) {
            return Err(WorldError::NotMember {
                town: self.id,
                agent,
            });
        }
        self.forget(agent);
        Ok(())
    }

    /// Whether `pos` lies within the town's radius.
    pub fn contains(&self, pos: Position) -> bool {
        self.position.distance(pos) <= self.radius
    }

    // -----------------------------------------------------------------------
    // Mayor
    // -----------------------------------------------------------------------

    /// The current mayor.
    pub const fn mayor(&self) -> Option<AgentHandle> {
        self.mayor
    }

    /// Install a mayor. Only members can hold the office.
    pub fn set_mayor(&mut self, agent: AgentHandle) -> Result<(), WorldError> {
        if !self.is_member(agent) {
            return Err(WorldError::NotMember {
                town: self.id,
                agent,
            });
        }
        self.mayor = Some(agent);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Buildings
    // -----------------------------------------------------------------------

    /// All buildings, in the order they were added.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Number of buildings.
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Look up a building.
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Look up a building for mutation.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    /// Add a building and claim it for this town.
    pub fn add_building(&mut self, mut building: Building) -> BuildingId {
        building.town = Some(self.id);
        let id = building.id;
        self.buildings.push(building);
        id
    }

    /// Build a finished `kind` at `position` with a fresh ID.
    pub fn construct<R: Rng + ?Sized>(
        &mut self,
        kind: BuildingKind,
        position: Position,
        rng: &mut R,
    ) -> BuildingId {
        let state = BuildingState::for_kind(kind, &self.config.buildings, &self.bank_config, rng);
        let id = BuildingId::from_random_bytes(rng.random());
        self.add_building(Building::new(id, kind, position, state))
    }

    /// Open a construction site for `kind` at `position`.
    pub fn start_construction<R: Rng + ?Sized>(
        &mut self,
        kind: BuildingKind,
        position: Position,
        rng: &mut R,
    ) -> BuildingId {
        let id = BuildingId::from_random_bytes(rng.random());
        self.add_building(Building::construction_site(id, kind, position))
    }

    /// Add `amount` of work to a construction site.
    ///
    /// Returns `true` when this work completed the building, which then
    /// takes on its kind's finished state.
    pub fn advance_construction<R: Rng + ?Sized>(
        &mut self,
        id: BuildingId,
        amount: f64,
        rng: &mut R,
    ) -> Result<bool, WorldError> {
        let target = self.config.buildings.construction_target;
        let building = self
            .buildings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(WorldError::BuildingNotFound(id))?;
        let BuildingState::Construction { progress } = &mut building.state else {
            return Err(WorldError::NotUnderConstruction(id));
        };
        *progress += amount.max(0.0);
        if *progress < target {
            return Ok(false);
        }
        building.state =
            BuildingState::for_kind(building.kind, &self.config.buildings, &self.bank_config, rng);
        debug!(town = %self.name, building = %id, kind = ?building.kind, "construction completed");
        Ok(true)
    }

    /// Remove a building and release it from the town.
    pub fn remove_building(&mut self, id: BuildingId) -> Result<Building, WorldError> {
        let idx = self
            .buildings
            .iter()
            .position(|b| b.id == id)
            .ok_or(WorldError::BuildingNotFound(id))?;
        let mut building = self.buildings.remove(idx);
        building.town = None;
        Ok(building)
    }

    /// Closest building to `pos` accepted by `filter`.
    ///
    /// Ties go to the building added first.
    pub fn find_nearest_building(
        &self,
        pos: Position,
        filter: impl Fn(&Building) -> bool,
    ) -> Option<&Building> {
        self.buildings
            .iter()
            .filter(|b| filter(b))
            .fold(None, |best: Option<(&Building, f64)>, b| {
                let d = pos.distance(b.position);
                match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((b, d)),
                }
            })
            .map(|(b, _)| b)
    }

    /// Store-family buildings.
    pub fn stores(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter().filter(|b| b.is_store())
    }

    /// Banks.
    pub fn banks(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter().filter(|b| b.is_bank())
    }

    /// Sell one unit of food from a store.
    ///
    /// Requires at least one unit in stock. Decrements inventory and counts
    /// the customer.
    pub fn sell_food(&mut self, store: BuildingId) -> Result<(), WorldError> {
        let building = self
            .building_mut(store)
            .ok_or(WorldError::BuildingNotFound(store))?;
        let state = building.store_mut().ok_or(WorldError::NotAStore(store))?;
        if state.inventory == 0 {
            return Err(WorldError::OutOfStock(store));
        }
        state.inventory = state.inventory.saturating_sub(1);
        state.customers = state.customers.saturating_add(1);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Economy
    // -----------------------------------------------------------------------

    /// Add food, then clamp.
    pub fn add_food(&mut self, amount: f64) {
        self.resources.food += amount;
        self.resources.clamp();
    }

    /// Raise happiness by `amount`, then clamp.
    pub fn adjust_happiness(&mut self, amount: f64) {
        self.happiness = (self.happiness + amount).clamp(0.0, LEVEL_MAX);
    }

    /// Members consume resources; well-stocked stores regenerate food.
    pub fn update_resources(&mut self, dt_ms: f64) {
        let cfg = &self.config;
        let rate = self.members.len() as f64 * cfg.consumption_rate * dt_ms;

        self.resources.food -= rate;
        self.resources.water -= rate * cfg.water_factor;
        self.resources.energy -= rate * cfg.energy_factor;
        self.resources.clamp();

        let regenerating = self
            .buildings
            .iter()
            .filter_map(Building::store)
            .filter(|s| s.inventory > cfg.store_regen_threshold)
            .count();
        self.resources.food += regenerating as f64 * cfg.store_regen_rate * dt_ms;
        self.resources.clamp();
    }

    /// Nudge happiness from resources, buildings, and crowding.
    pub fn update_happiness(&mut self, dt_ms: f64) {
        let cfg = &self.config;
        let resource_factor = self.resources.total() / (3.0 * LEVEL_MAX);
        let building_count = self.buildings.len();
        let density = self.members.len() as f64 / building_count.max(1) as f64;

        let mut change = if resource_factor < cfg.resource_threshold {
            -cfg.resource_adjustment
        } else {
            cfg.resource_adjustment
        };
        if building_count == 0 {
            change -= cfg.building_penalty;
        }
        if density > cfg.density_threshold {
            change -= cfg.density_penalty;
        }

        let delta = change * dt_ms * cfg.time_scale;
        self.adjust_happiness(delta);
    }

    /// Drop members for which `is_alive` is false.
    ///
    /// Returns the dropped handles in slot order.
    pub fn reconcile_population(&mut self, is_alive: impl Fn(AgentHandle) -> bool) -> Vec<AgentHandle> {
        let departed: Vec<AgentHandle> = self.members.iter().copied().filter(|h| !is_alive(*h)).collect();
        for handle in &departed {
            self.members.remove(handle);
            self.forget(*handle);
        }
        departed
    }

    /// Advance every building by `dt_ms`, crediting produced food.
    pub fn update_buildings(&mut self, dt_ms: f64, policy: MonetaryPolicy) -> TownUpdate {
        let mut summary = TownUpdate::default();
        for building in &mut self.buildings {
            let result = building.update(dt_ms, &self.config.buildings, policy);
            summary.food_produced += result.food_produced;
            summary.restocked = summary.restocked.saturating_add(result.restocked);
            if result.bank.is_some_and(|b| b.interest_applied) {
                summary.banks_charged = summary.banks_charged.saturating_add(1);
            }
        }
        self.add_food(summary.food_produced);
        summary
    }

    /// One full town update: resources, happiness, population, buildings.
    pub fn update(
        &mut self,
        dt_ms: f64,
        policy: MonetaryPolicy,
        is_alive: impl Fn(AgentHandle) -> bool,
    ) -> TownUpdate {
        self.update_resources(dt_ms);
        self.update_happiness(dt_ms);
        let departed = self.reconcile_population(is_alive);
        let mut summary = self.update_buildings(dt_ms, policy);
        summary.departed = departed;
        summary
    }

    /// Clear mayoral office and store jobs held by `agent`.
    fn forget(&mut self, agent: AgentHandle) {
        if self.mayor == Some(agent) {
            self.mayor = None;
        }
        for store in self.buildings.iter_mut().filter_map(Building::store_mut) {
            store.employees.remove(&agent);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn town() -> Town {
        Town::new(
            TownId::from_random_bytes([9; 16]),
            "Testville",
            Position::new(0.0, 0.0),
            TownConfig::default(),
            BankConfig::default(),
        )
    }

    fn populate(t: &mut Town, n: u32) {
        for i in 0..n {
            t.add_member(AgentHandle::new(i, 0)).unwrap();
        }
    }

    fn farm(t: &mut Town) -> BuildingId {
        let mut rng = SmallRng::seed_from_u64(3);
        t.construct(BuildingKind::Farm, Position::default(), &mut rng)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn new_town_starts_full() {
        let t = town();
        assert_eq!(t.population(), 0);
        assert!(close(t.happiness, 100.0));
        assert!(close(t.resources.total(), 300.0));
        assert!(close(t.radius, 200.0));
        assert!(t.mayor().is_none());
    }

    #[test]
    fn consumption_scales_with_population() {
        let mut t = town();
        populate(&mut t, 10);
        t.update_resources(1000.0);
        assert!(close(t.resources.food, 90.0));
        assert!(close(t.resources.water, 95.0));
        assert!(close(t.resources.energy, 92.5));
    }

    #[test]
    fn resources_never_go_negative() {
        let mut t = town();
        populate(&mut t, 1000);
        t.resources = Resources {
            food: 5.0,
            water: 3.0,
            energy: 2.0,
        };
        t.update_resources(1000.0);
        assert!(close(t.resources.total(), 0.0));
    }

    #[test]
    fn stocked_store_regenerates_food() {
        let mut t = town();
        let mut rng = SmallRng::seed_from_u64(4);
        let id = t.construct(BuildingKind::Store, Position::default(), &mut rng);
        t.building_mut(id).unwrap().store_mut().unwrap().inventory = 51;
        t.resources = Resources::uniform(90.0);
        t.update_resources(1000.0);
        assert!(close(t.resources.food, 100.0));
        assert!(close(t.resources.water, 90.0));
    }

    #[test]
    fn low_resources_lower_happiness() {
        let mut t = town();
        populate(&mut t, 10);
        for _ in 0..5 {
            farm(&mut t);
        }
        t.resources = Resources::uniform(30.0);
        t.update_happiness(1000.0);
        assert!(close(t.happiness, 99.5));
    }

    #[test]
    fn high_resources_raise_happiness() {
        let mut t = town();
        populate(&mut t, 10);
        for _ in 0..5 {
            farm(&mut t);
        }
        t.resources = Resources::uniform(90.0);
        t.happiness = 50.0;
        t.update_happiness(1000.0);
        assert!(close(t.happiness, 50.5));
    }

    #[test]
    fn crowding_lowers_happiness() {
        let mut t = town();
        populate(&mut t, 20);
        farm(&mut t);
        t.resources = Resources::uniform(50.0);
        t.happiness = 75.0;
        t.update_happiness(1000.0);
        assert!(close(t.happiness, 74.5));
    }

    #[test]
    fn no_buildings_penalty_and_clamp() {
        let mut t = town();
        t.resources = Resources::uniform(10.0);
        t.happiness = 0.2;
        t.update_happiness(1000.0);
        assert!(close(t.happiness, 0.0));
    }

    #[test]
    fn reconcile_drops_released_members_and_mayor() {
        let mut t = town();
        populate(&mut t, 3);
        t.set_mayor(AgentHandle::new(1, 0)).unwrap();
        let gone = t.reconcile_population(|h| h.index() != 1);
        assert_eq!(gone, vec![AgentHandle::new(1, 0)]);
        assert_eq!(t.population(), 2);
        assert!(t.mayor().is_none());
    }

    #[test]
    fn roster_rejects_duplicates() {
        let mut t = town();
        let h = AgentHandle::new(0, 0);
        t.add_member(h).unwrap();
        assert!(matches!(t.add_member(h), Err(WorldError::AlreadyMember { .. })));
        t.remove_member(h).unwrap();
        assert!(matches!(t.remove_member(h), Err(WorldError::NotMember { .. })));
    }

    #[test]
    fn building_add_and_remove() {
        let mut t = town();
        let id = farm(&mut t);
        assert_eq!(t.building(id).unwrap().town, Some(t.id));
        let removed = t.remove_building(id).unwrap();
        assert!(removed.town.is_none());
        assert_eq!(t.building_count(), 0);
        assert!(t.remove_building(id).is_err());
    }

    #[test]
    fn nearest_building_respects_filter() {
        let mut t = town();
        let mut rng = SmallRng::seed_from_u64(5);
        t.construct(BuildingKind::Farm, Position::new(10.0, 0.0), &mut rng);
        let far_store = t.construct(BuildingKind::Store, Position::new(100.0, 0.0), &mut rng);
        let near_store = t.construct(BuildingKind::Store, Position::new(-20.0, 0.0), &mut rng);

        let nearest = t.find_nearest_building(Position::default(), Building::is_store);
        assert_eq!(nearest.map(|b| b.id), Some(near_store));
        assert_ne!(nearest.map(|b| b.id), Some(far_store));
        assert!(t.find_nearest_building(Position::default(), Building::is_bank).is_none());
    }

    #[test]
    fn selling_food_needs_stock() {
        let mut t = town();
        let mut rng = SmallRng::seed_from_u64(6);
        let id = t.construct(BuildingKind::Store, Position::default(), &mut rng);
        t.building_mut(id).unwrap().store_mut().unwrap().inventory = 1;
        t.sell_food(id).unwrap();
        let store = t.building(id).unwrap().store().unwrap();
        assert_eq!(store.inventory, 0);
        assert_eq!(store.customers, 1);
        assert!(matches!(t.sell_food(id), Err(WorldError::OutOfStock(_))));
    }

    #[test]
    fn construction_completes_into_kind() {
        let mut t = town();
        let mut rng = SmallRng::seed_from_u64(8);
        let id = t.start_construction(BuildingKind::Bank, Position::default(), &mut rng);
        assert!(!t.advance_construction(id, 60.0, &mut rng).unwrap());
        assert!(t.advance_construction(id, 40.0, &mut rng).unwrap());
        assert!(t.building(id).unwrap().is_bank());
        assert!(matches!(
            t.advance_construction(id, 10.0, &mut rng),
            Err(WorldError::NotUnderConstruction(_))
        ));
    }

    #[test]
    fn full_update_keeps_levels_in_range() {
        let mut t = town();
        populate(&mut t, 50);
        let mut rng = SmallRng::seed_from_u64(2);
        t.construct(BuildingKind::Diner, Position::default(), &mut rng);
        for _ in 0..100 {
            t.update(500.0, MonetaryPolicy::default(), |_| true);
            for level in [t.resources.food, t.resources.water, t.resources.energy, t.happiness] {
                assert!((0.0..=100.0).contains(&level));
            }
        }
    }
}
