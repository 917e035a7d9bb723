//! Buildings and their per-kind state.
//!
//! Every building carries a [`BuildingKind`] tag and a [`BuildingState`]
//! holding the fields that kind needs. A construction site keeps the kind
//! it will become and swaps in that kind's state on completion.

use std::collections::BTreeSet;

use hamlet_bank::{Bank, BankConfig, BankUpdate, MonetaryPolicy};
use hamlet_types::{AgentHandle, BuildingId, BuildingKind, Position, TownId};
use rand::Rng;

use crate::config::{BuildingConfig, ResidentialRange};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Inventory and staff of a store-family building.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    /// Food units on the shelves.
    pub inventory: u32,
    /// Milliseconds until the next restock.
    pub restock_timer_ms: f64,
    /// Purchases made here. Starts at zero.
    pub customers: u32,
    /// Merchants working here.
    pub employees: BTreeSet<AgentHandle>,
}

impl StoreState {
    /// A fully stocked store.
    pub const fn new(config: &BuildingConfig) -> Self {
        Self {
            inventory: config.store_max_inventory,
            restock_timer_ms: config.restock_interval_ms,
            customers: 0,
            employees: BTreeSet::new(),
        }
    }

    /// Add one restock delivery, capped at the maximum. Returns units added.
    pub fn restock(&mut self, config: &BuildingConfig) -> u32 {
        if self.inventory >= config.store_max_inventory {
            return 0;
        }
        let next = self
            .inventory
            .saturating_add(config.restock_amount)
            .min(config.store_max_inventory);
        let added = next.saturating_sub(self.inventory);
        self.inventory = next;
        added
    }

    /// Whether stock has fallen below the low-stock mark.
    pub const fn needs_supplies(&self, config: &BuildingConfig) -> bool {
        self.inventory < config.low_stock_threshold
    }
}

// ---------------------------------------------------------------------------
// Building state
// ---------------------------------------------------------------------------

/// Kind-specific building data.
#[derive(Debug, Clone)]
pub enum BuildingState {
    /// Store, grocery, supermarket, diner, or restaurant.
    Store(StoreState),
    /// A bank and its ledger.
    Bank(Box<Bank>),
    /// Farmland.
    Farm,
    /// Housing.
    Residential {
        /// Number of residents it holds.
        capacity: u32,
    },
    /// School, playground, or mall.
    Public {
        /// Number of visitors it holds.
        capacity: u32,
    },
    /// Unfinished; becomes the building's kind at the target progress.
    Construction {
        /// Work done so far.
        progress: f64,
    },
}

impl BuildingState {
    /// The finished state for `kind`.
    pub fn for_kind<R: Rng + ?Sized>(
        kind: BuildingKind,
        config: &BuildingConfig,
        bank: &BankConfig,
        rng: &mut R,
    ) -> Self {
        match kind {
            BuildingKind::Store
            | BuildingKind::GroceryStore
            | BuildingKind::Supermarket
            | BuildingKind::Diner
            | BuildingKind::Restaurant => Self::Store(StoreState::new(config)),
            BuildingKind::Bank => Self::Bank(Box::new(Bank::new(bank.clone()))),
            BuildingKind::Farm => Self::Farm,
            BuildingKind::House => Self::Residential {
                capacity: config.house_capacity,
            },
            BuildingKind::Hotel => Self::Residential {
                capacity: roll_capacity(config.hotel, rng),
            },
            BuildingKind::Condo => Self::Residential {
                capacity: roll_capacity(config.condo, rng),
            },
            BuildingKind::School | BuildingKind::Playground | BuildingKind::Mall => Self::Public {
                capacity: BuildingConfig::public_capacity(kind),
            },
        }
    }
}

fn roll_capacity<R: Rng + ?Sized>(range: ResidentialRange, rng: &mut R) -> u32 {
    let span = range.max.saturating_sub(range.min);
    let steps = span.checked_div(range.step).unwrap_or(0);
    let pick = rng.random_range(0..=steps);
    range.min.saturating_add(pick.saturating_mul(range.step))
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// What one building update produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuildingUpdate {
    /// Town food added this update.
    pub food_produced: f64,
    /// Store units restocked this update.
    pub restocked: u32,
    /// Bank interest activity, for banks.
    pub bank: Option<BankUpdate>,
}

/// A building in a town.
#[derive(Debug, Clone)]
pub struct Building {
    /// Unique ID.
    pub id: BuildingId,
    /// What the building is, or will be once built.
    pub kind: BuildingKind,
    /// Location on the plane.
    pub position: Position,
    /// Owning town, set while the building is on a town's list.
    pub town: Option<TownId>,
    /// Kind-specific data.
    pub state: BuildingState,
}

impl Building {
    /// A finished building.
    pub const fn new(id: BuildingId, kind: BuildingKind, position: Position, state: BuildingState) -> Self {
        Self {
            id,
            kind,
            position,
            town: None,
            state,
        }
    }

    /// A construction site that will become `kind`.
    pub const fn construction_site(id: BuildingId, kind: BuildingKind, position: Position) -> Self {
        Self::new(id, kind, position, BuildingState::Construction { progress: 0.0 })
    }

    /// Whether building work is still outstanding.
    pub const fn is_under_construction(&self) -> bool {
        matches!(self.state, BuildingState::Construction { .. })
    }

    /// Whether agents can buy food here.
    pub const fn is_store(&self) -> bool {
        matches!(self.state, BuildingState::Store(_))
    }

    /// Whether this is a working bank.
    pub const fn is_bank(&self) -> bool {
        matches!(self.state, BuildingState::Bank(_))
    }

    /// Whether this is working farmland.
    pub const fn is_farm(&self) -> bool {
        matches!(self.state, BuildingState::Farm)
    }

    /// Store state, for stores.
    pub const fn store(&self) -> Option<&StoreState> {
        match &self.state {
            BuildingState::Store(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable store state, for stores.
    pub const fn store_mut(&mut self) -> Option<&mut StoreState> {
        match &mut self.state {
            BuildingState::Store(s) => Some(s),
            _ => None,
        }
    }

    /// The bank ledger, for banks.
    pub fn bank(&self) -> Option<&Bank> {
        match &self.state {
            BuildingState::Bank(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Mutable bank ledger, for banks.
    pub fn bank_mut(&mut self) -> Option<&mut Bank> {
        match &mut self.state {
            BuildingState::Bank(b) => Some(b.as_mut()),
            _ => None,
        }
    }

    /// Advance timers by `dt_ms`.
    ///
    /// Stores restock on their timer and food-producing kinds report the
    /// food they made; banks run their interest timer. The caller adds
    /// `food_produced` to the town.
    pub fn update(
        &mut self,
        dt_ms: f64,
        config: &BuildingConfig,
        policy: MonetaryPolicy,
    ) -> BuildingUpdate {
        let food_rate = config.food_rate(self.kind);
        match &mut self.state {
            BuildingState::Store(store) => {
                store.restock_timer_ms -= dt_ms;
                let mut restocked = 0;
                if store.restock_timer_ms <= 0.0 {
                    restocked = store.restock(config);
                    store.restock_timer_ms = config.restock_interval_ms;
                }
                BuildingUpdate {
                    food_produced: food_rate * dt_ms,
                    restocked,
                    bank: None,
                }
            }
            BuildingState::Bank(bank) => BuildingUpdate {
                bank: Some(bank.update(dt_ms, policy)),
                ..BuildingUpdate::default()
            },
            _ => BuildingUpdate::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn store(kind: BuildingKind) -> Building {
        let cfg = BuildingConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let state = BuildingState::for_kind(kind, &cfg, &BankConfig::default(), &mut rng);
        Building::new(BuildingId::from_random_bytes([1; 16]), kind, Position::default(), state)
    }

    #[test]
    fn restock_caps_at_maximum() {
        let cfg = BuildingConfig::default();
        let mut s = StoreState::new(&cfg);
        s.inventory = 90;
        assert_eq!(s.restock(&cfg), 10);
        assert_eq!(s.inventory, 100);
        assert_eq!(s.restock(&cfg), 0);
    }

    #[test]
    fn store_restocks_on_timer() {
        let cfg = BuildingConfig::default();
        let mut b = store(BuildingKind::Store);
        if let Some(s) = b.store_mut() {
            s.inventory = 10;
        }
        let early = b.update(29_000.0, &cfg, MonetaryPolicy::default());
        assert_eq!(early.restocked, 0);
        let due = b.update(1_000.0, &cfg, MonetaryPolicy::default());
        assert_eq!(due.restocked, 20);
        assert_eq!(b.store().map(|s| s.inventory), Some(30));
    }

    #[test]
    fn diner_produces_food_plain_store_does_not() {
        let cfg = BuildingConfig::default();
        let mut diner = store(BuildingKind::Diner);
        let mut plain = store(BuildingKind::Store);
        assert!(diner.update(1_000.0, &cfg, MonetaryPolicy::default()).food_produced > 0.0);
        assert!(plain.update(1_000.0, &cfg, MonetaryPolicy::default()).food_produced.abs() < f64::EPSILON);
    }

    #[test]
    fn hotel_capacity_follows_steps() {
        let cfg = BuildingConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let state = BuildingState::for_kind(BuildingKind::Hotel, &cfg, &BankConfig::default(), &mut rng);
            assert!(matches!(
                state,
                BuildingState::Residential { capacity } if (20..=50).contains(&capacity) && capacity % 10 == 0
            ));
        }
    }

    #[test]
    fn public_capacities() {
        assert_eq!(BuildingConfig::public_capacity(BuildingKind::School), 30);
        assert_eq!(BuildingConfig::public_capacity(BuildingKind::Mall), 50);
    }
}
