//! Enumeration types for the Hamlet simulation.
//!
//! Occupations, traits, activities, thoughts, and building kinds shared by
//! every crate in the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::handle::AgentHandle;

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Grammatical gender used for names and partner matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Gender {
    /// Masculine names and pairing side.
    Masculine,
    /// Feminine names and pairing side; bears children.
    Feminine,
}

impl core::fmt::Display for Gender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Masculine => write!(f, "masculine"),
            Self::Feminine => write!(f, "feminine"),
        }
    }
}

// ---------------------------------------------------------------------------
// Occupation
// ---------------------------------------------------------------------------

/// A labor role held by an agent.
///
/// `Child` is held by every agent below the working age regardless of town
/// state. `Unemployed` marks an adult who has no role and will enter the
/// labor market the next time it looks for food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Occupation {
    /// Too young to work.
    Child,
    /// Adult without a role.
    Unemployed,
    /// Tends farms and raises town food.
    Farmer,
    /// Completes construction sites.
    Builder,
    /// Patrols the town perimeter.
    Guard,
    /// Treats elderly townspeople.
    Doctor,
    /// Works the town's stores.
    Merchant,
    /// Teaches young townspeople.
    Teacher,
    /// Ministers to nearby townspeople, raising town happiness.
    Priest,
    /// Produces art with an uncertain payout.
    Artist,
}

impl Occupation {
    /// Every occupation the labor market can assign.
    pub const WORKING: [Self; 8] = [
        Self::Farmer,
        Self::Builder,
        Self::Guard,
        Self::Doctor,
        Self::Merchant,
        Self::Teacher,
        Self::Priest,
        Self::Artist,
    ];

    /// Display name; also the lexical key for market tie-breaks.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Child => "Child",
            Self::Unemployed => "Unemployed",
            Self::Farmer => "Farmer",
            Self::Builder => "Builder",
            Self::Guard => "Guard",
            Self::Doctor => "Doctor",
            Self::Merchant => "Merchant",
            Self::Teacher => "Teacher",
            Self::Priest => "Priest",
            Self::Artist => "Artist",
        }
    }

    /// Whether this occupation performs periodic work actions.
    pub const fn is_working(self) -> bool {
        !matches!(self, Self::Child | Self::Unemployed)
    }
}

impl core::fmt::Display for Occupation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A probabilistic modifier rolled at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum AgentTrait {
    /// Moves 1.5x faster; small wage bonus.
    Fast,
    /// Builds faster.
    Strong,
    /// Wage bonus; can pass traits on when teaching.
    Wise,
    /// Farms produce more food.
    GreenThumb,
    /// Drawn 1.3x larger.
    Giant,
    /// Doubles the occasional work bonus.
    Lucky,
    /// Doubles the chance of conceiving.
    Fertile,
}

impl AgentTrait {
    /// Every trait, in roll order.
    pub const ALL: [Self; 7] = [
        Self::Fast,
        Self::Strong,
        Self::Wise,
        Self::GreenThumb,
        Self::Giant,
        Self::Lucky,
        Self::Fertile,
    ];
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// An external game an agent can be pulled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Minigame {
    /// Playground tag.
    Tag,
    /// Rock, paper, scissors.
    RockPaperScissors,
}

/// What an agent is doing right now.
///
/// These are mutually exclusive. Orthogonal facts such as the mayoral flag
/// live on the agent itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Activity {
    /// Standing still.
    #[default]
    Idle,
    /// Walking toward a random target.
    Wandering,
    /// Paired with a partner.
    InRelationship {
        /// The partner's slot.
        partner: AgentHandle,
    },
    /// Playing tag.
    PlayingTag {
        /// Whether this agent is "it".
        is_it: bool,
    },
    /// Playing rock, paper, scissors.
    PlayingRps,
    /// Carrying out an occupation action.
    Working,
    /// Looking for food.
    SeekingFood,
    /// Walking to or using a bank.
    Banking,
}

impl Activity {
    /// Short label for renderers.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Wandering => "wandering",
            Self::InRelationship { .. } => "in_relationship",
            Self::PlayingTag { .. } => "playing_tag",
            Self::PlayingRps => "playing_rps",
            Self::Working => "working",
            Self::SeekingFood => "seeking_food",
            Self::Banking => "banking",
        }
    }

    /// The partner, when in a relationship.
    pub const fn partner(self) -> Option<AgentHandle> {
        match self {
            Self::InRelationship { partner } => Some(partner),
            _ => None,
        }
    }

    /// Whether the agent is inside an external minigame.
    pub const fn in_minigame(self) -> bool {
        matches!(self, Self::PlayingTag { .. } | Self::PlayingRps)
    }
}

// ---------------------------------------------------------------------------
// Thoughts
// ---------------------------------------------------------------------------

/// The thought bubble shown above an agent. Renderers translate the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Thought {
    /// Idle contentment.
    Happy,
    /// Idle gloom.
    Sad,
    /// Idle tiredness.
    Tired,
    /// Wants company.
    Socialize,
    /// Hunger passed the action threshold.
    Hungry,
    /// Just ate.
    HappyFed,
    /// Walking to a store.
    GettingFood,
    /// Walking to a parent for food.
    AskingParentForFood,
    /// Parent walking to a store for its child.
    GettingFoodForChild,
    /// Parent could not help a hungry child.
    WorriedAboutChild,
    /// Parent could not help a starving child.
    VeryWorriedAboutChild,
    /// Parent took a job to feed its child.
    MustWorkForChild,
    /// Entered the labor market.
    LookingForWork,
    /// Heading to the workplace.
    GoingToWork,
    /// No farm in town.
    NeedFarmland,
    /// Walking to the farm.
    GoingToFarm,
    /// Farming.
    TendingCrops,
    /// Guard walking the perimeter.
    Patrolling,
    /// Guard at the patrol point.
    KeepingWatch,
    /// Doctor treating a patient.
    Healing,
    /// Doctor found nobody to treat.
    NoPatients,
    /// Teacher in class.
    Teaching,
    /// Builder at a site.
    Building,
    /// Builder finished a site.
    FinishedBuilding,
    /// Merchant at the store.
    Selling,
    /// Priest with a congregation.
    Preaching,
    /// Artist at work.
    MakingArt,
    /// Walking to the bank.
    GoingToBank,
    /// Opened a new account.
    OpenedBankAccount,
    /// Deposited money.
    DepositedSavings,
    /// Paid down a loan.
    RepaidLoan,
    /// Took a loan.
    TookLoan,
    /// Paired up.
    InLove,
    /// Relationship ended.
    Heartbroken,
    /// A child was born.
    NewBaby,
    /// Joined a town.
    NewInTown,
}

impl Thought {
    /// Thoughts picked at random when nothing else is on the agent's mind.
    pub const IDLE: [Self; 4] = [Self::Happy, Self::Sad, Self::Tired, Self::Socialize];
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// The type tag of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BuildingKind {
    /// General store.
    Store,
    /// Grocery store; produces food.
    GroceryStore,
    /// Supermarket; produces food.
    Supermarket,
    /// Diner; produces food.
    Diner,
    /// Restaurant; produces food.
    Restaurant,
    /// Bank.
    Bank,
    /// Farm.
    Farm,
    /// School.
    School,
    /// Playground.
    Playground,
    /// Mall.
    Mall,
    /// Family house.
    House,
    /// Hotel.
    Hotel,
    /// Condominium.
    Condo,
}

impl BuildingKind {
    /// Whether agents can buy food here.
    pub const fn is_store(self) -> bool {
        matches!(
            self,
            Self::Store | Self::GroceryStore | Self::Supermarket | Self::Diner | Self::Restaurant
        )
    }

    /// Whether this is housing rather than a workplace.
    pub const fn is_residential(self) -> bool {
        matches!(self, Self::House | Self::Hotel | Self::Condo)
    }
}

// ---------------------------------------------------------------------------
// Bank accounts
// ---------------------------------------------------------------------------

/// The two kinds of customer account a bank offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AccountKind {
    /// Everyday account; no minimum balance.
    Checking,
    /// Interest-bearing account with a minimum balance.
    Savings,
}

impl core::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::Savings => write!(f, "savings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_occupations_exclude_child_and_unemployed() {
        assert!(!Occupation::WORKING.contains(&Occupation::Child));
        assert!(!Occupation::WORKING.contains(&Occupation::Unemployed));
        assert!(Occupation::WORKING.iter().all(|o| o.is_working()));
    }

    #[test]
    fn occupation_serializes_by_name() {
        let json = serde_json::to_string(&Occupation::Doctor).ok();
        assert_eq!(json.as_deref(), Some("\"Doctor\""));
    }

    #[test]
    fn trait_serializes_screaming_snake() {
        let json = serde_json::to_string(&AgentTrait::GreenThumb).ok();
        assert_eq!(json.as_deref(), Some("\"GREEN_THUMB\""));
    }

    #[test]
    fn partner_only_in_relationship() {
        let h = AgentHandle::new(4, 1);
        assert_eq!(Activity::InRelationship { partner: h }.partner(), Some(h));
        assert_eq!(Activity::Working.partner(), None);
    }

    #[test]
    fn store_family_is_store() {
        assert!(BuildingKind::Diner.is_store());
        assert!(!BuildingKind::Bank.is_store());
        assert!(BuildingKind::Condo.is_residential());
    }
}
