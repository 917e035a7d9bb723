//! Shared type definitions for the Hamlet town simulation.
//!
//! Every crate in the workspace speaks in these types. The render views are
//! exported to `TypeScript` via `ts-rs` for browser front-ends.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, towns, and buildings
//! - [`handle`] -- Generational handles into the agent pool
//! - [`enums`] -- Occupations, traits, activities, thoughts, building and
//!   account kinds
//! - [`geometry`] -- Plane positions and stepping
//! - [`views`] -- Town resources and the render snapshots

pub mod enums;
pub mod geometry;
pub mod handle;
pub mod ids;
pub mod views;

pub use enums::{
    AccountKind, Activity, AgentTrait, BuildingKind, Gender, Minigame, Occupation, Thought,
};
pub use geometry::Position;
pub use handle::AgentHandle;
pub use ids::{AgentId, BuildingId, TownId};
pub use views::{AgentView, LEVEL_MAX, Resources, TownView};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::TownId::export_all();
        let _ = crate::ids::BuildingId::export_all();

        let _ = crate::enums::Gender::export_all();
        let _ = crate::enums::Occupation::export_all();
        let _ = crate::enums::AgentTrait::export_all();
        let _ = crate::enums::Thought::export_all();
        let _ = crate::enums::BuildingKind::export_all();
        let _ = crate::enums::AccountKind::export_all();

        let _ = crate::geometry::Position::export_all();
        let _ = crate::views::Resources::export_all();
        let _ = crate::views::AgentView::export_all();
        let _ = crate::views::TownView::export_all();
    }
}
