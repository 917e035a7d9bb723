//! Town joining for unaffiliated agents.

use hamlet_types::{AgentHandle, Thought, TownId};
use rand::Rng;
use tracing::info;

use crate::behavior::{AgentEvent, TickContext, assign, town_ref};
use crate::error::AgentError;
use crate::occupation::reassign_occupation;

/// Join the least populated town in reach, if the agent has none.
///
/// A town is in reach within `join_radius_factor` times its radius. Ties
/// on population go to the closer town. Joining re-derives the agent's
/// occupation from the new town's labor market, counting only the other
/// members.
pub fn try_join_town<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
) -> Result<Option<TownId>, AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;
    let agent = ctx.pool.try_get(handle)?;
    if agent.town.is_some() || agent.age < life.join_age {
        return Ok(None);
    }

    let pos = agent.position;
    let chosen = ctx
        .towns
        .iter()
        .map(|t| (t, pos.distance(t.position)))
        .filter(|(t, d)| *d <= t.radius * life.join_radius_factor)
        .fold(None, |best: Option<(TownId, usize, f64)>, (t, d)| {
            let pop = t.population();
            match best {
                Some((_, best_pop, best_d)) if best_pop < pop || (best_pop == pop && best_d <= d) => best,
                _ => Some((t.id, pop, d)),
            }
        });
    let Some((town_id, _, _)) = chosen else {
        return Ok(None);
    };

    let town = ctx
        .towns
        .iter_mut()
        .find(|t| t.id == town_id)
        .ok_or(AgentError::TownNotFound(town_id))?;
    town.add_member(handle)?;
    let town_name = town.name.clone();
    let town_pos = town.position;

    let agent = ctx.pool.try_get_mut(handle)?;
    agent.town = Some(town_id);
    agent.home.get_or_insert(town_pos);
    agent.thought = Some(Thought::NewInTown);
    let adult = !agent.is_child(life);
    info!(agent = %agent.name, town = %town_name, "joined town");

    if adult {
        let occupation = reassign_occupation(
            ctx.pool,
            handle,
            town_ref(ctx.towns, Some(town_id)),
            &config.occupations,
            ctx.rng,
        );
        assign(ctx, handle, occupation)?;
    }
    ctx.events.push(AgentEvent::JoinedTown { agent: handle, town: town_id });
    Ok(Some(town_id))
}
