//! Relationships and reproduction.
//!
//! Two single adults of different gender in the same town pair up when
//! they come within range and both are off cooldown. Partners walk towards
//! each other and hold position once close. While holding, the mother may
//! conceive. When the relationship timer runs out both sides are cleared
//! and each gets its own re-entry cooldown.

use hamlet_types::{Activity, AgentHandle, AgentTrait, Gender, Occupation, Thought};
use rand::Rng;
use tracing::debug;

use crate::agent::{Agent, SpawnParams, roll_between};
use crate::behavior::{AgentEvent, TickContext, town_mut};
use crate::config::LifecycleConfig;
use crate::error::AgentError;

/// Whether `agent` is free to start a relationship.
fn available(agent: &Agent, config: &LifecycleConfig) -> bool {
    agent.is_adult(config)
        && !agent.in_relationship()
        && !agent.activity.in_minigame()
        && agent.timers.relation_cooldown_ms <= 0.0
}

/// Pair `handle` with the nearest available partner in range.
///
/// Returns the partner when a relationship started.
pub fn try_form_relationship<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
) -> Result<Option<AgentHandle>, AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;
    let agent = ctx.pool.try_get(handle)?;
    if !available(agent, life) {
        return Ok(None);
    }

    let mut best: Option<(AgentHandle, f64)> = None;
    for (other_handle, other) in ctx.pool.iter() {
        if other_handle == handle
            || other.gender == agent.gender
            || other.town != agent.town
            || !available(other, life)
        {
            continue;
        }
        let d = agent.position.distance(other.position);
        if d <= life.relation_range && best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((other_handle, d));
        }
    }
    let Some((partner, _)) = best else {
        return Ok(None);
    };

    let duration = roll_between(life.relation_duration_ms, ctx.rng);
    for (me, them) in [(handle, partner), (partner, handle)] {
        let a = ctx.pool.try_get_mut(me)?;
        a.activity = Activity::InRelationship { partner: them };
        a.timers.relation_ms = duration;
        a.target = None;
        a.thought = Some(Thought::InLove);
    }
    ctx.events.push(AgentEvent::Paired { agent: handle, partner });
    Ok(Some(partner))
}

/// Keep a paired agent with its partner; end the relationship on its timer.
pub fn update_relationship<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    dt_ms: f64,
) -> Result<(), AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;
    let agent = ctx.pool.try_get(handle)?;
    let Some(partner) = agent.partner() else {
        return Ok(());
    };
    let timer = agent.timers.relation_ms;

    let partner_pos = ctx
        .pool
        .get(partner)
        .filter(|p| p.partner() == Some(handle))
        .map(|p| p.position);
    let Some(partner_pos) = partner_pos else {
        ctx.pool.try_get_mut(handle)?.activity = Activity::Idle;
        return Ok(());
    };

    if timer <= 0.0 {
        for me in [handle, partner] {
            let cooldown = roll_between(life.relation_cooldown_ms, ctx.rng);
            let a = ctx.pool.try_get_mut(me)?;
            a.activity = Activity::Idle;
            a.timers.relation_ms = 0.0;
            a.timers.relation_cooldown_ms = cooldown;
            a.thought = Some(Thought::Heartbroken);
        }
        ctx.events.push(AgentEvent::Separated { agent: handle, partner });
        return Ok(());
    }

    let a = ctx.pool.try_get_mut(handle)?;
    let close = a.position.distance(partner_pos) <= life.relation_hold_distance;
    if close {
        a.target = None;
    } else {
        let step = life.base_speed * a.speed_multiplier * dt_ms / life.reference_frame_ms;
        a.position = a.position.step_towards(partner_pos, step).0;
    }

    if close && a.gender == Gender::Feminine {
        try_reproduce(ctx, handle, partner)?;
    }
    Ok(())
}

/// Maybe conceive a child. Runs from the mother's side.
///
/// Returns the newborn's handle. A full pool skips the birth.
pub fn try_reproduce<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    mother: AgentHandle,
    father: AgentHandle,
) -> Result<Option<AgentHandle>, AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;
    let m = ctx.pool.try_get(mother)?;
    let f = ctx.pool.try_get(father)?;
    if m.timers.reproduction_cooldown_ms > 0.0
        || f.timers.reproduction_cooldown_ms > 0.0
        || m.age > life.max_mother_age
        || !m.is_adult(life)
        || !f.is_adult(life)
    {
        return Ok(None);
    }
    if !ctx.pool.has_room() {
        debug!(mother = %m.name, "birth skipped, pool full");
        return Ok(None);
    }

    let fertile = m.has_trait(AgentTrait::Fertile) || f.has_trait(AgentTrait::Fertile);
    let chance = if fertile { life.reproduction_chance * 2.0 } else { life.reproduction_chance };
    if !ctx.rng.random_bool(chance.clamp(0.0, 1.0)) {
        return Ok(None);
    }

    let params = SpawnParams {
        position: m.position,
        gender: None,
        age: Some(0.0),
        occupation: Some(Occupation::Child),
        parent: Some(mother),
        generation: m.generation.max(f.generation).saturating_add(1),
        town: m.town,
        home: m.home.or(Some(m.position)),
    };
    let mut child = Agent::spawn(params, config, ctx.rng);
    child.following = Some(mother);
    child.last_tick = ctx.tick;
    let child_name = child.name.clone();

    let Some(child_handle) = ctx.pool.acquire(child) else {
        return Ok(None);
    };

    for parent in [mother, father] {
        let p = ctx.pool.try_get_mut(parent)?;
        p.children.push(child_handle);
        p.timers.reproduction_cooldown_ms = life.reproduction_cooldown_ms;
        p.thought = Some(Thought::NewBaby);
    }
    let m = ctx.pool.try_get_mut(mother)?;
    m.followers.insert(child_handle);
    let town_id = m.town;
    if let Some(town) = town_mut(ctx.towns, town_id) {
        town.add_member(child_handle)?;
    }

    debug!(child = %child_name, "child born");
    ctx.events.push(AgentEvent::Born { child: child_handle, mother });
    Ok(Some(child_handle))
}
