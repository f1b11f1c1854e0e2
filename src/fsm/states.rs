//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  NORMAL ──[button]──▶ STARTUP ──[bounces done]──▶ NORMAL
//!
//!  Any state ──[T ≥ overfire_high]──▶ OVERFIRE ──[T ≤ overfire_clear]──▶ NORMAL
//! ```
//!
//! Priority inside a tick is overfire, then startup, then normal heating.
//! Every update handler tests `overfire_tripped` first; nothing else moves
//! the machine into `Overfire`.
//! A handler that takes a branch returns without evaluating the lower
//! ones, so one tick never applies the effects of two branches.

use log::{info, warn};

use super::context::FsmContext;
use super::{StateDescriptor, StateId};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Normal
        StateDescriptor {
            id: StateId::Normal,
            name: "Normal",
            on_enter: Some(normal_enter),
            on_exit: None,
            on_update: normal_update,
        },
        // Index 1: Startup
        StateDescriptor {
            id: StateId::Startup,
            name: "Startup",
            on_enter: Some(startup_enter),
            on_exit: Some(startup_exit),
            on_update: startup_update,
        },
        // Index 2: Overfire
        StateDescriptor {
            id: StateId::Overfire,
            name: "Overfire",
            on_enter: Some(overfire_enter),
            on_exit: Some(overfire_exit),
            on_update: overfire_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL state: thermostat in charge, force heat below the low threshold
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(ctx: &mut FsmContext) {
    info!(
        "NORMAL: heating below {:.1}, releasing at {:.1}",
        ctx.config.thresholds.normal_low,
        ctx.config.thresholds.normal_release()
    );
}

fn normal_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.overfire_tripped {
        return Some(StateId::Overfire);
    }

    if ctx.button_pending {
        return Some(StateId::Startup);
    }

    let th = ctx.config.thresholds;
    if ctx.temperature < th.normal_low && !ctx.force_heat_active {
        ctx.commands.force_heat = true;
        ctx.force_heat_active = true;
        info!("NORMAL: {:.1} below {:.1}, forcing heat", ctx.temperature, th.normal_low);
    } else if ctx.force_heat_active && ctx.temperature >= th.normal_release() {
        ctx.commands.force_heat = false;
        ctx.force_heat_active = false;
        info!("NORMAL: {:.1} reached {:.1}, releasing heat", ctx.temperature, th.normal_release());
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  STARTUP state: bounce between startup low and high after loading wood
// ═══════════════════════════════════════════════════════════════════════════

fn startup_enter(ctx: &mut FsmContext) {
    ctx.commands.force_heat = true;
    ctx.force_heat_active = false;
    ctx.startup_bounce_count = 0;
    info!(
        "STARTUP: forcing heat at {:.1}, {} bounce(s) between {:.1} and {:.1}",
        ctx.temperature,
        ctx.config.startup_bounce_cycles,
        ctx.config.thresholds.startup_low,
        ctx.config.thresholds.startup_high
    );
}

fn startup_exit(ctx: &mut FsmContext) {
    ctx.startup_bounce_count = 0;
    ctx.button_pending = false;
}

fn startup_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.overfire_tripped {
        return Some(StateId::Overfire);
    }

    if ctx.startup_bounce_count >= ctx.config.startup_bounce_cycles {
        info!("STARTUP: {} bounce(s) done", ctx.startup_bounce_count);
        return Some(StateId::Normal);
    }

    let th = ctx.config.thresholds;
    if ctx.temperature >= th.startup_high {
        ctx.commands.force_heat = false;
        ctx.startup_bounce_count += 1;
        info!(
            "STARTUP: {:.1} reached {:.1}, bounce {}/{}",
            ctx.temperature, th.startup_high, ctx.startup_bounce_count, ctx.config.startup_bounce_cycles
        );
    } else if ctx.temperature <= th.startup_low {
        ctx.commands.force_heat = true;
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  OVERFIRE state: shutoff energised until the flue cools to the clear point
// ═══════════════════════════════════════════════════════════════════════════

fn overfire_enter(ctx: &mut FsmContext) {
    ctx.commands.overfire_shutoff = true;
    // ForceHeat is off for the whole episode; Normal re-arms it after the
    // clear if the flue is below the low threshold.
    ctx.commands.force_heat = false;
    ctx.force_heat_active = false;
    ctx.startup_bounce_count = 0;
    ctx.button_pending = false;
    warn!(
        "OVERFIRE: {:.1} at or above {:.1}, shutoff energised",
        ctx.temperature, ctx.config.thresholds.overfire_high
    );
}

fn overfire_exit(ctx: &mut FsmContext) {
    ctx.commands.overfire_shutoff = false;
    info!("OVERFIRE: cleared at {:.1}, shutoff released", ctx.temperature);
}

fn overfire_update(ctx: &mut FsmContext) -> Option<StateId> {
    // A press seen during an overfire is dropped, not carried into Startup.
    if ctx.button_pending {
        ctx.button_pending = false;
        warn!("OVERFIRE: startup press ignored");
    }

    if ctx.overfire_tripped {
        ctx.commands.overfire_shutoff = true;
        ctx.startup_bounce_count = 0;
        return None;
    }

    if ctx.temperature <= ctx.config.thresholds.overfire_clear {
        return Some(StateId::Normal);
    }

    None
}
