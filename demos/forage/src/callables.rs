//! Compiled callables referenced by the embedded network descriptions.

use std::f64::consts::PI;

use bn_core::{AgentId, AgentState, BehaviorId, Command, SimContext, Vec2};
use bn_network::{CallableRegistry, DynamicExpression, Parameters, action, excitation};

/// Agent id of the predator in the demo world.
pub const PREDATOR: AgentId = AgentId(2);

/// Distance below which foragers start to panic.
const ALARM_RADIUS: f64 = 8.0;

const FORAGER_SPEED: f64 = 1.0;
const FLEE_SPEED:    f64 = 2.5;
const CHASE_SPEED:   f64 = 1.8;

/// Heading from `from` towards `to`.
fn bearing(from: Vec2, to: Vec2) -> f64 {
    Vec2::new(to.x - from.x, to.y - from.y).angle()
}

fn predator_distance(ctx: &SimContext<'_>) -> f64 {
    ctx.world
        .get(PREDATOR.index())
        .map_or(f64::INFINITY, |p| p.position.distance(ctx.state.position))
}

/// Nearest agent other than the caller, if any.
fn nearest_other<'a>(ctx: &SimContext<'a>) -> Option<&'a AgentState> {
    ctx.others()
        .map(|(_, s)| s)
        .min_by(|a, b| {
            let da = a.position.distance(ctx.state.position);
            let db = b.position.distance(ctx.state.position);
            da.total_cmp(&db)
        })
}

/// Every excitation, action and dynamic expression the demo descriptions use.
pub fn registry() -> CallableRegistry {
    let mut reg = CallableRegistry::new();

    // ── Forager ───────────────────────────────────────────────────────────
    reg.register_excitation(
        "threat",
        excitation(|ctx| (1.0 - predator_distance(ctx) / ALARM_RADIUS).clamp(0.0, 1.0)),
    );
    reg.register_excitation("hunger", excitation(|ctx| ctx.state.var("hunger")));
    reg.register_action(
        "run_away",
        action(|ctx, _rng| {
            let Some(pred) = ctx.world.get(PREDATOR.index()) else {
                return vec![];
            };
            let away = bearing(pred.position, ctx.state.position);
            vec![Command::new(FLEE_SPEED, away)]
        }),
    );
    reg.register_action(
        "wander",
        action(|_ctx, rng| {
            let heading = rng.gen_range(-PI..PI);
            vec![Command::new(FORAGER_SPEED, heading); 3]
        }),
    );

    // ── Predator ──────────────────────────────────────────────────────────
    reg.register_excitation("prey_near", excitation(|ctx| if nearest_other(ctx).is_some() { 1.0 } else { 0.0 }));
    reg.register_excitation("restless", excitation(|_| 0.4));
    reg.register_action(
        "chase",
        action(|ctx, _rng| match nearest_other(ctx) {
            Some(prey) => vec![Command::new(CHASE_SPEED, bearing(ctx.state.position, prey.position))],
            None => vec![],
        }),
    );
    reg.register_action("drift", action(|_ctx, _rng| vec![Command::new(0.5, PI / 2.0)]));

    // Panic overrides the matrix: fleeing suppresses foraging outright once
    // the predator is inside the alarm radius.
    reg.register_dynamic(
        "panic_matrix",
        DynamicExpression::new(|ctx, ids: &[BehaviorId]| {
            let n = ids.len();
            let near = predator_distance(ctx) < ALARM_RADIUS;
            let mut m = vec![vec![0.0; n]; n];
            if n == 2 && near {
                m[0][1] = 0.9;
            }
            Ok(Parameters::Coefficients(m))
        })
        .func,
    );
    reg
}
