//! forage — smallest end-to-end example for the rust_bn arbitration engine.
//!
//! Two foragers share a field with a predator.  Foragers arbitrate between
//! `flee` and `forage` with mutual inhibition; the predator blends `chase`
//! and `drift` cooperatively; a fourth agent follows a fixed orbit through
//! system dynamics.  Networks are loaded from embedded JSON descriptions.
//!
//! Set `RUST_LOG=debug` to see winner changes as they happen.

mod callables;

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bn_core::{AgentId, AgentState, SimConfig, Vec2};
use bn_mechanism::{Mechanism, SystemDynamics};
use bn_network::{BehaviorNetwork, NetworkDescription};
use bn_output::{CsvWriter, SimOutputObserver};
use bn_sim::{Agent, Scheduler};

use callables::registry;

// ── Embedded inputs ───────────────────────────────────────────────────────────

const CONFIG_JSON: &str = r#"{
    "tick_duration_secs":    0.5,
    "max_ticks":             120,
    "seed":                  42,
    "output_interval_ticks": 1,
    "settle_iterations":     2
}"#;

const FORAGER_JSON: &str = r#"{
    "behaviors": [
        { "id": 0, "name": "flee",   "resumable": true,
          "excitation": "threat", "action": "run_away" },
        { "id": 1, "name": "forage", "resumable": true,
          "excitation": "hunger", "action": "wander" }
    ],
    "edges": [ { "from": 0, "to": 1, "ft": 0.6, "tf": 0.1 } ],
    "dynamic_expression": "panic_matrix"
}"#;

const PREDATOR_JSON: &str = r#"{
    "behaviors": [
        { "id": 0, "name": "chase", "resumable": true, "weight": 0.8,
          "excitation": "prey_near", "action": "chase" },
        { "id": 1, "name": "drift", "resumable": true, "weight": 0.2,
          "excitation": "restless",  "action": "drift" }
    ]
}"#;

const ORBIT_RADIUS: f64 = 5.0;

// ── World ─────────────────────────────────────────────────────────────────────

fn load_network(json: &str) -> Result<BehaviorNetwork> {
    let desc = NetworkDescription::from_json_str(json)?;
    Ok(BehaviorNetwork::from_description(&desc, &registry())?)
}

fn build_agents() -> Result<Vec<Agent>> {
    let mut agents = Vec::with_capacity(4);

    for (i, start) in [Vec2::new(0.0, 0.0), Vec2::new(3.0, -2.0)].into_iter().enumerate() {
        let mut forager = Agent::new(AgentId(i as u32), format!("forager-{i}"))
            .with_state(AgentState::at(start).with_var("hunger", 0.5))
            .with_network(load_network(FORAGER_JSON)?);
        forager.bind_mechanism(Mechanism::mutual())?;
        agents.push(forager);
    }

    let mut predator = Agent::new(callables::PREDATOR, "predator")
        .with_state(AgentState::at(Vec2::new(12.0, 6.0)))
        .with_network(load_network(PREDATOR_JSON)?);
    predator.bind_mechanism(Mechanism::cooperative())?;
    agents.push(predator);

    // Circles the origin: position is a pure function of the tick.
    let mut beacon = Agent::new(AgentId(3), "beacon")
        .with_state(AgentState::at(Vec2::new(ORBIT_RADIUS, 0.0)));
    beacon.bind_mechanism(Mechanism::SystemDynamics(SystemDynamics::new(|ctx| {
        let theta = (ctx.tick.0 + 1) as f64 * 0.1;
        let mut next = ctx.state.clone();
        next.position = Vec2::new(ORBIT_RADIUS * theta.cos(), ORBIT_RADIUS * theta.sin());
        next.heading = theta + std::f64::consts::FRAC_PI_2;
        Ok(next)
    })))?;
    agents.push(beacon);

    Ok(agents)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SimConfig::from_json_reader(CONFIG_JSON.as_bytes())?;
    let agents = build_agents()?;
    info!(agents = agents.len(), ticks = config.max_ticks, "forage demo starting");

    // 1. Output.
    let out_dir = Path::new("output/forage");
    std::fs::create_dir_all(out_dir)?;
    let observer = SimOutputObserver::new(CsvWriter::new(out_dir)?, &config);

    // 2. Run on the compute thread and follow along from this one.
    let mut scheduler: Scheduler<SimOutputObserver<CsvWriter>> = Scheduler::new(config.clone())?;
    let t0 = Instant::now();
    scheduler.run_with(agents, config.max_ticks, observer)?;

    let mut caught_at = None;
    for frame in scheduler.playback().with_stride(20) {
        let [a, b, pred, ..] = frame.agents.as_slice() else { continue };
        let closest = a.state.position.distance(pred.state.position)
            .min(b.state.position.distance(pred.state.position));
        info!(tick = %frame.tick, closest, "frame");
        if closest < 0.5 && caught_at.is_none() {
            caught_at = Some(frame.tick);
        }
    }

    let mut report = scheduler.wait()?;
    let elapsed = t0.elapsed();
    if let Some(e) = report.observer.take_error() {
        warn!("output error: {e}");
    }

    // 3. Summary.
    println!("Simulation complete in {:.3} s ({} ticks)", elapsed.as_secs_f64(), report.ticks);
    println!("  frames in history : {}", report.history.len());
    match caught_at {
        Some(t) => println!("  predator caught up by tick {t}"),
        None => println!("  foragers stayed ahead of the predator"),
    }
    println!();
    println!("{:<10} {:>8} {:>8} {:>8}", "Agent", "x", "y", "speed");
    println!("{}", "-".repeat(38));
    for agent in &report.agents {
        println!(
            "{:<10} {:>8.2} {:>8.2} {:>8.2}",
            agent.name, agent.state.position.x, agent.state.position.y, agent.state.speed,
        );
    }

    Ok(())
}
