//! Integration tests for bn-sim.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use bn_core::{AgentId, AgentState, BehaviorId, Command, SimConfig, Tick, Vec2};
use bn_mechanism::{ActionSelection, EngineError, Mechanism, MechanismKind, SystemDynamics};
use bn_network::{
    BehaviorNetwork, BehaviorSpec, DynamicExpression, Parameters, action, constant_excitation,
    fixed_tasks,
};

use crate::{
    Agent, History, NoopObserver, Playback, RunState, Scheduler, SimBuilder, SimError, SimObserver,
    numbered_agents,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config(max_ticks: u64) -> SimConfig {
    SimConfig {
        tick_duration_secs:    1.0,
        max_ticks,
        seed:                  42,
        num_threads:           Some(1),
        output_interval_ticks: 1,
        settle_iterations:     1,
    }
}

/// A network with one resumable behavior that always moves east at `speed`.
fn walker(speed: f64) -> BehaviorNetwork {
    let mut net = BehaviorNetwork::new();
    net.insert(
        BehaviorSpec::new("walk", constant_excitation(1.0), fixed_tasks(vec![Command::new(speed, 0.0)]))
            .resumable(true),
    ).unwrap();
    net
}

/// Agent 0 walks east under mutual inhibition.
fn walking_agent(speed: f64) -> Agent {
    let mut agent = Agent::new(AgentId(0), "walker").with_network(walker(speed));
    agent.bind_mechanism(Mechanism::mutual()).unwrap();
    agent
}

#[derive(Default)]
struct Recorder {
    starts:   Vec<Tick>,
    ends:     Vec<(Tick, usize)>,
    errors:   Vec<(Tick, AgentId, String)>,
    frames:   Vec<Tick>,
    finished: Option<Tick>,
}

impl SimObserver for Recorder {
    fn on_tick_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }
    fn on_tick_end(&mut self, tick: Tick, acted: usize) {
        self.ends.push((tick, acted));
    }
    fn on_snapshot(&mut self, frame: &crate::Frame) {
        self.frames.push(frame.tick);
    }
    fn on_dynamics_error(&mut self, tick: Tick, agent: AgentId, message: &str) {
        self.errors.push((tick, agent, message.to_owned()));
    }
    fn on_sim_end(&mut self, final_tick: Tick) {
        self.finished = Some(final_tick);
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod agent_tests {
    use super::*;

    #[test]
    fn new_agent_has_no_dynamics() {
        let agent = Agent::new(AgentId(3), "idle");
        assert_eq!(agent.mechanism().kind(), MechanismKind::NoDynamics);
        assert!(agent.network.is_empty());
    }

    #[test]
    fn mutual_to_cooperative_is_refused_until_cleared() {
        let mut agent = walking_agent(1.0);
        let err = agent.bind_mechanism(Mechanism::cooperative()).unwrap_err();
        assert!(matches!(err, EngineError::IncompatibleMechanism { behaviors: 1, .. }));
        assert_eq!(agent.mechanism().kind(), MechanismKind::MutualInhibition);

        agent.network.clear();
        agent.bind_mechanism(Mechanism::cooperative()).unwrap();
        assert_eq!(agent.mechanism().kind(), MechanismKind::Cooperative);
    }

    #[test]
    fn switch_through_other_mechanisms_is_still_refused() {
        let system = || Mechanism::SystemDynamics(SystemDynamics::new(|ctx| Ok(ctx.state.clone())));
        for detour in [Mechanism::NoDynamics, system()] {
            let mut agent = walking_agent(1.0);
            agent.bind_mechanism(detour).unwrap();
            let err = agent.bind_mechanism(Mechanism::cooperative()).unwrap_err();
            assert!(matches!(
                err,
                EngineError::IncompatibleMechanism { from: MechanismKind::MutualInhibition, .. }
            ));
            // Going back to the mechanism the network was built for is fine.
            agent.bind_mechanism(Mechanism::mutual()).unwrap();
        }

        let mut agent = walking_agent(1.0);
        agent.bind_mechanism(Mechanism::NoDynamics).unwrap();
        agent.network.clear();
        agent.bind_mechanism(Mechanism::cooperative()).unwrap();
    }

    #[test]
    fn step_does_not_touch_state() {
        let mut agent = walking_agent(2.0);
        let world = vec![agent.state.clone()];
        let out = agent.step(&world, Tick(0), 1.0).unwrap();
        assert_eq!(agent.state, AgentState::default());
        assert_eq!(out.result.winner(), Some(BehaviorId(0)));
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_with_initial_frame() {
        let sim = SimBuilder::new(test_config(10), numbered_agents(3)).build().unwrap();
        let history = sim.history();
        assert_eq!(history.len(), 1);
        let frame = history.get(0).unwrap();
        assert_eq!(frame.tick, Tick(0));
        assert_eq!(frame.agents.len(), 3);
    }

    #[test]
    fn agent_ids_must_match_positions() {
        let agents = vec![Agent::new(AgentId(1), "wrong")];
        let result = SimBuilder::new(test_config(10), agents).build();
        assert!(matches!(result, Err(SimError::AgentIdMismatch { index: 0, .. })));
    }

    #[test]
    fn mechanism_count_mismatch_errors() {
        let result = SimBuilder::new(test_config(10), numbered_agents(3))
            .mechanisms(vec![Mechanism::mutual(); 2])
            .build();
        assert!(matches!(
            result,
            Err(SimError::AgentCountMismatch { expected: 3, got: 2, what: "mechanisms" })
        ));
    }

    #[test]
    fn state_count_mismatch_errors() {
        let result = SimBuilder::new(test_config(10), numbered_agents(2))
            .initial_states(vec![AgentState::default()])
            .build();
        assert!(matches!(result, Err(SimError::AgentCountMismatch { .. })));
    }

    #[test]
    fn incompatible_mechanism_is_an_engine_error() {
        let result = SimBuilder::new(test_config(10), vec![walking_agent(1.0)])
            .mechanisms(vec![Mechanism::cooperative()])
            .build();
        assert!(matches!(result, Err(SimError::Engine(EngineError::IncompatibleMechanism { .. }))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = test_config(10);
        config.tick_duration_secs = 0.0;
        assert!(matches!(
            SimBuilder::new(config, numbered_agents(1)).build(),
            Err(SimError::Core(_))
        ));
    }

    #[test]
    fn settle_iterations_come_from_config() {
        let mut config = test_config(10);
        config.settle_iterations = 3;
        let sim = SimBuilder::new(config, vec![walking_agent(1.0)]).build().unwrap();
        let Mechanism::MutualInhibition(m) = sim.agents[0].mechanism() else {
            panic!("wrong mechanism");
        };
        assert_eq!(m.settle_iterations, 3);
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sim_tests {
    use super::*;

    #[test]
    fn run_moves_agent_and_records_every_tick() {
        let mut sim = SimBuilder::new(test_config(5), vec![walking_agent(2.0)]).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(sim.clock.current_tick, Tick(5));
        assert_eq!(sim.agents[0].state.position, Vec2::new(10.0, 0.0));
        assert_eq!(rec.starts, (0..5).map(Tick).collect::<Vec<_>>());
        assert!(rec.ends.iter().all(|&(_, acted)| acted == 1));
        assert_eq!(rec.frames, (1..=5).map(Tick).collect::<Vec<_>>());
        assert_eq!(rec.finished, Some(Tick(5)));

        let history = sim.history();
        assert_eq!(history.len(), 6);
        let last = history.get(5).unwrap();
        assert_eq!(last.agents[0].winner, Some(BehaviorId(0)));
        assert_eq!(last.agents[0].state.position.x, 10.0);
    }

    #[test]
    fn output_interval_filters_snapshots() {
        let mut config = test_config(6);
        config.output_interval_ticks = 3;
        let mut sim = SimBuilder::new(config, vec![walking_agent(1.0)]).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(rec.frames, vec![Tick(3), Tick(6)]);
    }

    #[test]
    fn empty_network_agent_stays_put_without_error() {
        let mut agents = numbered_agents(1);
        agents[0].bind_mechanism(Mechanism::mutual()).unwrap();
        let mut sim = SimBuilder::new(test_config(3), agents).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(sim.agents[0].state, AgentState::default());
        assert!(rec.errors.is_empty());
        assert!(rec.ends.iter().all(|&(_, acted)| acted == 0));
    }

    #[test]
    fn idle_agents_are_not_counted_as_acting() {
        let agents = vec![walking_agent(1.0), Agent::new(AgentId(1), "idle")];
        let mut sim = SimBuilder::new(test_config(3), agents).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(rec.ends.len(), 3);
        assert!(rec.ends.iter().all(|&(_, acted)| acted == 1));
    }

    #[test]
    fn discarded_tick_leaves_agents_as_they_were() {
        let mut net = BehaviorNetwork::new();
        net.insert(BehaviorSpec::new(
            "two_steps",
            constant_excitation(1.0),
            fixed_tasks(vec![Command::new(1.0, 0.0), Command::new(5.0, 0.0)]),
        ))
        .unwrap();
        let mut agent = Agent::new(AgentId(0), "stepper").with_network(net);
        agent.bind_mechanism(Mechanism::mutual()).unwrap();
        let mut sim = SimBuilder::new(test_config(10), vec![agent]).build().unwrap();

        let cancel = AtomicBool::new(true);
        assert!(!sim.advance(&mut NoopObserver, Some(&cancel)));
        assert_eq!(sim.clock.current_tick, Tick(0));
        assert_eq!(sim.history().len(), 1);
        let queue = &sim.agents[0].network.behaviors()[0].queue;
        assert!(!queue.is_primed());
        assert_eq!(queue.last(), None);

        // The first task was not consumed by the discarded tick.
        assert!(sim.advance(&mut NoopObserver, None));
        assert_eq!(sim.agents[0].state.position.x, 1.0);
        assert!(sim.advance(&mut NoopObserver, None));
        assert_eq!(sim.agents[0].state.position.x, 6.0);
    }

    #[test]
    fn agents_see_the_same_snapshot() {
        // Agent 1 copies agent 0's x position into a variable.  If agent 0's
        // move were visible mid-tick, agent 1 would see it one tick early.
        let mut follower = Agent::new(AgentId(1), "follower");
        follower
            .bind_mechanism(Mechanism::SystemDynamics(SystemDynamics::new(|ctx| {
                let leader_x = ctx.world[0].position.x;
                Ok(ctx.state.clone().with_var("seen", leader_x))
            })))
            .unwrap();
        let mut sim = SimBuilder::new(test_config(2), vec![walking_agent(1.0), follower])
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.agents[0].state.position.x, 2.0);
        assert_eq!(sim.agents[1].state.var("seen"), 1.0);
    }

    #[test]
    fn failing_agent_is_isolated() {
        let mut broken = Agent::new(AgentId(0), "broken");
        broken
            .bind_mechanism(Mechanism::SystemDynamics(SystemDynamics::new(|_| panic!("bad model"))))
            .unwrap();
        let mut healthy = walking_agent(1.0);
        healthy.id = AgentId(1);

        let mut sim = SimBuilder::new(test_config(3), vec![broken, healthy]).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(sim.agents[0].state, AgentState::default());
        assert_eq!(sim.agents[1].state.position.x, 3.0);
        assert_eq!(rec.errors.len(), 3);
        assert!(rec.errors.iter().all(|(_, agent, m)| *agent == AgentId(0) && m.contains("bad model")));
        let frame = sim.history().get(1).unwrap();
        assert!(frame.agents[0].error.is_some());
    }

    #[test]
    fn dynamic_failure_reported_once_and_run_continues() {
        let mut agent = walking_agent(1.0);
        agent.network.set_dynamic_expression(Some(DynamicExpression::new(|ctx, _| {
            if ctx.tick.0 >= 5 {
                Err("sensor offline".into())
            } else {
                Ok(Parameters::Coefficients(vec![vec![0.0]]))
            }
        })));
        let mut sim = SimBuilder::new(test_config(8), vec![agent]).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.errors.len(), 1);
        assert_eq!(rec.errors[0].0, Tick(5));
        assert!(rec.errors[0].2.contains("sensor offline"));
        assert_eq!(sim.clock.current_tick, Tick(8));
        assert_eq!(sim.agents[0].state.position.x, 8.0);
    }

    #[test]
    fn same_seed_same_result() {
        fn jittery() -> Agent {
            let mut net = BehaviorNetwork::new();
            net.insert(
                BehaviorSpec::new(
                    "wander",
                    constant_excitation(1.0),
                    action(|_, rng| vec![Command::new(1.0, rng.gen_range(-3.0..3.0))]),
                )
                .resumable(true),
            ).unwrap();
            let mut agent = Agent::new(AgentId(0), "wanderer").with_network(net);
            agent.bind_mechanism(Mechanism::mutual()).unwrap();
            agent
        }
        let run = || {
            let mut sim = SimBuilder::new(test_config(20), vec![jittery()]).build().unwrap();
            sim.run(&mut NoopObserver).unwrap();
            sim.agents[0].state.clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn run_ticks_ignores_end_tick() {
        let mut sim = SimBuilder::new(test_config(2), vec![walking_agent(1.0)]).build().unwrap();
        sim.run_ticks(4, &mut NoopObserver).unwrap();
        assert_eq!(sim.clock.current_tick, Tick(4));
        assert_eq!(sim.history().len(), 5);
    }
}

// ── History ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod history_tests {
    use super::*;

    fn filled(n: u64) -> History {
        let history = History::new();
        for k in 0..n {
            history.push(crate::Frame { tick: Tick(k), agents: Vec::new() });
        }
        history
    }

    #[test]
    fn empty_history_has_no_frames() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.frame_at(0).is_none());
        assert_eq!(history.latest_tick(), None);
    }

    #[test]
    fn frame_at_clamps_to_latest() {
        let history = filled(3);
        assert_eq!(history.frame_at(1).unwrap().tick, Tick(1));
        assert_eq!(history.frame_at(99).unwrap().tick, Tick(2));
        assert!(history.get(99).is_none());
        assert_eq!(history.latest_tick(), Some(Tick(2)));
    }

    #[test]
    fn repeated_reads_are_identical() {
        let history = filled(3);
        let a = history.frame_at(2).unwrap();
        let b = history.frame_at(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn wait_for_returns_none_after_close() {
        let history = filled(1);
        history.close();
        assert!(history.wait_for(0).is_some());
        assert!(history.wait_for(5).is_none());
    }

    #[test]
    fn wait_for_wakes_on_push() {
        let history = Arc::new(History::new());
        let writer = Arc::clone(&history);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.push(crate::Frame { tick: Tick(0), agents: Vec::new() });
        });
        assert_eq!(history.wait_for(0).unwrap().tick, Tick(0));
        handle.join().unwrap();
    }

    #[test]
    fn playback_try_next_never_reads_past_end() {
        let history = Arc::new(filled(2));
        let mut playback = Playback::new(Arc::clone(&history));
        assert_eq!(playback.try_next().unwrap().tick, Tick(0));
        assert_eq!(playback.try_next().unwrap().tick, Tick(1));
        assert!(playback.try_next().is_none());
        assert_eq!(playback.cursor(), 2);
        assert_eq!(playback.current().unwrap().tick, Tick(1));
    }

    #[test]
    fn playback_stride_skips_frames() {
        let history = Arc::new(filled(5));
        history.close();
        let ticks: Vec<Tick> = Playback::new(history).with_stride(2).map(|f| f.tick).collect();
        assert_eq!(ticks, vec![Tick(0), Tick(2), Tick(4)]);
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler_tests {
    use super::*;

    #[test]
    fn run_to_completion() {
        let mut scheduler: Scheduler = Scheduler::new(test_config(1)).unwrap();
        assert_eq!(scheduler.state(), RunState::Stopped);
        scheduler.run(vec![walking_agent(1.0)], 50).unwrap();
        let report = scheduler.wait().unwrap();

        assert!(report.completed);
        assert_eq!(report.ticks, 50);
        assert_eq!(report.agents[0].state.position.x, 50.0);
        assert_eq!(scheduler.state(), RunState::Stopped);
        assert_eq!(scheduler.tick(), Tick(50));

        let history = scheduler.history();
        assert!(history.is_closed());
        for k in 0..=50 {
            let frame = history.frame_at(k).unwrap();
            assert_eq!(frame.tick, Tick(k));
            assert_eq!(history.frame_at(k).unwrap(), frame);
        }
    }

    #[test]
    fn playback_drains_whole_run() {
        let mut scheduler: Scheduler = Scheduler::new(test_config(1)).unwrap();
        scheduler.run(vec![walking_agent(1.0)], 30).unwrap();
        let ticks: Vec<Tick> = scheduler.playback().map(|f| f.tick).collect();
        assert_eq!(ticks, (0..=30).map(Tick).collect::<Vec<_>>());
        scheduler.wait().unwrap();
    }

    #[test]
    fn second_run_before_collecting_is_busy() {
        let mut scheduler: Scheduler = Scheduler::new(test_config(1)).unwrap();
        scheduler.run(vec![walking_agent(1.0)], 5).unwrap();
        assert!(matches!(scheduler.run(vec![walking_agent(1.0)], 5), Err(SimError::Busy)));
        scheduler.wait().unwrap();
        scheduler.run(vec![walking_agent(1.0)], 5).unwrap();
        assert!(scheduler.wait().unwrap().completed);
    }

    #[test]
    fn wait_without_run_errors() {
        let mut scheduler: Scheduler = Scheduler::new(test_config(1)).unwrap();
        assert!(matches!(scheduler.wait(), Err(SimError::NotRunning)));
    }

    #[test]
    fn pause_freezes_and_stop_resets() {
        let mut scheduler: Scheduler = Scheduler::new(test_config(1)).unwrap();
        scheduler.run(vec![walking_agent(1.0)], u64::MAX).unwrap();
        thread::sleep(Duration::from_millis(20));

        scheduler.pause();
        assert_eq!(scheduler.state(), RunState::Paused);
        // At most the tick in flight completes after pausing.
        thread::sleep(Duration::from_millis(20));
        let frozen = scheduler.tick();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(scheduler.tick(), frozen);

        scheduler.resume();
        assert_eq!(scheduler.state(), RunState::Running);

        let report = scheduler.stop().unwrap();
        assert!(!report.completed);
        assert!(report.ticks >= frozen.0);
        assert_eq!(report.history.len(), report.ticks + 1);
        assert_eq!(report.agents[0].state.position.x, report.ticks as f64);

        assert_eq!(scheduler.state(), RunState::Stopped);
        assert_eq!(scheduler.tick(), Tick(0));
        assert!(scheduler.history().is_empty());
    }

    #[test]
    fn stop_while_paused() {
        let mut scheduler: Scheduler = Scheduler::new(test_config(1)).unwrap();
        scheduler.run(vec![walking_agent(1.0)], u64::MAX).unwrap();
        scheduler.pause();
        let report = scheduler.stop().unwrap();
        assert!(!report.completed);
        assert_eq!(scheduler.state(), RunState::Stopped);
    }

    #[test]
    fn observer_comes_back_in_report() {
        let mut scheduler: Scheduler<Recorder> = Scheduler::new(test_config(1)).unwrap();
        scheduler.run_with(vec![walking_agent(1.0)], 4, Recorder::default()).unwrap();
        let report = scheduler.wait().unwrap();
        assert_eq!(report.observer.ends.len(), 4);
        assert_eq!(report.observer.finished, Some(Tick(4)));
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Any tick up to `max_ticks` reads back a frame no newer than the
        /// highest computed tick, and the same frame every time.
        #[test]
        fn reads_never_pass_computed(max_ticks in 0u64..40, reads in proptest::collection::vec(0u64..60, 1..10)) {
            let mut sim = SimBuilder::new(test_config(max_ticks), vec![walking_agent(1.0)]).build().unwrap();
            sim.run(&mut NoopObserver).unwrap();
            let history = sim.history();
            for k in reads {
                let frame = history.frame_at(k).unwrap();
                prop_assert!(frame.tick.0 <= max_ticks);
                prop_assert_eq!(frame.tick.0, k.min(max_ticks));
                prop_assert_eq!(history.frame_at(k).unwrap(), frame);
            }
        }
    }
}
