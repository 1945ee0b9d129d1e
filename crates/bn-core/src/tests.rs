//! Unit tests for bn-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, BehaviorId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering_breaks_ties_low_first() {
        assert!(BehaviorId(0) < BehaviorId(1));
        assert_eq!(BehaviorId(3).next(), BehaviorId(4));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(BehaviorId::default(), BehaviorId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
        assert_eq!(BehaviorId(2).to_string(), "BehaviorId(2)");
    }
}

#[cfg(test)]
mod motion {
    use std::f64::consts::FRAC_PI_2;

    use crate::{Command, Vec2};

    #[test]
    fn command_vector_along_x() {
        let v = Command::new(2.0, 0.0).to_vector();
        assert_eq!(v, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn command_vector_along_y() {
        let v = Command::new(3.0, FRAC_PI_2).to_vector();
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_is_stop() {
        assert_eq!(Command::from_vector(Vec2::ZERO), Command::STOP);
    }

    #[test]
    fn from_vector_inverts_to_vector() {
        let cmd = Command::new(1.5, 0.75);
        let back = Command::from_vector(cmd.to_vector());
        assert!((back.speed - 1.5).abs() < 1e-12);
        assert!((back.direction - 0.75).abs() < 1e-12);
    }

    #[test]
    fn displacement_scales_with_time() {
        let d = Command::new(2.0, 0.0).displacement(0.5);
        assert_eq!(d, Vec2::new(1.0, 0.0));
    }
}

#[cfg(test)]
mod state {
    use crate::{AgentState, Command, Vec2};

    #[test]
    fn apply_moves_and_records_command() {
        let mut s = AgentState::at(Vec2::new(1.0, 1.0));
        s.apply(Command::new(2.0, 0.0), 1.0);
        assert_eq!(s.position, Vec2::new(3.0, 1.0));
        assert_eq!(s.command(), Command::new(2.0, 0.0));
    }

    #[test]
    fn unset_var_reads_zero() {
        let s = AgentState::default().with_var("hunger", 0.4);
        assert_eq!(s.var("hunger"), 0.4);
        assert_eq!(s.var("thirst"), 0.0);
    }
}

#[cfg(test)]
mod context {
    use crate::{AgentId, AgentState, SimContext, Tick, Vec2};

    #[test]
    fn others_skips_self() {
        let world = vec![
            AgentState::at(Vec2::new(0.0, 0.0)),
            AgentState::at(Vec2::new(1.0, 0.0)),
            AgentState::at(Vec2::new(2.0, 0.0)),
        ];
        let ctx = SimContext::new(Tick(0), 1.0, AgentId(1), &world[1], &world);
        let ids: Vec<_> = ctx.others().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(2)]);
    }

    #[test]
    fn solo_world_contains_only_self() {
        let s = AgentState::default();
        let ctx = SimContext::solo(Tick(3), 0.5, &s);
        assert_eq!(ctx.world.len(), 1);
        assert_eq!(ctx.others().count(), 0);
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15) - Tick(10), 5u64);
        assert_eq!(Tick(15).since(Tick(5)), 10);
    }

    #[test]
    fn clock_advance_and_reset() {
        let mut clock = SimClock::new(0.5);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick, Tick(2));
        assert_eq!(clock.elapsed_secs(), 1.0);
        clock.reset();
        assert_eq!(clock.current_tick, Tick::ZERO);
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.end_tick(), Tick(cfg.max_ticks));
    }

    #[test]
    fn rejects_non_positive_tick_duration() {
        let cfg = SimConfig { tick_duration_secs: 0.0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = SimConfig { tick_duration_secs: f64::NAN, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_settle_iterations() {
        let cfg = SimConfig { settle_iterations: 0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let json = r#"{ "max_ticks": 50, "seed": 9 }"#;
        let cfg = SimConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(cfg.max_ticks, 50);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.tick_duration_secs, 1.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_invalid_config_rejected() {
        let json = r#"{ "tick_duration_secs": -1.0 }"#;
        assert!(SimConfig::from_json_reader(json.as_bytes()).is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = AgentRng::new(12345, AgentId(0));
        let mut r2 = AgentRng::new(12345, AgentId(0));
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_agents_differ() {
        let mut r0 = AgentRng::new(1, AgentId(0));
        let mut r1 = AgentRng::new(1, AgentId(1));
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b, "seeds for adjacent agents should diverge");
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = AgentRng::new(0, AgentId(0));
        for _ in 0..1000 {
            let v = rng.gen_range(-1.0f64..1.0);
            assert!((-1.0..1.0).contains(&v));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = AgentRng::new(0, AgentId(0));
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }
}
