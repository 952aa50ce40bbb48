//! Property tests for the simulation invariants

use cave_crystals::Tuning;
use cave_crystals::kernel::PureKernel;
use cave_crystals::sim::collision::{current_growth, grow_crystals, overflowing_lane, resolve_spores};
use cave_crystals::sim::{Crystal, Effects, Launcher, Resolution, Side, Spore, Tint, TimeDilation};
use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn pair(near: (f32, usize), far: (f32, usize)) -> Vec<Crystal> {
    vec![
        Crystal::new(0, Side::Near, near.0, near.1),
        Crystal::new(0, Side::Far, far.0, far.1),
    ]
}

proptest! {
    #[test]
    fn growth_never_shrinks(
        heights in prop::collection::vec(0.0f32..800.0, 1..20),
        score in 0u64..100_000,
        time_scale in 0.0f32..=1.0,
    ) {
        let tuning = Tuning::default();
        let mut crystals: Vec<Crystal> = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| Crystal::new(i / 2, if i % 2 == 0 { Side::Near } else { Side::Far }, h, 0))
            .collect();
        let growth = current_growth(&PureKernel, &tuning, score, time_scale);
        grow_crystals(&mut crystals, growth);
        for (c, before) in crystals.iter().zip(&heights) {
            prop_assert!(c.height >= *before);
        }
    }

    #[test]
    fn time_scale_stays_in_bounds_and_recovers(
        target in 0.0f32..=1.0,
        duration in 0.0f32..5000.0,
        dts in prop::collection::vec(0.0f32..100.0, 1..200),
    ) {
        let mut d = TimeDilation::default();
        d.pulse(target, duration);
        for dt in dts {
            let ts = d.update(dt, 0.2);
            prop_assert!(ts > 0.0 && ts <= 1.0);
        }
        // Drain whatever is left of the pulse, then it must settle exactly
        while d.is_slow() {
            d.update(100.0, 0.2);
        }
        let mut settled = false;
        for _ in 0..200 {
            if d.update(16.0, 0.2) == 1.0 {
                settled = true;
                break;
            }
        }
        prop_assert!(settled);
    }

    #[test]
    fn match_and_mismatch_are_exclusive(
        height in 2.0f32..390.0,
        crystal_color in 0usize..5,
        spore_color in 0usize..5,
    ) {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        // Far side sits well out of reach of the spore
        let mut crystals = pair((height, crystal_color), (0.0, 0));
        let mut spore = Spore::new(Vec2::new(50.0, 400.0), 0, spore_color);
        spore.radius = 400.0 - height + 1.0;
        let mut spores = vec![spore];
        let out = resolve_spores(&mut crystals, &mut spores, &PureKernel, &tuning, &mut rng);

        prop_assert_eq!(out.len(), 1);
        let after = crystals[0].height;
        if crystal_color == spore_color {
            prop_assert!(matches!(out[0], Resolution::MatchResolved { .. }), "expected MatchResolved");
            prop_assert_eq!(after, (height - tuning.shrink_amount).max(tuning.min_height));
        } else {
            prop_assert!(matches!(out[0], Resolution::MismatchResolved { .. }), "expected MismatchResolved");
            prop_assert_eq!(after, height + tuning.penalty_growth);
        }
    }

    #[test]
    fn spores_resolve_at_most_once(
        near in 0.0f32..400.0,
        far in 0.0f32..400.0,
        radius in 0.0f32..400.0,
        color in 0usize..5,
    ) {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut crystals = pair((near, 0), (far, 1));
        let mut spore = Spore::new(Vec2::new(50.0, 400.0), 0, color);
        spore.radius = radius;
        let mut spores = vec![spore];

        let first = resolve_spores(&mut crystals, &mut spores, &PureKernel, &tuning, &mut rng);
        prop_assert!(first.len() <= 2);
        prop_assert_eq!(spores.is_empty(), !first.is_empty());
        if !first.is_empty() {
            let again = resolve_spores(&mut crystals, &mut spores, &PureKernel, &tuning, &mut rng);
            prop_assert!(again.is_empty());
        }
    }

    #[test]
    fn game_over_iff_pair_meets(near in 0.0f32..800.0, far in 0.0f32..800.0) {
        let tuning = Tuning::default();
        let crystals = pair((near, 0), (far, 0));
        let expected = near + far >= tuning.screen_height;
        prop_assert_eq!(overflowing_lane(&crystals, &tuning).is_some(), expected);
    }

    #[test]
    fn soul_payload_is_conserved(payload in 0u64..10_000, count in 0u32..40) {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut effects = Effects::new(0);
        effects.souls(&mut rng, Vec2::ZERO, Vec2::ONE, payload, count, Tint::White);
        let total: u64 = effects.souls.iter().map(|s| s.payload).sum();
        prop_assert_eq!(total, payload);
    }

    #[test]
    fn target_lane_is_always_valid(lane in any::<i64>()) {
        let tuning = Tuning::default();
        let mut launcher = Launcher::new(&tuning, 0);
        launcher.set_target_lane(lane, &tuning);
        prop_assert!(launcher.target_lane < tuning.lanes);
    }
}
