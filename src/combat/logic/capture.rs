use rand::Rng;

use crate::monsters::Monster;

/// A capture succeeds when a uniform draw in [0, 1) exceeds the target's
/// remaining HP ratio. A fainted target is always caught.
pub fn capture_succeeds(target: &Monster, draw: f64) -> bool {
    target.current_hp == 0 || draw > target.hp_ratio()
}

/// Probability that `attempt_capture` succeeds against this target
pub fn capture_probability(target: &Monster) -> f64 {
    1.0 - target.hp_ratio()
}

/// Roll for capture success
pub fn attempt_capture<R: Rng>(target: &Monster, rng: &mut R) -> bool {
    let draw: f64 = rng.gen();
    let success = capture_succeeds(target, draw);
    tracing::debug!(
        "Capture roll against {} ({}/{} HP): draw {:.3}, success {}",
        target.name,
        target.current_hp,
        target.max_hp,
        draw,
        success
    );
    success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monsters::MonsterCatalog;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn grom_with_hp(current_hp: u32) -> Monster {
        let catalog = MonsterCatalog::builtin();
        let mut grom = Monster::from_template(&catalog.wild_templates()[1]);
        grom.current_hp = current_hp;
        grom
    }

    #[rstest]
    #[case(0, 0.0, true)]
    #[case(1, 0.03, true)]
    #[case(1, 0.02, false)]
    #[case(25, 0.6, true)]
    #[case(25, 0.4, false)]
    #[case(50, 0.999_999, false)]
    fn capture_threshold(#[case] current_hp: u32, #[case] draw: f64, #[case] expected: bool) {
        let target = grom_with_hp(current_hp);
        assert_eq!(capture_succeeds(&target, draw), expected);
    }

    #[test]
    fn fainted_target_is_always_caught() {
        let target = grom_with_hp(0);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!((0..500).all(|_| attempt_capture(&target, &mut rng)));
        assert_eq!(capture_probability(&target), 1.0);
    }

    #[test]
    fn fainted_target_is_caught_even_on_a_zero_draw() {
        assert!(capture_succeeds(&grom_with_hp(0), 0.0));
        assert!(!capture_succeeds(&grom_with_hp(1), 0.0));
    }

    #[test]
    fn full_health_target_is_never_caught() {
        let target = grom_with_hp(50);
        let mut rng = SmallRng::seed_from_u64(2);
        assert!((0..500).all(|_| !attempt_capture(&target, &mut rng)));
        assert_eq!(capture_probability(&target), 0.0);
    }

    #[test]
    fn low_health_target_is_almost_always_caught() {
        let target = grom_with_hp(1);
        let mut rng = SmallRng::seed_from_u64(3);
        let caught = (0..1_000).filter(|_| attempt_capture(&target, &mut rng)).count();
        assert!(caught > 900, "caught {} of 1000", caught);
    }

    #[test]
    fn probability_rises_as_health_falls() {
        let mut previous = -1.0;
        for hp in (0..=50).rev() {
            let probability = capture_probability(&grom_with_hp(hp));
            assert!(probability > previous);
            previous = probability;
        }
    }
}
