use super::*;

const CANVAS: Canvas = Canvas {
    width: 1080,
    height: 1920,
};

#[test]
fn count_is_fixed_and_particles_stay_in_bounds() {
    let mut f = ParticleField::new(40, 3, CANVAS);
    for _ in 0..5000 {
        f.step();
        assert_eq!(f.len(), 40);
        for p in f.particles() {
            assert!(p.alpha > 0.0 && p.alpha <= 0.9);
            assert!(p.y + p.radius >= 0.0);
            assert!(p.y <= 1920.0 + 4.5);
            assert!((0.0..1080.0).contains(&p.x));
        }
    }
}

#[test]
fn particles_rise() {
    let mut f = ParticleField::new(1, 9, CANVAS);
    let before = f.particles()[0];
    f.step();
    let after = f.particles()[0];
    if after.x == before.x {
        assert!(after.y < before.y);
        assert!(after.alpha < before.alpha);
    }
}

#[test]
fn same_seed_same_motion() {
    let mut a = ParticleField::new(16, 42, CANVAS);
    let mut b = ParticleField::new(16, 42, CANVAS);
    for _ in 0..300 {
        a.step();
        b.step();
    }
    assert_eq!(a.particles(), b.particles());

    let c = ParticleField::new(16, 43, CANVAS);
    assert_ne!(ParticleField::new(16, 42, CANVAS).particles(), c.particles());
}

#[test]
fn empty_field_is_allowed() {
    let mut f = ParticleField::new(0, 1, CANVAS);
    f.step();
    assert!(f.is_empty());
}
