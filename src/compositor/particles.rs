use crate::foundation::core::Canvas;
use crate::foundation::math::XorShift64;

/// One rising glint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    /// Upward speed in pixels per frame.
    pub speed: f64,
    pub alpha: f32,
    /// Alpha lost per frame.
    pub fade: f32,
}

/// Fixed-size self-sustaining field of glints, independent of audio and text timing.
#[derive(Clone, Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    rng: XorShift64,
    width: f64,
    height: f64,
}

impl ParticleField {
    /// Seeded so identical renders produce identical frames.
    pub fn new(count: usize, seed: u64, canvas: Canvas) -> Self {
        let mut field = Self {
            particles: Vec::with_capacity(count),
            rng: XorShift64::new(seed),
            width: f64::from(canvas.width),
            height: f64::from(canvas.height),
        };
        for _ in 0..count {
            let mut p = field.spawn();
            // scatter the first generation over the whole frame
            p.y = field.rng.range(0.0, field.height);
            p.alpha *= field.rng.next_f64() as f32;
            field.particles.push(p);
        }
        field
    }

    fn spawn(&mut self) -> Particle {
        let radius = self.rng.range(1.5, 4.5);
        Particle {
            x: self.rng.range(0.0, self.width),
            y: self.height + radius,
            radius,
            speed: self.rng.range(0.6, 2.4),
            alpha: self.rng.range(0.35, 0.9) as f32,
            fade: self.rng.range(0.0015, 0.006) as f32,
        }
    }

    /// Advance one frame: move up, fade, respawn the dead at the bottom.
    pub fn step(&mut self) {
        for i in 0..self.particles.len() {
            let p = &mut self.particles[i];
            p.y -= p.speed;
            p.alpha -= p.fade;
            if p.alpha <= 0.0 || p.y + p.radius < 0.0 {
                let fresh = self.spawn();
                self.particles[i] = fresh;
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/particles.rs"]
mod tests;
