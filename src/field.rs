use crate::surface::{Rgba, Surface};

const TWINKLE_STEP: f32 = 0.04;
const DENSITY_AREA: f32 = 80_000.0;
const MIN_DRIFT_COUNT: usize = 80;
// spawn happens when a uniform draw lands above this, i.e. 1.5% of frames
const STREAK_SPAWN_KEEP: f32 = 0.985;
const STREAK_HUES: [f32; 2] = [200.0, 280.0];

const GRADIENT_TOP: Rgba = Rgba::new(10.0 / 255.0, 12.0 / 255.0, 18.0 / 255.0, 0.2);
const GRADIENT_BOTTOM: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.22);

struct DriftParticle {
    x: f32,
    y: f32,
    r: f32,
    alpha: f32,
    vx: f32,
    vy: f32,
    twinkle: f32,
}

struct StreakParticle {
    x: f32,
    y: f32,
    len: f32,
    angle: f32,
    speed: f32,
    life: f32,
    max_life: f32,
    hue: f32,
}

fn rand_range(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

/// Drift-particle count for a logical surface area. Density scales with
/// area, floored so small viewports still look populated.
fn drift_count(width: f32, height: f32) -> usize {
    let scaled = (width * height / DENSITY_AREA).max(0.0);
    (scaled as usize).max(MIN_DRIFT_COUNT)
}

/// Pulsing display opacity for a drift particle at a given twinkle phase.
fn pulse_opacity(alpha: f32, twinkle: f32) -> f32 {
    (alpha * (0.6 + 0.6 * twinkle.sin().abs())).clamp(0.15, 1.0)
}

/// The particle field: ambient drifting stars plus ephemeral shooting
/// streaks, advanced one frame at a time and painted through a [`Surface`].
/// Owns its random source so a seeded instance replays exact trajectories.
pub struct Starfield {
    width: f32,
    height: f32,
    drifts: Vec<DriftParticle>,
    streaks: Vec<StreakParticle>,
    rng: fastrand::Rng,
}

impl Starfield {
    pub fn new(width: f32, height: f32, mut rng: fastrand::Rng) -> Self {
        let drifts = Self::seed_drifts(width, height, &mut rng);
        Self { width, height, drifts, streaks: Vec::new(), rng }
    }

    pub fn drift_count(&self) -> usize {
        self.drifts.len()
    }

    pub fn streak_count(&self) -> usize {
        self.streaks.len()
    }

    fn seed_drifts(width: f32, height: f32, rng: &mut fastrand::Rng) -> Vec<DriftParticle> {
        (0..drift_count(width, height))
            .map(|_| DriftParticle {
                x: rng.f32() * width,
                y: rng.f32() * height,
                r: 0.2 + rng.f32() * 1.6,
                alpha: rand_range(rng, 0.2, 0.95),
                vx: (rng.f32() - 0.5) * 0.08,
                vy: rand_range(rng, 0.02, 0.30),
                twinkle: rng.f32() * std::f32::consts::TAU,
            })
            .collect()
    }

    /// Full reset for a new viewport: drift particles are re-seeded for the
    /// new area and in-flight streaks are discarded.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.drifts = Self::seed_drifts(width, height, &mut self.rng);
        self.streaks.clear();
    }

    /// One frame: repaint the backdrop, move and draw every particle, then
    /// run the once-per-frame streak spawn check. All motion is per-frame,
    /// tuned for a ~60 Hz schedule. Zero-sized viewports skip the frame
    /// entirely; layout churn produces those transiently.
    pub fn advance(&mut self, surface: &mut dyn Surface) {
        if !(self.width > 0.0 && self.height > 0.0) {
            return;
        }

        surface.clear();
        surface.fill_vertical_gradient(GRADIENT_TOP, GRADIENT_BOTTOM);

        let (w, h) = (self.width, self.height);
        for p in &mut self.drifts {
            p.x += p.vx;
            p.y += p.vy;
            p.twinkle += TWINKLE_STEP;
            let t = p.twinkle.sin().abs();
            let a = pulse_opacity(p.alpha, p.twinkle);
            surface.fill_circle(p.x, p.y, p.r + t * 0.6, Rgba::new(1.0, 1.0, 1.0, a));
            // recycle from the top edge, keeping velocity and look
            if p.y > h + 10.0 || p.x < -20.0 || p.x > w + 20.0 {
                p.x = self.rng.f32() * w;
                p.y = -10.0;
            }
        }

        let rng = &mut self.rng;
        self.streaks.retain_mut(|sh| {
            sh.life += 1.0;
            let (dx, dy) = (sh.angle.cos(), sh.angle.sin());
            sh.x += dx * sh.speed;
            sh.y += dy * sh.speed;

            let tail = (sh.x - dx * sh.len, sh.y - dy * sh.len);
            surface.stroke_gradient_line(
                (sh.x, sh.y),
                tail,
                rand_range(rng, 1.0, 2.6),
                &[
                    (0.0, Rgba::from_hsla(sh.hue, 100.0, 70.0, 0.95)),
                    (0.6, Rgba::from_hsla(sh.hue, 100.0, 60.0, 0.25)),
                    (1.0, Rgba::TRANSPARENT),
                ],
            );
            let head_alpha = (1.0 - sh.life / sh.max_life).max(0.0);
            surface.fill_circle(sh.x, sh.y, 2.2, Rgba::new(1.0, 1.0, 1.0, head_alpha));

            sh.life <= sh.max_life
        });

        // exactly one spawn check per frame, whatever the current count
        if self.rng.f32() > STREAK_SPAWN_KEEP {
            self.spawn_streak();
        }
    }

    fn spawn_streak(&mut self) {
        let rng = &mut self.rng;
        let streak = StreakParticle {
            x: rng.f32() * self.width * 0.6,
            y: rng.f32() * self.height * 0.25,
            len: rand_range(rng, 120.0, 380.0),
            angle: rand_range(rng, std::f32::consts::PI * 0.05, std::f32::consts::PI * 0.35),
            speed: rand_range(rng, 8.0, 16.0),
            life: 0.0,
            max_life: rand_range(rng, 40.0, 100.0),
            hue: STREAK_HUES[rng.usize(0..STREAK_HUES.len())],
        };
        self.streaks.push(streak);
    }
}
