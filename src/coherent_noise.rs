use noise::{NoiseFn, Perlin};

/// Deterministic, smooth 2D noise in `[0, 1]`.
pub trait CoherentNoise {
    fn sample(&self, x: f32, y: f32) -> f32;
}

pub struct PerlinNoise {
    perlin: Perlin,
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl CoherentNoise for PerlinNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        // Perlin output is roughly [-1, 1]; remap to the unit interval.
        let raw = self.perlin.get([f64::from(x), f64::from(y)]);
        (((raw + 1.0) * 0.5) as f32).clamp(0.0, 1.0)
    }
}

/// Constant noise, useful for reproducible tuning checks.
#[derive(Clone, Copy, Debug)]
pub struct FlatNoise(pub f32);

impl CoherentNoise for FlatNoise {
    fn sample(&self, _x: f32, _y: f32) -> f32 {
        self.0.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perlin_stays_in_unit_interval() {
        let noise = PerlinNoise::new(7);
        for i in 0..500 {
            let t = i as f32 * 0.137;
            let value = noise.sample(t, 3.3 - t);
            assert!((0.0..=1.0).contains(&value), "sample {value} out of range");
        }
    }

    #[test]
    fn perlin_is_deterministic_per_seed() {
        let a = PerlinNoise::new(3);
        let b = PerlinNoise::new(3);
        assert_eq!(a.sample(1.25, 4.5), b.sample(1.25, 4.5));
    }

    #[test]
    fn perlin_is_continuous() {
        let noise = PerlinNoise::new(11);
        let a = noise.sample(2.30, 0.71);
        let b = noise.sample(2.301, 0.71);
        assert!((a - b).abs() < 0.01);
    }
}
