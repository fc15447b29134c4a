use std::f32::consts::TAU;

use loam_blocks::MAX_SKY_LIGHT;

/// Sky brightness over a repeating day, sampled in ticks.
pub struct DayCycle {
    time: f32,
    day_length: f32,
    max_level: u8,
}

impl DayCycle {
    pub fn new(day_length: f32, max_level: u8) -> Self {
        Self {
            time: day_length.max(1.0) * 0.25,
            day_length: day_length.max(1.0),
            max_level: max_level.clamp(1, MAX_SKY_LIGHT),
        }
    }

    pub fn advance(&mut self, dt: f32) -> u8 {
        self.time = (self.time + dt).rem_euclid(self.day_length);
        self.sky_level()
    }

    /// Sky maximum for the current time, 1 at midnight up to `max_level` at noon.
    pub fn sky_level(&self) -> u8 {
        let phase = (self.time / self.day_length).rem_euclid(1.0) * TAU;
        let sky_scale = 0.5 * (1.0 + phase.sin());
        let brightness = sky_scale.powf(1.5);
        let span = f32::from(self.max_level - 1);
        (1.0 + brightness * span).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_noon() {
        let cycle = DayCycle::new(400.0, 15);
        assert_eq!(cycle.sky_level(), 15);
    }

    #[test]
    fn midnight_is_dim_but_not_dark() {
        let mut cycle = DayCycle::new(400.0, 15);
        assert_eq!(cycle.advance(200.0), 1);
    }

    #[test]
    fn levels_stay_in_range() {
        let mut cycle = DayCycle::new(97.0, 12);
        for _ in 0..500 {
            let level = cycle.advance(1.0);
            assert!((1..=12).contains(&level));
        }
    }
}
