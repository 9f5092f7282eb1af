#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F32Range {
    low: f32,
    high: f32,
}

impl F32Range {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn low(self) -> f32 {
        self.low
    }

    pub fn high(self) -> f32 {
        self.high
    }

    pub fn clamp(self, v: f32) -> f32 {
        v.max(self.low).min(self.high)
    }

    /// Position of `v` inside the range, 0 at `low` and 1 at `high`.
    pub fn t(self, v: f32) -> f32 {
        (v - self.low) / (self.high - self.low)
    }

    /// Inverse of `t`.
    pub fn lerp(self, t: f32) -> f32 {
        self.low + t * (self.high - self.low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_and_lerp_are_inverse() {
        let r = F32Range::new(0.01, 0.08);
        assert_eq!(r.t(0.01), 0.0);
        assert!((r.t(0.08) - 1.0).abs() < 1e-6);
        assert!((r.lerp(r.t(0.055)) - 0.055).abs() < 1e-6);
    }

    #[test]
    fn clamp_keeps_inside() {
        let r = F32Range::new(0.04, 0.07);
        assert_eq!(r.clamp(0.1), 0.07);
        assert_eq!(r.clamp(0.0), 0.04);
        assert_eq!(r.clamp(0.05), 0.05);
    }
}
