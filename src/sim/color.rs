//! RGB color with HSL offsetting, enough for hue cycling effects

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(&self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// CSS form, e.g. `#00ff99`
    pub fn hex_string(&self) -> String {
        format!("#{:06x}", self.to_hex())
    }

    /// (hue, saturation, lightness), all in [0, 1]
    pub fn to_hsl(&self) -> (f32, f32, f32) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let lightness = (min + max) / 2.0;
        if min == max {
            return (0.0, 0.0, lightness);
        }
        let delta = max - min;
        let saturation = if lightness <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let hue = if max == self.r {
            (self.g - self.b) / delta + if self.g < self.b { 6.0 } else { 0.0 }
        } else if max == self.g {
            (self.b - self.r) / delta + 2.0
        } else {
            (self.r - self.g) / delta + 4.0
        };
        (hue / 6.0, saturation, lightness)
    }

    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hue = hue.rem_euclid(1.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);
        if saturation == 0.0 {
            return Self {
                r: lightness,
                g: lightness,
                b: lightness,
            };
        }
        let p = if lightness <= 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let q = 2.0 * lightness - p;
        Self {
            r: hue_to_rgb(q, p, hue + 1.0 / 3.0),
            g: hue_to_rgb(q, p, hue),
            b: hue_to_rgb(q, p, hue - 1.0 / 3.0),
        }
    }

    /// Shift hue/saturation/lightness; hue wraps around
    pub fn offset_hsl(&self, dh: f32, ds: f32, dl: f32) -> Self {
        let (h, s, l) = self.to_hsl();
        Self::from_hsl(h + dh, s + ds, l + dl)
    }

    /// Add `amount` to every channel
    pub fn add_scalar(&self, amount: f32) -> Self {
        Self {
            r: (self.r + amount).clamp(0.0, 1.0),
            g: (self.g + amount).clamp(0.0, 1.0),
            b: (self.b + amount).clamp(0.0, 1.0),
        }
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Timed hue cycling: shifts a color's hue by a fixed step every period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCycle {
    pub color: Color,
    period_ms: f64,
    hue_step: f32,
    last_step: f64,
}

impl ColorCycle {
    pub fn new(color: Color, period_ms: f64, hue_step: f32) -> Self {
        Self {
            color,
            period_ms,
            hue_step,
            last_step: 0.0,
        }
    }

    /// Advance to `time`; returns true when the color changed
    pub fn refresh(&mut self, time: f64) -> bool {
        if (time - self.last_step).abs() > self.period_ms {
            self.last_step = time;
            self.color = self.color.offset_hsl(self.hue_step, 0.0, 0.0);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        for hex in [0x000000, 0xffffff, 0x99ff00, 0xff3300, 0x0066ff] {
            assert_eq!(Color::from_hex(hex).to_hex(), hex);
        }
        assert_eq!(Color::from_hex(0x00ff99).hex_string(), "#00ff99");
    }

    #[test]
    fn test_hsl_primaries() {
        let (h, s, l) = Color::from_hex(0xff0000).to_hsl();
        assert!(h.abs() < 1e-6);
        assert!((s - 1.0).abs() < 1e-6);
        assert!((l - 0.5).abs() < 1e-6);

        let (h, _, _) = Color::from_hex(0x00ff00).to_hsl();
        assert!((h - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_offset_hue_wraps() {
        let red = Color::from_hex(0xff0000);
        assert_eq!(red.offset_hsl(1.0, 0.0, 0.0).to_hex(), 0xff0000);
        assert_eq!(red.offset_hsl(1.0 / 3.0, 0.0, 0.0).to_hex(), 0x00ff00);
    }

    #[test]
    fn test_cycle_throttles() {
        let mut cycle = ColorCycle::new(Color::from_hex(0xff0000), 50.0, 0.01);
        assert!(cycle.refresh(100.0));
        assert!(!cycle.refresh(120.0));
        assert!(cycle.refresh(151.0));
        assert_ne!(cycle.color.to_hex(), 0xff0000);
    }
}
