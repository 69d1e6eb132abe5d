//! Heat-map ranking and color scaling for topic solvability.
//!
//! The aggregate sentinel topic is excluded, the rest sorted descending
//! by solvability with stable ties and 1-based ranks. The color ramp
//! interpolates between two fixed endpoints in CIE L*a*b* over the fixed
//! domain [0.5, 0.85], clamping outside it; Lab keeps the perceived
//! brightness step even across the ramp, matching the HCL-interpolated
//! scale the dashboard renders.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::normalize::SolvabilityRecord;

/// Reserved "aggregate/other" topic name, never a real topic.
pub const SENTINEL_TOPIC: &str = "*special";

/// Fixed input domain of the color ramp.
pub const RAMP_DOMAIN: (f64, f64) = (0.5, 0.85);

/// Ramp endpoints: dark bronze at the low end, bright gold at the high.
pub const RAMP_LOW: Rgb = Rgb { r: 0x6A, g: 0x4E, b: 0x17 };
pub const RAMP_HIGH: Rgb = Rgb { r: 0xF5, g: 0xC6, b: 0x38 };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMetric {
    pub label: String,
    pub value: f64,
    /// 1-based, consistent with descending sort order.
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Sentinel-filtered records sorted descending by solvability. Stable:
/// ties keep their original relative order.
pub fn rank(records: &[SolvabilityRecord]) -> Vec<RankedMetric> {
    let mut kept: Vec<&SolvabilityRecord> = records
        .iter()
        .filter(|r| r.topic != SENTINEL_TOPIC)
        .collect();
    kept.sort_by(|a, b| {
        b.solvability
            .partial_cmp(&a.solvability)
            .unwrap_or(Ordering::Equal)
    });
    kept.into_iter()
        .enumerate()
        .map(|(i, r)| RankedMetric {
            label: r.topic.clone(),
            value: r.solvability,
            rank: i + 1,
        })
        .collect()
}

/// Ramp color for a value; values outside the domain clamp to the
/// nearest endpoint color.
pub fn ramp(value: f64) -> Rgb {
    let (lo, hi) = RAMP_DOMAIN;
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    let a = lab_from_rgb(RAMP_LOW);
    let b = lab_from_rgb(RAMP_HIGH);
    rgb_from_lab([
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ])
}

// sRGB <-> CIE L*a*b*, D65 white point.

const WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];
const LAB_EPS: f64 = 216.0 / 24389.0;
const LAB_KAPPA: f64 = 24389.0 / 27.0;

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_from_rgb(rgb: Rgb) -> [f64; 3] {
    let r = srgb_to_linear(rgb.r as f64 / 255.0);
    let g = srgb_to_linear(rgb.g as f64 / 255.0);
    let b = srgb_to_linear(rgb.b as f64 / 255.0);

    let x = (0.4124564 * r + 0.3575761 * g + 0.1804375 * b) / WHITE[0];
    let y = (0.2126729 * r + 0.7151522 * g + 0.0721750 * b) / WHITE[1];
    let z = (0.0193339 * r + 0.1191920 * g + 0.9503041 * b) / WHITE[2];

    let f = |t: f64| {
        if t > LAB_EPS {
            t.cbrt()
        } else {
            (LAB_KAPPA * t + 16.0) / 116.0
        }
    };
    let (fx, fy, fz) = (f(x), f(y), f(z));

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

fn rgb_from_lab(lab: [f64; 3]) -> Rgb {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;

    let finv = |t: f64| {
        let t3 = t * t * t;
        if t3 > LAB_EPS {
            t3
        } else {
            (116.0 * t - 16.0) / LAB_KAPPA
        }
    };

    let x = finv(fx) * WHITE[0];
    let y = finv(fy) * WHITE[1];
    let z = finv(fz) * WHITE[2];

    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    let to_byte = |c: f64| (linear_to_srgb(c).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb {
        r: to_byte(r),
        g: to_byte(g),
        b: to_byte(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(topic: &str, solvability: f64) -> SolvabilityRecord {
        SolvabilityRecord {
            topic: topic.to_string(),
            solvability,
        }
    }

    #[test]
    fn test_sentinel_excluded() {
        let ranked = rank(&[
            rec("dp", 0.61),
            rec(SENTINEL_TOPIC, 0.99),
            rec("graphs", 0.72),
        ]);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.label != SENTINEL_TOPIC));
    }

    #[test]
    fn test_descending_with_ranks() {
        let ranked = rank(&[rec("a", 0.6), rec("b", 0.8), rec("c", 0.7)]);
        let order: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank(&[rec("first", 0.7), rec("second", 0.7), rec("third", 0.7)]);
        let order: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[test]
    fn test_ramp_endpoints_and_clamp() {
        assert_eq!(ramp(0.5), RAMP_LOW);
        assert_eq!(ramp(0.85), RAMP_HIGH);
        assert_eq!(ramp(0.1), RAMP_LOW);
        assert_eq!(ramp(0.99), RAMP_HIGH);
        assert_eq!(ramp(0.5).hex(), "#6a4e17");
    }

    #[test]
    fn test_ramp_midpoint_between_endpoints() {
        let mid = ramp(0.675);
        assert!(mid.r > RAMP_LOW.r && mid.r < RAMP_HIGH.r);
        assert!(mid.g > RAMP_LOW.g && mid.g < RAMP_HIGH.g);
        assert!(mid.b > RAMP_LOW.b && mid.b < RAMP_HIGH.b);
    }

    #[test]
    fn test_ramp_lightness_monotonic() {
        let mut last = -1.0;
        for i in 0..=20 {
            let v = 0.5 + 0.35 * i as f64 / 20.0;
            let l = lab_from_rgb(ramp(v))[0];
            assert!(l >= last - 0.51, "lightness dipped at {}", v);
            last = l;
        }
    }

    #[test]
    fn test_idempotent() {
        let records = [rec("a", 0.6), rec("b", 0.8)];
        assert_eq!(rank(&records), rank(&records));
    }
}
