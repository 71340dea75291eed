//! Level-of-detail policy.
//!
//! Rewrites a spec into a cheaper one for a quality tier. The optional `lod` floor on
//! the spec is applied after tier scaling and only ever raises values.

use crate::spec::{CreatureSpec, Quality, MAX_DETAIL};

/// Tier multipliers and minimums.
pub const LOW_SPIKE_FACTOR: f64 = 0.7;
pub const MED_SPIKE_FACTOR: f64 = 0.85;
pub const MED_ARC_FACTOR: f64 = 0.5;
pub const TIER_MIN_SPIKES: u32 = 8;
pub const LOW_MAX_DETAIL: u8 = 1;

impl Quality {
    /// Bezier segments per arc.
    pub fn arc_segments(self) -> usize {
        match self {
            Quality::Low => 10,
            Quality::Med => 16,
            Quality::High => 22,
        }
    }
}

/// floor(count * factor), tolerant of products like 0.7 * 10 landing just below 7.
fn scale_count(count: u32, factor: f64) -> u32 {
    (count as f64 * factor + 1e-9).floor() as u32
}

/// Scale an ornament count down, keeping at least the tier minimum.
/// Creatures without ornaments stay bare.
fn scale_spikes(count: u32, factor: f64) -> u32 {
    if count == 0 {
        0
    } else {
        scale_count(count, factor).max(TIER_MIN_SPIKES)
    }
}

/// Adjust `spec` for `quality_override`, or for the spec's own `quality` tier.
///
/// The returned spec is normalized and its `quality` names the tier applied.
pub fn adjust(spec: &CreatureSpec, quality_override: Option<Quality>) -> CreatureSpec {
    let mut out = spec.clone();
    out.normalize();

    let tier = quality_override.unwrap_or(out.quality);
    match tier {
        Quality::Low => {
            out.spikes.count = scale_spikes(out.spikes.count, LOW_SPIKE_FACTOR);
            out.arc_count = 0;
            out.body.detail = out.body.detail.min(LOW_MAX_DETAIL);
        }
        Quality::Med => {
            out.spikes.count = scale_spikes(out.spikes.count, MED_SPIKE_FACTOR);
            out.arc_count = scale_count(out.arc_count, MED_ARC_FACTOR);
        }
        Quality::High => {}
    }

    if let Some(floor) = out.lod {
        out.spikes.count = out.spikes.count.max(floor.min_spike_count);
        out.body.detail = out.body.detail.max(floor.min_detail).min(MAX_DETAIL);
    }

    out.quality = tier;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::LodFloor;

    fn spec(spikes: u32, quality: Quality) -> CreatureSpec {
        let mut s = CreatureSpec::new("urchin", 7);
        s.spikes.count = spikes;
        s.quality = quality;
        s
    }

    #[test]
    fn test_high_is_unchanged() {
        let s = spec(42, Quality::High);
        let a = adjust(&s, None);
        assert_eq!(a.spikes.count, 42);
        assert_eq!(a.body.detail, s.body.detail);
        assert_eq!(a.arc_count, s.arc_count);
    }

    #[test]
    fn test_low_scales_spikes() {
        let a = adjust(&spec(42, Quality::Low), None);
        assert_eq!(a.spikes.count, 29);
        assert_eq!(a.arc_count, 0);
        assert_eq!(a.quality, Quality::Low);
    }

    #[test]
    fn test_low_caps_detail() {
        let mut s = spec(42, Quality::High);
        s.body.detail = 2;
        assert_eq!(adjust(&s, Some(Quality::Low)).body.detail, 1);
        assert_eq!(adjust(&s, Some(Quality::Med)).body.detail, 2);
    }

    #[test]
    fn test_floor_raises_low_tier() {
        let mut s = spec(5, Quality::Low);
        s.lod = Some(LodFloor {
            min_spike_count: 20,
            min_detail: 0,
        });
        assert_eq!(adjust(&s, None).spikes.count, 20);
    }

    #[test]
    fn test_tier_minimum_applies() {
        assert_eq!(adjust(&spec(5, Quality::Low), None).spikes.count, 8);
        assert_eq!(adjust(&spec(9, Quality::Med), None).spikes.count, 8);
    }

    #[test]
    fn test_zero_spikes_stay_zero() {
        for q in [Quality::Low, Quality::Med, Quality::High] {
            assert_eq!(adjust(&spec(0, Quality::High), Some(q)).spikes.count, 0);
        }
    }

    #[test]
    fn test_floor_raises_detail_but_never_above_max() {
        let mut s = spec(30, Quality::Low);
        s.body.detail = 2;
        s.lod = Some(LodFloor {
            min_spike_count: 0,
            min_detail: 2,
        });
        assert_eq!(adjust(&s, None).body.detail, 2);
    }

    #[test]
    fn test_counts_monotonic_in_quality() {
        for spikes in [0, 1, 7, 8, 11, 20, 42, 100, 333] {
            for arcs in [0, 1, 3, 7] {
                let mut s = spec(spikes, Quality::High);
                s.arc_count = arcs;
                let low = adjust(&s, Some(Quality::Low));
                let med = adjust(&s, Some(Quality::Med));
                let high = adjust(&s, Some(Quality::High));
                assert_eq!(low.arc_count, 0);
                assert!(low.arc_count <= med.arc_count && med.arc_count <= high.arc_count);
                if spikes >= TIER_MIN_SPIKES {
                    assert!(low.spikes.count <= med.spikes.count);
                    assert!(med.spikes.count <= high.spikes.count);
                }
            }
        }
    }

    #[test]
    fn test_floor_holds_on_every_tier() {
        let mut s = spec(3, Quality::High);
        s.lod = Some(LodFloor {
            min_spike_count: 15,
            min_detail: 1,
        });
        for q in [Quality::Low, Quality::Med, Quality::High] {
            assert!(adjust(&s, Some(q)).spikes.count >= 15);
        }
    }

    #[test]
    fn test_arc_segments_per_tier() {
        assert_eq!(Quality::Low.arc_segments(), 10);
        assert_eq!(Quality::Med.arc_segments(), 16);
        assert_eq!(Quality::High.arc_segments(), 22);
    }
}
