//! Ornament placement over the body surface.
//!
//! Directions are sampled uniformly on the unit sphere and pushed apart from their
//! recent neighbours (a cheap local repulsion, not blue noise). Each style then maps
//! a direction to a distance from the body center, an orientation and a scale.

use bevy::prelude::*;

use crate::rng::CreatureRng;
use crate::spec::{SpikeStyle, MIN_EXTENT};

// =============================================================================
// TUNING
// =============================================================================

/// Declumping only kicks in for batches at least this large.
pub const DECLUMP_MIN_COUNT: usize = 5;
/// How many previously placed directions each new one is compared against.
pub const DECLUMP_WINDOW: usize = 6;
/// Directions closer than this (cosine) to a neighbour get pushed away.
pub const DECLUMP_DOT: f32 = 0.85;
pub const DECLUMP_PUSH: f32 = 0.4;

pub const SCALE_JITTER_MIN: f32 = 0.85;
pub const SCALE_JITTER_MAX: f32 = 1.15;

/// Distance band around the body: `[max(0.2r, r - 1.2l), r + 2l]`.
pub const BAND_INNER_RADIUS: f32 = 0.2;
pub const BAND_INNER_LENGTH: f32 = 1.2;
pub const BAND_OUTER_LENGTH: f32 = 2.0;

/// Inverted ornaments never sink deeper than this fraction of the radius.
pub const INVERTED_MIN_RADIUS: f32 = 0.35;

// =============================================================================
// DISTANCES
// =============================================================================

/// Style-specific distance from the body center, before shift and clamping.
pub fn base_distance(style: SpikeStyle, radius: f32, length: f32) -> f32 {
    match style {
        SpikeStyle::Cone => radius + length * 0.45,
        SpikeStyle::Inverted => (radius - length * 0.45).max(radius * INVERTED_MIN_RADIUS),
        SpikeStyle::Disk => radius + (length * 0.1).max(0.02),
        SpikeStyle::Block => radius + length * 0.3,
        SpikeStyle::Tentacle => radius + length * 0.6,
    }
}

/// `(min, max)` distance any ornament may sit at.
pub fn distance_band(radius: f32, length: f32) -> (f32, f32) {
    let inner = (radius * BAND_INNER_RADIUS).max(radius - length * BAND_INNER_LENGTH);
    let outer = radius + length * BAND_OUTER_LENGTH;
    (inner, outer.max(inner))
}

/// Base distance plus `shift`, clamped into the band.
pub fn placement_distance(style: SpikeStyle, radius: f32, length: f32, shift: f32) -> f32 {
    let radius = radius.max(MIN_EXTENT);
    let length = length.max(0.0);
    let (lo, hi) = distance_band(radius, length);
    let d = base_distance(style, radius, length) + shift;
    if d.is_finite() {
        d.clamp(lo, hi)
    } else {
        lo
    }
}

/// Rotation taking the mesh's +Y axis onto the ornament direction
/// (or into the body for inverted cones).
pub fn orientation(style: SpikeStyle, dir: Vec3) -> Quat {
    let target = match style {
        SpikeStyle::Inverted => -dir,
        _ => dir,
    };
    Quat::from_rotation_arc(Vec3::Y, target)
}

// =============================================================================
// LAYOUT
// =============================================================================

/// One placed ornament.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnamentDescriptor {
    /// Unit direction from the body center.
    pub direction: Vec3,
    /// Distance at rest (no pulse, no hitbox scaling).
    pub distance: f32,
    pub rotation: Quat,
    pub scale: f32,
    /// Animation phase in [0, 2π).
    pub phase: f32,
}

impl OrnamentDescriptor {
    pub fn transform_at(&self, distance: f32) -> Transform {
        Transform {
            translation: self.direction * distance,
            rotation: self.rotation,
            scale: Vec3::splat(self.scale),
        }
    }

    pub fn rest_transform(&self) -> Transform {
        self.transform_at(self.distance)
    }
}

/// All ornaments of one creature, in placement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrnamentLayout {
    pub ornaments: Vec<OrnamentDescriptor>,
}

impl OrnamentLayout {
    pub fn len(&self) -> usize {
        self.ornaments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ornaments.is_empty()
    }

    pub fn directions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.ornaments.iter().map(|o| o.direction)
    }

    pub fn transforms(&self) -> Vec<Transform> {
        self.ornaments.iter().map(OrnamentDescriptor::rest_transform).collect()
    }
}

/// Push `dir` away from any of the last `DECLUMP_WINDOW` directions it crowds.
fn declump(mut dir: Vec3, placed: &[OrnamentDescriptor]) -> Vec3 {
    let start = placed.len().saturating_sub(DECLUMP_WINDOW);
    for prev in &placed[start..] {
        if dir.dot(prev.direction) > DECLUMP_DOT {
            // Pushing straight off an identical neighbour would zero the vector.
            dir = (dir - prev.direction * DECLUMP_PUSH)
                .try_normalize()
                .unwrap_or(dir);
        }
    }
    dir
}

/// Place `count` ornaments. Consumes exactly four draws per ornament
/// (`u`, azimuth, scale jitter, phase) in that order.
pub fn place_ornaments(
    count: usize,
    rng: &mut CreatureRng,
    style: SpikeStyle,
    radius: f32,
    length: f32,
    base_shift: f32,
) -> OrnamentLayout {
    let mut ornaments: Vec<OrnamentDescriptor> = Vec::with_capacity(count);
    let distance = placement_distance(style, radius, length, base_shift);

    for _ in 0..count {
        let mut direction = rng.unit_vector();
        if ornaments.len() >= DECLUMP_MIN_COUNT {
            direction = declump(direction, &ornaments);
        }
        let scale = rng.range(SCALE_JITTER_MIN, SCALE_JITTER_MAX);
        let phase = rng.angle();

        ornaments.push(OrnamentDescriptor {
            direction,
            distance,
            rotation: orientation(style, direction),
            scale,
            phase,
        });
    }

    OrnamentLayout { ornaments }
}
