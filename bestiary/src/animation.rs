//! Per-frame creature animation.
//!
//! `Creature::update` is the only writer of a creature's transform buffers, node
//! colors and arc polylines. Node positions and arc endpoints never move; ornaments
//! are only touched when pulsing or hitbox scaling is active.

use bevy::prelude::*;
use noise::NoiseFn;
use std::f32::consts::{PI, TAU};

use crate::assembler::{base_node_emissive, Creature};
use crate::placement::{distance_band, placement_distance};
use crate::spec::{StrobeMode, Waveform, MIN_EXTENT};

// =============================================================================
// TUNING
// =============================================================================

pub const BREATHE_RATE: f32 = 2.0;
pub const PULSE_RATE: f32 = 4.0;

pub const FLICKER_BASE: f32 = 0.6;
pub const FLICKER_DEPTH: f32 = 0.4;

/// Arc jitter amplitude as a fraction of the body radius.
pub const ARC_JITTER: f32 = 0.035;
/// Extra amplitude on odd sample points.
pub const ARC_JITTER_ODD_BOOST: f32 = 0.35;

pub const ARC_OPACITY_BASE: f32 = 0.55;
pub const ARC_OPACITY_DEPTH: f32 = 0.35;
pub const ARC_OPACITY_RATE: f32 = 1.7;
pub const ARC_OPACITY_STAGGER: f32 = 0.9;

// =============================================================================
// WAVEFORMS
// =============================================================================

/// Hitbox wave level in [0, 1] at time `t`.
pub fn hitbox_level(waveform: Waveform, t: f32, speed: f32, noise: &noise::Value) -> f32 {
    let x = t * speed;
    let level = match waveform {
        Waveform::Sine => 0.5 + 0.5 * (x * TAU).sin(),
        Waveform::Square => {
            if x.floor().rem_euclid(2.0) < 1.0 {
                1.0
            } else {
                0.0
            }
        }
        Waveform::Noise => noise.get([x as f64, 0.0]) as f32 * 0.5 + 0.5,
    };
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

pub(crate) fn arc_opacity(t: f32, index: usize) -> f32 {
    let phase = t * ARC_OPACITY_RATE + index as f32 * ARC_OPACITY_STAGGER;
    (ARC_OPACITY_BASE + ARC_OPACITY_DEPTH * phase.sin()).clamp(0.0, 1.0)
}

fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let a = a.to_srgba();
    let b = b.to_srgba();
    Color::srgba(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
        a.alpha + (b.alpha - a.alpha) * t,
    )
}

/// Offset of interior arc point `k` in the plane spanned by `(u, v)`.
fn arc_jitter(t: f32, k: usize, phase: f32) -> Vec2 {
    let k = k as f32;
    let a = (t * 5.3 + k * 1.7 + phase).sin() + 0.5 * (t * 11.1 + k * 0.6 + phase * 2.0).sin();
    let b = (t * 4.1 + k * 1.3 + phase).cos() + 0.5 * (t * 9.7 - k * 0.9 + phase).cos();
    // Both sums lie in [-1.5, 1.5].
    Vec2::new(a, b) / 1.5
}

// =============================================================================
// UPDATE
// =============================================================================

impl Creature {
    /// Advance to elapsed time `t`. When `dt` is absent it is taken from the previous
    /// call's `t` (zero on the first call, never negative).
    pub fn update(&mut self, t: f32, dt: Option<f32>) {
        if !t.is_finite() {
            return;
        }
        let dt = dt
            .or_else(|| self.motion.last_t.map(|last| t - last))
            .filter(|dt| dt.is_finite())
            .unwrap_or(0.0)
            .max(0.0);
        self.motion.last_t = Some(t);

        self.update_body(t, dt);
        self.update_hitbox(t);
        self.update_ornaments(t);
        self.update_nodes(t);
        self.update_arcs(t);
    }

    /// Root transform carrying spin, roll and breathing.
    pub fn root_transform(&self) -> Transform {
        Transform {
            translation: Vec3::ZERO,
            rotation: Quat::from_euler(EulerRot::YXZ, self.motion.yaw, 0.0, self.motion.roll),
            scale: Vec3::splat(self.motion.scale),
        }
    }

    /// Band the ornaments are currently clamped to.
    pub fn distance_band(&self) -> (f32, f32) {
        distance_band(self.hitbox_radius, self.spec.spikes.length)
    }

    fn update_body(&mut self, t: f32, dt: f32) {
        let anim = &self.spec.animation;
        self.motion.yaw = (self.motion.yaw + anim.spin * dt).rem_euclid(TAU);
        self.motion.roll = (self.motion.roll + anim.roll * dt).rem_euclid(TAU);
        self.motion.scale = (1.0 + (t * BREATHE_RATE).sin() * anim.breathe).max(MIN_EXTENT);
    }

    fn update_hitbox(&mut self, t: f32) {
        let radius = self.spec.body.radius.max(MIN_EXTENT);
        self.hitbox_radius = match self.spec.animation.hitbox {
            Some(h) => {
                let level = hitbox_level(h.waveform, t, h.speed, &self.hitbox_noise);
                (radius * (h.min + (h.max - h.min) * level)).max(MIN_EXTENT)
            }
            None => radius,
        };
    }

    fn update_ornaments(&mut self, t: f32) {
        let spikes = self.spec.spikes;
        let pulse = spikes.pulse && spikes.pulse_intensity > 0.0;
        if !pulse && self.spec.animation.hitbox.is_none() {
            return;
        }

        let radius = self.hitbox_radius;
        let base = placement_distance(spikes.style, radius, spikes.length, spikes.base_shift);
        let (lo, hi) = distance_band(radius, spikes.length);

        for (ornament, transform) in self
            .layout
            .ornaments
            .iter()
            .zip(self.ornaments.transforms.iter_mut())
        {
            let mut d = base;
            if pulse {
                d += (t * PULSE_RATE + ornament.phase).sin() * spikes.pulse_intensity * spikes.length;
            }
            let d = if d.is_finite() { d.clamp(lo, hi) } else { lo };
            transform.translation = ornament.direction * d;
        }
    }

    fn update_nodes(&mut self, t: f32) {
        let base = base_node_emissive(&self.spec);
        let flicker = FLICKER_BASE + FLICKER_DEPTH * (t * self.spec.animation.flicker_speed).sin();
        self.node_emissive = LinearRgba::rgb(base.red * flicker, base.green * flicker, base.blue * flicker);

        let Some(strobe) = self.spec.animation.strobe else {
            return;
        };
        for (i, color) in self.node_colors.iter_mut().enumerate() {
            let phase = match strobe.mode {
                StrobeMode::Unified => 0.0,
                StrobeMode::Alternating if i % 2 == 1 => PI,
                StrobeMode::Alternating => 0.0,
            };
            let w = 0.5 + 0.5 * (t * strobe.speed + phase).sin();
            *color = lerp_color(strobe.color_a, strobe.color_b, w);
        }
    }

    fn update_arcs(&mut self, t: f32) {
        let amplitude = self.spec.body.radius.max(MIN_EXTENT) * ARC_JITTER;

        for (index, arc) in self.arcs.arcs.iter_mut().enumerate() {
            arc.opacity = arc_opacity(t, index);

            let last = arc.rest.len().saturating_sub(1);
            for k in 1..last {
                let rest = arc.rest[k];
                let normal = rest.normalize_or(Vec3::Y);
                let (u, v) = normal.any_orthonormal_pair();
                let boost = if k % 2 == 1 { 1.0 + ARC_JITTER_ODD_BOOST } else { 1.0 };
                let offset = arc_jitter(t, k, arc.phase) * amplitude * boost;
                arc.points[k] = rest + u * offset.x + v * offset.y;
            }
        }
    }
}
