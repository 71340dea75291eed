//! Creature assembly.
//!
//! Turns an LOD-adjusted spec into a `Creature`: one body instance, an ornament
//! batch, a node batch and an arc batch. Meshes and materials come from the shared
//! `ResourcePool`; transforms, arc polylines and per-creature animation state are
//! owned by the creature itself. The per-frame update lives in `animation.rs`.

use bevy::prelude::*;

use crate::placement::{place_ornaments, OrnamentLayout};
use crate::pool::{GeometryDescriptor, MaterialDescriptor, ResourcePool};
use crate::rng::CreatureRng;
use crate::spec::{CreatureSpec, MIN_EXTENT};

// =============================================================================
// TUNING
// =============================================================================

/// Chance that a node sits under an existing ornament instead of a fresh direction.
pub const NODE_REUSE_CHANCE: f32 = 0.7;
/// Nodes are inset to `radius * (NODE_INSET_MIN + rng * NODE_INSET_SPREAD)`.
pub const NODE_INSET_MIN: f32 = 0.82;
pub const NODE_INSET_SPREAD: f32 = 0.1;
/// Node sphere radius relative to the body radius.
pub const NODE_RADIUS_FACTOR: f32 = 0.08;
/// Arc midpoints are lifted to this multiple of the body radius.
pub const ARC_LIFT: f32 = 1.15;

// =============================================================================
// INSTANCES
// =============================================================================

#[derive(Debug, Clone)]
pub struct BodyInstance {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    /// Static shape scale `(scaleX, scaleY, scaleX)`.
    pub transform: Transform,
}

/// One shared mesh/material drawn at many transforms.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub transforms: Vec<Transform>,
}

impl InstanceBatch {
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcDescriptor {
    /// Node indices the arc connects.
    pub endpoints: (usize, usize),
    pub control: Vec3,
    /// Unperturbed Bezier samples.
    pub rest: Vec<Vec3>,
    /// Current samples. First and last always equal the rest endpoints.
    pub points: Vec<Vec3>,
    pub phase: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct ArcBatch {
    /// Base arc material (blended, unlit). Hosts clone it per arc to vary opacity.
    pub material: Handle<StandardMaterial>,
    pub arcs: Vec<ArcDescriptor>,
}

/// Accumulated root motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub yaw: f32,
    pub roll: f32,
    pub scale: f32,
    pub last_t: Option<f32>,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            roll: 0.0,
            scale: 1.0,
            last_t: None,
        }
    }
}

/// A fully assembled, animatable creature.
#[derive(Component, Debug, Clone)]
pub struct Creature {
    pub(crate) spec: CreatureSpec,
    pub(crate) body: BodyInstance,
    pub(crate) layout: OrnamentLayout,
    pub(crate) ornaments: InstanceBatch,
    pub(crate) nodes: InstanceBatch,
    pub(crate) arcs: ArcBatch,
    pub(crate) motion: Motion,
    pub(crate) node_colors: Vec<Color>,
    pub(crate) node_emissive: LinearRgba,
    pub(crate) hitbox_radius: f32,
    pub(crate) hitbox_noise: noise::Value,
}

impl Creature {
    /// The adjusted spec this creature was built from.
    pub fn spec(&self) -> &CreatureSpec {
        &self.spec
    }

    pub fn body(&self) -> &BodyInstance {
        &self.body
    }

    pub fn layout(&self) -> &OrnamentLayout {
        &self.layout
    }

    pub fn ornaments(&self) -> &InstanceBatch {
        &self.ornaments
    }

    pub fn nodes(&self) -> &InstanceBatch {
        &self.nodes
    }

    pub fn arcs(&self) -> &ArcBatch {
        &self.arcs
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    /// Current per-node base color.
    pub fn node_colors(&self) -> &[Color] {
        &self.node_colors
    }

    /// Current node emissive (shared by all nodes).
    pub fn node_emissive(&self) -> LinearRgba {
        self.node_emissive
    }

    /// Body radius after the hitbox scale of the last update.
    pub fn hitbox_radius(&self) -> f32 {
        self.hitbox_radius
    }
}

// =============================================================================
// ARC GEOMETRY
// =============================================================================

/// Lifted midpoint control for an arc between `a` and `b`.
pub fn arc_control_point(a: Vec3, b: Vec3, radius: f32) -> Vec3 {
    let mid = (a + b) * 0.5;
    let dir = mid
        .try_normalize()
        .unwrap_or_else(|| a.normalize_or(Vec3::X).any_orthonormal_vector());
    dir * radius * ARC_LIFT
}

/// `segments + 1` points along the quadratic Bezier `a → m → b`.
/// The first and last points are exactly `a` and `b`.
pub fn sample_quadratic_bezier(a: Vec3, m: Vec3, b: Vec3, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(1);
    let mut points = Vec::with_capacity(segments + 1);
    points.push(a);
    for i in 1..segments {
        let t = i as f32 / segments as f32;
        let u = 1.0 - t;
        points.push(a * (u * u) + m * (2.0 * u * t) + b * (t * t));
    }
    points.push(b);
    points
}

// =============================================================================
// ASSEMBLY
// =============================================================================

pub(crate) fn base_node_emissive(spec: &CreatureSpec) -> LinearRgba {
    let e = spec.palette.emissive.to_linear();
    let k = spec.palette.emissive_intensity;
    LinearRgba::rgb(e.red * k, e.green * k, e.blue * k)
}

/// Build a creature from an already adjusted spec.
///
/// All randomness is drawn from `CreatureRng::new(spec.seed)` in a fixed order:
/// ornaments, then nodes, then arcs.
pub fn assemble(
    spec: &CreatureSpec,
    pool: &mut ResourcePool,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Creature {
    let mut spec = spec.clone();
    spec.normalize();

    let mut rng = CreatureRng::new(spec.seed);
    let radius = spec.body.radius.max(MIN_EXTENT);
    let detail = spec.body.detail;

    // Body
    let body = BodyInstance {
        mesh: pool.geometry(&GeometryDescriptor::body(&spec.body), meshes),
        material: pool.material(
            &MaterialDescriptor::new(spec.palette.base, spec.surfaces.body),
            materials,
        ),
        transform: Transform::from_scale(Vec3::new(
            spec.body.scale_x,
            spec.body.scale_y,
            spec.body.scale_x,
        )),
    };

    // Ornaments
    let layout = place_ornaments(
        spec.spikes.count as usize,
        &mut rng,
        spec.spikes.style,
        radius,
        spec.spikes.length,
        spec.spikes.base_shift,
    );
    let ornaments = InstanceBatch {
        mesh: pool.geometry(&GeometryDescriptor::ornament(&spec.spikes, detail), meshes),
        material: pool.material(
            &MaterialDescriptor::new(spec.palette.spike, spec.surfaces.spike),
            materials,
        ),
        transforms: layout.transforms(),
    };

    // Nodes
    let emissive = base_node_emissive(&spec);
    let mut node_transforms = Vec::with_capacity(spec.node_count as usize);
    for _ in 0..spec.node_count {
        let reuse = rng.next_f32() < NODE_REUSE_CHANCE;
        let dir = if reuse && !layout.is_empty() {
            layout.ornaments[rng.index(layout.len())].direction
        } else {
            rng.unit_vector()
        };
        let inset = radius * (NODE_INSET_MIN + rng.next_f32() * NODE_INSET_SPREAD);
        node_transforms.push(Transform::from_translation(dir * inset));
    }
    let nodes = InstanceBatch {
        mesh: pool.geometry(
            &GeometryDescriptor::node(radius * NODE_RADIUS_FACTOR, detail),
            meshes,
        ),
        material: pool.material(
            &MaterialDescriptor::new(spec.palette.node, spec.surfaces.node).with_emissive(emissive),
            materials,
        ),
        transforms: node_transforms,
    };

    // Arcs
    let segments = spec.quality.arc_segments();
    let mut arcs = Vec::new();
    if nodes.len() >= 2 {
        for i in 0..spec.arc_count as usize {
            let a = rng.index(nodes.len());
            let mut b = rng.index(nodes.len() - 1);
            if b >= a {
                b += 1;
            }
            let phase = rng.angle();
            let pa = nodes.transforms[a].translation;
            let pb = nodes.transforms[b].translation;
            let control = arc_control_point(pa, pb, radius);
            let rest = sample_quadratic_bezier(pa, control, pb, segments);
            arcs.push(ArcDescriptor {
                endpoints: (a, b),
                control,
                points: rest.clone(),
                rest,
                phase,
                opacity: crate::animation::arc_opacity(0.0, i),
            });
        }
    }
    let arcs = ArcBatch {
        material: pool.material(
            &MaterialDescriptor::new(spec.palette.arc, spec.surfaces.node)
                .with_emissive(emissive)
                .blended()
                .unlit(),
            materials,
        ),
        arcs,
    };

    let node_colors = vec![spec.palette.node; nodes.len()];
    let hitbox_noise = noise::Value::new(spec.seed);

    Creature {
        body,
        layout,
        ornaments,
        nodes,
        arcs,
        motion: Motion::default(),
        node_colors,
        node_emissive: emissive,
        hitbox_radius: radius,
        hitbox_noise,
        spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod;
    use crate::spec::Quality;

    struct Fixture {
        pool: ResourcePool,
        meshes: Assets<Mesh>,
        materials: Assets<StandardMaterial>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                pool: ResourcePool::new(),
                meshes: Assets::default(),
                materials: Assets::default(),
            }
        }

        fn build(&mut self, spec: &CreatureSpec) -> Creature {
            assemble(spec, &mut self.pool, &mut self.meshes, &mut self.materials)
        }
    }

    fn spec(spikes: u32) -> CreatureSpec {
        let mut s = CreatureSpec::new("urchin", 7);
        s.spikes.count = spikes;
        s.node_count = 8;
        s.arc_count = 5;
        s
    }

    #[test]
    fn test_counts_match_adjusted_spec() {
        let mut fx = Fixture::new();
        let adjusted = lod::adjust(&spec(42), None);
        let creature = fx.build(&adjusted);
        assert_eq!(creature.ornaments().len(), 42);
        assert_eq!(creature.nodes().len(), 8);
        assert_eq!(creature.arcs().arcs.len(), 5);
        assert_eq!(creature.node_colors().len(), 8);
    }

    #[test]
    fn test_low_quality_count() {
        let mut fx = Fixture::new();
        let adjusted = lod::adjust(&spec(42), Some(Quality::Low));
        let creature = fx.build(&adjusted);
        assert_eq!(creature.ornaments().len(), 29);
        assert!(creature.arcs().arcs.is_empty());
    }

    #[test]
    fn test_same_seed_same_creature() {
        let mut fx = Fixture::new();
        let a = fx.build(&spec(30));
        let b = fx.build(&spec(30));
        assert_eq!(a.ornaments().transforms, b.ornaments().transforms);
        assert_eq!(a.nodes().transforms, b.nodes().transforms);
        assert_eq!(a.arcs().arcs, b.arcs().arcs);
    }

    #[test]
    fn test_color_change_shares_geometry_only() {
        let mut fx = Fixture::new();
        let a = spec(12);
        let mut b = spec(12);
        b.palette.base = Color::srgb(0.9, 0.1, 0.1);
        let ca = fx.build(&a);
        let cb = fx.build(&b);
        assert_eq!(ca.body().mesh.id(), cb.body().mesh.id());
        assert_ne!(ca.body().material.id(), cb.body().material.id());
        assert_eq!(ca.ornaments().mesh.id(), cb.ornaments().mesh.id());
        assert_eq!(ca.ornaments().material.id(), cb.ornaments().material.id());
    }

    #[test]
    fn test_nodes_are_inset() {
        let mut fx = Fixture::new();
        let creature = fx.build(&spec(20));
        for t in &creature.nodes().transforms {
            let d = t.translation.length();
            assert!(d >= NODE_INSET_MIN - 1e-4 && d <= NODE_INSET_MIN + NODE_INSET_SPREAD + 1e-4);
        }
    }

    #[test]
    fn test_arcs_connect_distinct_nodes() {
        let mut fx = Fixture::new();
        let creature = fx.build(&spec(20));
        for arc in &creature.arcs().arcs {
            let (a, b) = arc.endpoints;
            assert_ne!(a, b);
            assert_eq!(arc.rest.first(), Some(&creature.nodes().transforms[a].translation));
            assert_eq!(arc.rest.last(), Some(&creature.nodes().transforms[b].translation));
            assert_eq!(arc.rest.len(), Quality::High.arc_segments() + 1);
        }
    }

    #[test]
    fn test_no_ornaments_still_places_nodes() {
        let mut fx = Fixture::new();
        let creature = fx.build(&spec(0));
        assert!(creature.ornaments().is_empty());
        assert_eq!(creature.nodes().len(), 8);
    }

    #[test]
    fn test_arc_control_point_example() {
        let c = arc_control_point(Vec3::X, Vec3::Y, 1.0);
        assert!((c - Vec3::new(0.8132, 0.8132, 0.0)).length() < 1e-3);

        let points = sample_quadratic_bezier(Vec3::X, c, Vec3::Y, 2);
        let expected = Vec3::X * 0.25 + c * 0.5 + Vec3::Y * 0.25;
        assert!((points[1] - expected).length() < 1e-6);
    }

    #[test]
    fn test_antipodal_control_point_is_finite() {
        let c = arc_control_point(Vec3::X, -Vec3::X, 2.0);
        assert!(c.is_finite());
        assert!((c.length() - 2.0 * ARC_LIFT).abs() < 1e-4);
    }

    #[test]
    fn test_bezier_endpoints_exact() {
        let a = Vec3::new(0.3, -0.7, 0.1);
        let b = Vec3::new(-0.2, 0.5, 0.9);
        let m = arc_control_point(a, b, 1.0);
        let points = sample_quadratic_bezier(a, m, b, 10);
        assert_eq!(points.len(), 11);
        assert_eq!(points[0], a);
        assert_eq!(points[10], b);
    }
}
