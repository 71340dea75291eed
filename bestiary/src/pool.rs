//! Shared mesh/material cache.
//!
//! Creatures never build their own primitives: they ask the pool with a structural
//! descriptor and get back the one handle every other creature with an equal
//! descriptor uses. Entries live for as long as the pool does; nothing is evicted.

use bevy::color::ColorToComponents;
use bevy::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::spec::{BaseShape, BodySpec, SpikeSpec, SpikeStyle, Surface, MIN_EXTENT};

/// Entry count after which the pool logs (once) that it keeps growing.
pub const SOFT_ENTRY_LIMIT: usize = 1024;

/// Float fields are rounded to this step before keying.
const KEY_QUANTUM: f32 = 1e-4;

fn quantize(v: f32) -> f32 {
    // `+ 0.0` folds -0.0 into 0.0 so both produce the same key bytes.
    (v / KEY_QUANTUM).round() * KEY_QUANTUM + 0.0
}

// =============================================================================
// KEYS & DESCRIPTORS
// =============================================================================

/// Canonical byte encoding of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey(Vec<u8>);

impl ResourceKey {
    pub fn of<T: Serialize + Debug>(value: &T) -> Self {
        match bincode::serialize(value) {
            Ok(bytes) => Self(bytes),
            Err(e) => {
                warn!("Failed to encode resource key ({e}), keying by debug text");
                Self(format!("{value:?}").into_bytes())
            }
        }
    }
}

/// Everything that determines a mesh. Color never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GeometryDescriptor {
    Body {
        shape: BaseShape,
        radius: f32,
        height: f32,
        detail: u8,
    },
    Ornament {
        style: SpikeStyle,
        length: f32,
        radius: f32,
        detail: u8,
    },
    Node {
        radius: f32,
        detail: u8,
    },
}

impl GeometryDescriptor {
    pub fn body(body: &BodySpec) -> Self {
        Self::Body {
            shape: body.shape,
            radius: body.radius,
            height: body.height,
            detail: body.detail,
        }
        .quantized()
    }

    pub fn ornament(spikes: &SpikeSpec, detail: u8) -> Self {
        Self::Ornament {
            style: spikes.style,
            length: spikes.length,
            radius: spikes.radius,
            detail,
        }
        .quantized()
    }

    pub fn node(radius: f32, detail: u8) -> Self {
        Self::Node { radius, detail }.quantized()
    }

    /// Rounded floats, with fields the shape's mesh ignores zeroed out.
    pub fn quantized(self) -> Self {
        let q = |v: f32| quantize(v.max(MIN_EXTENT));
        match self {
            Self::Body { shape, radius, height, detail } => {
                let (height, detail) = match shape {
                    BaseShape::Sphere | BaseShape::Icosahedron => (0.0, detail),
                    BaseShape::TriPrism | BaseShape::HexPrism => (q(height), 0),
                    BaseShape::Cylinder | BaseShape::Capsule => (q(height), detail),
                };
                Self::Body {
                    shape,
                    radius: q(radius),
                    height,
                    detail,
                }
            }
            Self::Ornament { style, length, radius, detail } => Self::Ornament {
                style,
                length: q(length),
                radius: q(radius),
                detail: match style {
                    SpikeStyle::Block => 0,
                    // Cone resolution tops out at detail 1.
                    SpikeStyle::Cone | SpikeStyle::Inverted => detail.min(1),
                    SpikeStyle::Disk | SpikeStyle::Tentacle => detail,
                },
            },
            Self::Node { radius, detail } => Self::Node {
                radius: q(radius),
                detail: detail.min(1),
            },
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::of(&self.quantized())
    }

    /// Build the mesh. Never fails for a quantized descriptor.
    pub fn build(&self) -> Mesh {
        match *self {
            Self::Body { shape, radius, height, detail } => body_mesh(shape, radius, height, detail),
            Self::Ornament { style, length, radius, detail } => {
                ornament_mesh(style, length, radius, detail)
            }
            Self::Node { radius, detail } => sphere_mesh(radius, detail.min(1)),
        }
    }
}

/// Everything that determines a material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialDescriptor {
    /// sRGBA base color.
    pub color: [f32; 4],
    /// Linear emissive, alpha unused.
    pub emissive: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub blend: bool,
    pub unlit: bool,
}

impl MaterialDescriptor {
    pub fn new(color: Color, surface: Surface) -> Self {
        Self {
            color: color.to_srgba().to_f32_array(),
            emissive: [0.0; 4],
            metallic: surface.metalness,
            roughness: surface.roughness,
            blend: false,
            unlit: false,
        }
    }

    pub fn with_emissive(mut self, emissive: LinearRgba) -> Self {
        self.emissive = emissive.to_f32_array();
        self
    }

    pub fn blended(mut self) -> Self {
        self.blend = true;
        self
    }

    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    fn quantized(self) -> Self {
        Self {
            color: self.color.map(quantize),
            emissive: self.emissive.map(quantize),
            metallic: quantize(self.metallic),
            roughness: quantize(self.roughness),
            ..self
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::of(&self.quantized())
    }

    pub fn build(&self) -> StandardMaterial {
        let [r, g, b, a] = self.color;
        let [er, eg, eb, _] = self.emissive;
        StandardMaterial {
            base_color: Color::srgba(r, g, b, a),
            emissive: LinearRgba::rgb(er, eg, eb),
            metallic: self.metallic,
            perceptual_roughness: self.roughness,
            alpha_mode: if self.blend { AlphaMode::Blend } else { AlphaMode::Opaque },
            unlit: self.unlit,
            ..default()
        }
    }
}

// =============================================================================
// MESH BUILDERS
// =============================================================================

fn sphere_mesh(radius: f32, detail: u8) -> Mesh {
    let sphere = Sphere::new(radius);
    match detail {
        0 => sphere.mesh().uv(12, 8),
        1 => sphere.mesh().uv(20, 14),
        _ => sphere.mesh().uv(32, 20),
    }
}

fn round_resolution(detail: u8) -> u32 {
    match detail {
        0 => 10,
        1 => 16,
        _ => 28,
    }
}

fn body_mesh(shape: BaseShape, radius: f32, height: f32, detail: u8) -> Mesh {
    match shape {
        BaseShape::Icosahedron => Sphere::new(radius)
            .mesh()
            .ico(u32::from(detail))
            .unwrap_or_else(|e| {
                warn!("Icosphere failed ({e}), using uv sphere");
                sphere_mesh(radius, detail)
            }),
        BaseShape::Sphere => sphere_mesh(radius, detail),
        BaseShape::TriPrism => Cylinder::new(radius, height).mesh().resolution(3).build(),
        BaseShape::HexPrism => Cylinder::new(radius, height).mesh().resolution(6).build(),
        BaseShape::Cylinder => Cylinder::new(radius, height)
            .mesh()
            .resolution(round_resolution(detail))
            .build(),
        BaseShape::Capsule => {
            // Capsule3d's length is the straight section between the two caps.
            let length = (height - radius * 2.0).max(MIN_EXTENT);
            let capsule = Capsule3d::new(radius, length).mesh();
            match detail {
                0 => capsule.longitudes(12).latitudes(8).build(),
                1 => capsule.longitudes(20).latitudes(12).build(),
                _ => capsule.longitudes(32).latitudes(16).build(),
            }
        }
    }
}

fn ornament_mesh(style: SpikeStyle, length: f32, radius: f32, detail: u8) -> Mesh {
    match style {
        SpikeStyle::Cone | SpikeStyle::Inverted => Cone::new(radius, length)
            .mesh()
            .resolution(round_resolution(detail).min(16))
            .build(),
        SpikeStyle::Disk => Cylinder::new(radius * 2.0, (length * 0.15).max(0.02))
            .mesh()
            .resolution(round_resolution(detail))
            .build(),
        SpikeStyle::Block => Mesh::from(Cuboid::new(radius * 2.0, length, radius * 2.0)),
        SpikeStyle::Tentacle => {
            let capsule = Capsule3d::new(radius * 0.6, length).mesh();
            match detail {
                0 => capsule.longitudes(6).latitudes(4).build(),
                1 => capsule.longitudes(10).latitudes(6).build(),
                _ => capsule.longitudes(14).latitudes(8).build(),
            }
        }
    }
}

// =============================================================================
// POOL
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub geometries: usize,
    pub materials: usize,
}

/// Descriptor-keyed cache of mesh and material handles.
#[derive(Resource, Default)]
pub struct ResourcePool {
    meshes: HashMap<ResourceKey, Handle<Mesh>>,
    materials: HashMap<ResourceKey, Handle<StandardMaterial>>,
    hits: u64,
    misses: u64,
    warned: bool,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared mesh for `desc`, built on first request.
    pub fn geometry(&mut self, desc: &GeometryDescriptor, assets: &mut Assets<Mesh>) -> Handle<Mesh> {
        let key = desc.key();
        if let Some(handle) = self.meshes.get(&key) {
            self.hits += 1;
            return handle.clone();
        }
        let desc = desc.quantized();
        debug!("Pool miss: building mesh {desc:?}");
        let handle = assets.add(desc.build());
        self.meshes.insert(key, handle.clone());
        self.on_insert();
        handle
    }

    /// Shared material for `desc`, built on first request.
    pub fn material(
        &mut self,
        desc: &MaterialDescriptor,
        assets: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        let key = desc.key();
        if let Some(handle) = self.materials.get(&key) {
            self.hits += 1;
            return handle.clone();
        }
        debug!("Pool miss: building material {desc:?}");
        let handle = assets.add(desc.build());
        self.materials.insert(key, handle.clone());
        self.on_insert();
        handle
    }

    fn on_insert(&mut self) {
        self.misses += 1;
        let len = self.len();
        if len > SOFT_ENTRY_LIMIT && !self.warned {
            self.warned = true;
            warn!(
                "Resource pool holds {len} entries (soft limit {SOFT_ENTRY_LIMIT}); entries are never evicted"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.meshes.len() + self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits,
            misses: self.misses,
            geometries: self.meshes.len(),
            materials: self.materials.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::CreatureSpec;

    #[test]
    fn test_equal_descriptors_share_handle() {
        let mut pool = ResourcePool::new();
        let mut meshes = Assets::<Mesh>::default();
        let spec = CreatureSpec::new("urchin", 1);
        let a = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        let b = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        assert_eq!(a.id(), b.id());
        assert_eq!(pool.stats().hits, 1);
        assert_eq!(pool.stats().misses, 1);
        assert_eq!(meshes.len(), 1);
    }

    #[test]
    fn test_tiny_float_noise_shares_handle() {
        let mut pool = ResourcePool::new();
        let mut meshes = Assets::<Mesh>::default();
        let a = pool.geometry(&GeometryDescriptor::node(0.08, 1), &mut meshes);
        let b = pool.geometry(&GeometryDescriptor::node(0.080_000_01, 1), &mut meshes);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_different_shapes_get_different_handles() {
        let mut pool = ResourcePool::new();
        let mut meshes = Assets::<Mesh>::default();
        let mut spec = CreatureSpec::new("urchin", 1);
        let sphere = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        spec.body.shape = BaseShape::HexPrism;
        let prism = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        assert_ne!(sphere.id(), prism.id());
        assert_eq!(pool.stats().geometries, 2);
    }

    #[test]
    fn test_color_only_changes_material() {
        let mut pool = ResourcePool::new();
        let mut materials = Assets::<StandardMaterial>::default();
        let surface = Surface { metalness: 0.2, roughness: 0.5 };
        let red = pool.material(&MaterialDescriptor::new(Color::srgb(1.0, 0.0, 0.0), surface), &mut materials);
        let blue = pool.material(&MaterialDescriptor::new(Color::srgb(0.0, 0.0, 1.0), surface), &mut materials);
        let red_again = pool.material(&MaterialDescriptor::new(Color::srgb(1.0, 0.0, 0.0), surface), &mut materials);
        assert_ne!(red.id(), blue.id());
        assert_eq!(red.id(), red_again.id());
    }

    #[test]
    fn test_negative_zero_keys_like_zero() {
        let surface = Surface { metalness: 0.0, roughness: 0.5 };
        let a = MaterialDescriptor::new(Color::srgb(0.0, 0.5, 0.5), surface);
        let mut b = a;
        b.metallic = -0.0;
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_sphere_height_does_not_split_meshes() {
        let mut pool = ResourcePool::new();
        let mut meshes = Assets::<Mesh>::default();
        let mut spec = CreatureSpec::new("urchin", 1);
        spec.body.height = 2.0;
        let a = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        spec.body.height = 3.0;
        let b = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        assert_eq!(a.id(), b.id());
        assert_eq!(meshes.len(), 1);

        spec.body.shape = BaseShape::Cylinder;
        let tall = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        spec.body.height = 2.0;
        let short = pool.geometry(&GeometryDescriptor::body(&spec.body), &mut meshes);
        assert_ne!(tall.id(), short.id());
    }

    #[test]
    fn test_block_detail_does_not_split_meshes() {
        let mut spec = CreatureSpec::new("urchin", 1);
        spec.spikes.style = SpikeStyle::Block;
        assert_eq!(
            GeometryDescriptor::ornament(&spec.spikes, 0).key(),
            GeometryDescriptor::ornament(&spec.spikes, 2).key()
        );
        spec.spikes.style = SpikeStyle::Tentacle;
        assert_ne!(
            GeometryDescriptor::ornament(&spec.spikes, 0).key(),
            GeometryDescriptor::ornament(&spec.spikes, 2).key()
        );
    }

    #[test]
    fn test_raw_descriptor_builds_quantized_mesh() {
        let mut pool = ResourcePool::new();
        let mut meshes = Assets::<Mesh>::default();
        let raw = GeometryDescriptor::Node {
            radius: 0.080_000_01,
            detail: 1,
        };
        let handle = pool.geometry(&raw, &mut meshes);
        let built = meshes.get(&handle).unwrap();
        let expected = GeometryDescriptor::node(0.08, 1).build();
        assert_eq!(
            built.attribute(Mesh::ATTRIBUTE_POSITION).unwrap().as_float3(),
            expected.attribute(Mesh::ATTRIBUTE_POSITION).unwrap().as_float3()
        );
    }

    #[test]
    fn test_every_shape_and_style_builds() {
        let mut spec = CreatureSpec::new("urchin", 1);
        for shape in [
            BaseShape::Icosahedron,
            BaseShape::Sphere,
            BaseShape::TriPrism,
            BaseShape::HexPrism,
            BaseShape::Cylinder,
            BaseShape::Capsule,
        ] {
            spec.body.shape = shape;
            for detail in 0..=2 {
                spec.body.detail = detail;
                let mesh = GeometryDescriptor::body(&spec.body).build();
                assert!(mesh.count_vertices() > 0, "{shape:?} detail {detail}");
            }
        }
        for style in [
            SpikeStyle::Cone,
            SpikeStyle::Inverted,
            SpikeStyle::Disk,
            SpikeStyle::Block,
            SpikeStyle::Tentacle,
        ] {
            spec.spikes.style = style;
            let mesh = GeometryDescriptor::ornament(&spec.spikes, 1).build();
            assert!(mesh.count_vertices() > 0, "{style:?}");
        }
    }

    #[test]
    fn test_material_build_carries_fields() {
        let desc = MaterialDescriptor::new(Color::srgb(0.2, 0.4, 0.6), Surface { metalness: 0.7, roughness: 0.3 })
            .with_emissive(LinearRgba::rgb(1.0, 2.0, 3.0))
            .blended()
            .unlit();
        let mat = desc.build();
        assert_eq!(mat.metallic, 0.7);
        assert_eq!(mat.perceptual_roughness, 0.3);
        assert!(mat.unlit);
        assert!(matches!(mat.alpha_mode, AlphaMode::Blend));
        assert_eq!(mat.emissive, LinearRgba::rgb(1.0, 2.0, 3.0));
    }
}
