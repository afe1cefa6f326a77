use crate::anim::{Animator, Channel, ChannelId, Ease, Tween};
use crate::assets::SoundSet;
use crate::geometry::{self, MeshData};
use crate::instance::{
    EntryPhase, ShapeInstance, REVEAL_DELAY, REVEAL_DURATION, SPIN_DURATION, SPIN_MAX_OFFSET,
};
use crate::motion::FloatMotion;
use crate::rng::RandomSource;
use glam::Vec3;
use std::fmt;

/// Registry positions are spread by this factor before instantiation so the
/// shapes fill the visible volume
pub const POSITION_SPREAD: f32 = 2.0;

/// The five shape silhouettes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Icosahedron,
    Capsule,
    Dodecahedron,
    Torus,
    Octahedron,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Icosahedron,
        ShapeKind::Capsule,
        ShapeKind::Dodecahedron,
        ShapeKind::Torus,
        ShapeKind::Octahedron,
    ];

    /// Stable index into per-kind tables
    pub fn index(&self) -> usize {
        match self {
            ShapeKind::Icosahedron => 0,
            ShapeKind::Capsule => 1,
            ShapeKind::Dodecahedron => 2,
            ShapeKind::Torus => 3,
            ShapeKind::Octahedron => 4,
        }
    }

    /// Natural-size mesh for this silhouette
    pub fn mesh(&self) -> MeshData {
        match self {
            ShapeKind::Icosahedron => geometry::icosahedron(3.0),
            ShapeKind::Capsule => geometry::capsule(0.5, 1.6, 2, 16),
            ShapeKind::Dodecahedron => geometry::dodecahedron(1.5),
            ShapeKind::Torus => geometry::torus(0.6, 0.25, 16, 32),
            ShapeKind::Octahedron => geometry::octahedron(1.5),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Icosahedron => "icosahedron",
            ShapeKind::Capsule => "capsule",
            ShapeKind::Dodecahedron => "dodecahedron",
            ShapeKind::Torus => "torus",
            ShapeKind::Octahedron => "octahedron",
        };
        f.write_str(name)
    }
}

/// Fixed placement record for one shape
#[derive(Debug, Clone, Copy)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    /// Unspread position; multiply by [`POSITION_SPREAD`] before mounting
    pub position: Vec3,
    /// Drives ambient motion speed and amplitude
    pub radius_factor: f32,
}

impl ShapeDescriptor {
    pub fn spread_position(&self) -> Vec3 {
        self.position * POSITION_SPREAD
    }
}

/// The five fixed descriptors, centerpiece first
pub fn shape_descriptors() -> [ShapeDescriptor; 5] {
    [
        ShapeDescriptor {
            kind: ShapeKind::Icosahedron,
            position: Vec3::new(0.0, 0.0, 0.0),
            radius_factor: 0.3,
        },
        ShapeDescriptor {
            kind: ShapeKind::Capsule,
            position: Vec3::new(1.0, -0.75, 4.0),
            radius_factor: 0.4,
        },
        ShapeDescriptor {
            kind: ShapeKind::Dodecahedron,
            position: Vec3::new(-1.4, 2.0, -4.0),
            radius_factor: 0.6,
        },
        ShapeDescriptor {
            kind: ShapeKind::Torus,
            position: Vec3::new(-0.8, -0.75, 5.0),
            radius_factor: 0.5,
        },
        ShapeDescriptor {
            kind: ShapeKind::Octahedron,
            position: Vec3::new(1.6, 1.6, -4.0),
            radius_factor: 0.7,
        },
    ]
}

/// Surface appearance, shared by index across all instances
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialDef {
    /// Shade by surface normal, no lighting
    Normal,
    /// Lit colored surface; color is linear RGB
    Standard {
        color: [f32; 3],
        roughness: f32,
        metalness: f32,
    },
}

const PALETTE_ROUGHNESS: f32 = 0.0001;
const PALETTE_METALNESS: f32 = 0.5;

/// Convert an 8-bit sRGB channel to linear
fn srgb_channel(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn hex_color(hex: u32) -> [f32; 3] {
    [
        srgb_channel((hex >> 16) as u8),
        srgb_channel((hex >> 8) as u8),
        srgb_channel(hex as u8),
    ]
}

/// The fifteen-entry palette: one normal-shaded material followed by
/// fourteen glossy colored ones
pub fn material_palette() -> Vec<MaterialDef> {
    let colors: [u32; 14] = [
        0xff1493, // deep pink
        0xff4500, // orange red
        0x32cd32, // lime green
        0x800000, // maroon
        0x9932cc, // dark orchid
        0x4682b4, // steel blue
        0x8b4513, // saddle brown
        0xd2691e, // chocolate
        0x2e8b57, // sea green
        0x708090, // slate gray
        0x6a5acd, // slate blue
        0x87cefa, // light sky blue
        0xff69b4, // hot pink
        0xf0e68c, // khaki
    ];

    let mut palette = Vec::with_capacity(1 + colors.len());
    palette.push(MaterialDef::Normal);
    palette.extend(colors.iter().map(|&hex| MaterialDef::Standard {
        color: hex_color(hex),
        roughness: PALETTE_ROUGHNESS,
        metalness: PALETTE_METALNESS,
    }));
    palette
}

/// What a click produced, for the caller to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickFeedback {
    pub clip_index: usize,
    pub material_index: usize,
}

/// The mounted scene: five interactive instances plus the shared palette,
/// sound set, and tween timeline.
pub struct Scene {
    pub instances: Vec<ShapeInstance>,
    pub animator: Animator,
    pub palette: Vec<MaterialDef>,
    pub sounds: SoundSet,
    /// Seconds since mount, the time basis for ambient motion
    pub elapsed: f32,
}

impl Scene {
    /// Instantiate every descriptor. Each instance gets its own animation
    /// scope, a random ambient phase, a random starting material, and an
    /// entry tween that pops it in after the reveal delay.
    pub fn mount(sounds: SoundSet, rng: &mut dyn RandomSource) -> Self {
        let palette = material_palette();
        let mut animator = Animator::new();
        let mut instances = Vec::with_capacity(5);

        for descriptor in shape_descriptors() {
            let scope = animator.create_scope();
            let phase = rng.range_f32(0.0, 10_000.0);
            let material_index = rng.pick_index(palette.len());
            let bounding_radius = descriptor.kind.mesh().bounding_radius();

            let index = instances.len();
            instances.push(ShapeInstance::new(
                descriptor.kind,
                descriptor.spread_position(),
                descriptor.radius_factor,
                bounding_radius,
                material_index,
                FloatMotion::from_radius_factor(descriptor.radius_factor, phase),
                scope,
            ));

            animator.spawn(
                scope,
                Tween::new(ChannelId::new(index, Channel::Scale), 0.0, 1.0, REVEAL_DURATION)
                    .with_delay(REVEAL_DELAY)
                    .with_ease(Ease::elastic_out(1.0, 0.3)),
            );
        }

        log::info!("scene mounted with {} shapes", instances.len());

        Self {
            instances,
            animator,
            palette,
            sounds,
            elapsed: 0.0,
        }
    }

    /// Per-frame tick: advance entry timers, tweens, and the time basis
    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;

        for inst in &mut self.instances {
            inst.tick(dt);
        }

        self.animator.advance(dt, &mut self.instances);

        for index in 0..self.instances.len() {
            let scale_id = ChannelId::new(index, Channel::Scale);
            if self.instances[index].phase == EntryPhase::Revealing
                && !self.animator.is_channel_active(scale_id)
            {
                self.instances[index].finish_reveal();
            }
        }
    }

    /// Click feedback for the instance at `index`: draw a clip, spin the
    /// shape with an elastic yoyo around each axis, and swap the material.
    /// Returns `None` when the index no longer names a live instance.
    pub fn click(&mut self, index: usize, rng: &mut dyn RandomSource) -> Option<ClickFeedback> {
        if index >= self.instances.len() {
            return None;
        }

        let clip_index = rng.pick_index(self.sounds.len());

        let scope = self.instances[index].scope;
        let base = self.instances[index].rotation;
        let spin = [
            (Channel::RotationX, base.x),
            (Channel::RotationY, base.y),
            (Channel::RotationZ, base.z),
        ];
        for (channel, start) in spin {
            let offset = rng.range_f32(0.0, SPIN_MAX_OFFSET);
            self.animator.spawn(
                scope,
                Tween::new(ChannelId::new(index, channel), start, start + offset, SPIN_DURATION)
                    .with_ease(Ease::elastic_out(1.0, 0.3))
                    .with_yoyo(),
            );
        }

        let material_index = rng.pick_index(self.palette.len());
        self.instances[index].material_index = material_index;

        log::debug!(
            "clicked {}: clip {} material {}",
            self.instances[index].kind,
            clip_index,
            material_index
        );

        Some(ClickFeedback {
            clip_index,
            material_index,
        })
    }

    /// Tear the scene down: every instance's scope is released, which
    /// synchronously cancels its tweens and restores their captured start
    /// values, then the instances drop. Nothing can mutate them afterwards.
    pub fn unmount(&mut self) {
        let scopes: Vec<_> = self.instances.iter().map(|inst| inst.scope).collect();
        for scope in scopes {
            self.animator.release(scope, &mut self.instances);
        }
        self.instances.clear();
        log::info!("scene unmounted");
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if !self.instances.is_empty() {
            self.unmount();
        }
    }
}
