//! Fixed-step body world
//!
//! Every body is an axis-aligned box. Dynamic bodies move by the velocity set
//! on them and are pushed out of static solid bodies one axis at a time.
//! Sensors never push anything; they only produce contact events.
//!
//! Bodies are addressed through generational handles, so a handle that has
//! been released can never alias a newer body in the same slot.

use std::collections::HashSet;

use glam::{IVec2, Vec2};

/// Overlap tolerance so that bodies resting flush against each other do not
/// count as touching
const CONTACT_EPSILON: f32 = 1e-4;

/// Handle to a body in a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

/// Whether a body moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Game object owning a body, reported back in contact events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Wall(IVec2),
    Exit(IVec2),
    Player,
    Enemy(u32),
    Bomb(u32),
    PowerUp(u32),
    Arrow(u32),
    /// Edge of the world rectangle
    Boundary,
}

/// Description of a body to insert
#[derive(Debug, Clone, Copy)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub tag: BodyTag,
    pub position: Vec2,
    pub half_extents: Vec2,
    pub sensor: bool,
}

impl BodyDef {
    /// Immovable blocking body (walls)
    pub fn solid(tag: BodyTag, position: Vec2, half_extent: f32) -> Self {
        Self {
            kind: BodyKind::Static,
            tag,
            position,
            half_extents: Vec2::splat(half_extent),
            sensor: false,
        }
    }

    /// Immovable overlap detector (bombs, power-ups, exit)
    pub fn sensor(tag: BodyTag, position: Vec2, half_extent: f32) -> Self {
        Self {
            kind: BodyKind::Static,
            tag,
            position,
            half_extents: Vec2::splat(half_extent),
            sensor: true,
        }
    }

    /// Moving body driven by its velocity (player, enemies, arrows)
    pub fn dynamic(tag: BodyTag, position: Vec2, half_extent: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            tag,
            position,
            half_extents: Vec2::splat(half_extent),
            sensor: false,
        }
    }
}

/// Something that happened during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    /// A dynamic body `a` started overlapping a sensor or another dynamic body `b`
    Began { a: BodyTag, b: BodyTag },
    /// A dynamic body was stopped by a solid body
    Blocked { body: BodyTag, by: BodyTag },
}

/// Result of a box overlap test
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the boxes overlap
    pub hit: bool,
    /// Axis of least penetration, pointing from the second box toward the first
    pub normal: Vec2,
    /// Penetration depth along `normal`
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two axis-aligned boxes
pub fn box_overlap(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> CollisionResult {
    let delta = a_pos - b_pos;
    let overlap = (a_half + b_half) - delta.abs();

    if overlap.x <= CONTACT_EPSILON || overlap.y <= CONTACT_EPSILON {
        return CollisionResult::miss();
    }

    // Separate along the shallower axis
    if overlap.x < overlap.y {
        CollisionResult {
            hit: true,
            normal: Vec2::new(if delta.x < 0.0 { -1.0 } else { 1.0 }, 0.0),
            penetration: overlap.x,
        }
    } else {
        CollisionResult {
            hit: true,
            normal: Vec2::new(0.0, if delta.y < 0.0 { -1.0 } else { 1.0 }),
            penetration: overlap.y,
        }
    }
}

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    tag: BodyTag,
    position: Vec2,
    velocity: Vec2,
    half_extents: Vec2,
    sensor: bool,
}

impl Body {
    fn is_solid(&self) -> bool {
        self.kind == BodyKind::Static && !self.sensor
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// The body world
#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Overlapping pairs from the last step, as ordered slot index pairs
    touching: HashSet<(u32, u32)>,
    contacts: Vec<ContactEvent>,
    /// Min and max corners dynamic bodies are kept inside
    bounds: Option<(Vec2, Vec2)>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every dynamic body inside the rectangle `min..max`.
    ///
    /// Hitting an edge works like hitting a solid wall tagged
    /// [`BodyTag::Boundary`].
    pub fn set_bounds(&mut self, min: Vec2, max: Vec2) {
        self.bounds = Some((min.min(max), min.max(max)));
    }

    /// Insert a body and return its handle
    pub fn insert(&mut self, def: BodyDef) -> BodyHandle {
        let body = Body {
            kind: def.kind,
            tag: def.tag,
            position: def.position,
            velocity: Vec2::ZERO,
            half_extents: def.half_extents,
            sensor: def.sensor,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Release a body. Returns false if the handle was already released.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index as usize];
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.touching
            .retain(|&(a, b)| a != handle.index && b != handle.index);
        true
    }

    /// Whether the handle still refers to a live body
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| b.position)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| b.velocity)
    }

    pub fn tag(&self, handle: BodyHandle) -> Option<BodyTag> {
        self.body(handle).map(|b| b.tag)
    }

    /// Set the velocity consumed by the next step (ignored for stale handles)
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.velocity = velocity;
        }
    }

    /// Move a body without collision response
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.position = position;
        }
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// Whether two bodies overlapped at the end of the last step
    pub fn is_touching(&self, a: BodyHandle, b: BodyHandle) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        self.touching.contains(&ordered(a.index, b.index))
    }

    /// Take the contact events produced since the last drain
    pub fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    /// Advance all dynamic bodies by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let dynamic: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(&s.body, Some(b) if b.kind == BodyKind::Dynamic))
            .map(|(i, _)| i)
            .collect();

        for &index in &dynamic {
            self.integrate(index, dt);
        }

        self.update_touching(&dynamic);
    }

    fn integrate(&mut self, index: usize, dt: f32) {
        let Some(body) = self.slots[index].body.as_ref() else {
            return;
        };
        let delta = body.velocity * dt;
        if delta == Vec2::ZERO {
            return;
        }
        let tag = body.tag;
        let half = body.half_extents;
        let mut position = body.position;
        let mut velocity = body.velocity;
        let mut blockers = Vec::new();

        // X then Y, so sliding along a wall keeps the free axis
        for axis in 0..2 {
            if delta[axis] == 0.0 {
                continue;
            }
            position[axis] += delta[axis];

            for other in self.slots.iter().filter_map(|s| s.body.as_ref()) {
                if !other.is_solid() {
                    continue;
                }
                let hit = box_overlap(position, half, other.position, other.half_extents);
                if !hit.hit {
                    continue;
                }
                let reach = half[axis] + other.half_extents[axis];
                position[axis] = if delta[axis] > 0.0 {
                    other.position[axis] - reach
                } else {
                    other.position[axis] + reach
                };
                velocity[axis] = 0.0;
                if !blockers.contains(&other.tag) {
                    blockers.push(other.tag);
                }
            }

            if let Some((min, max)) = self.bounds {
                let low = min[axis] + half[axis];
                let high = max[axis] - half[axis];
                let kept = if low <= high {
                    position[axis].clamp(low, high)
                } else {
                    (min[axis] + max[axis]) * 0.5
                };
                if kept != position[axis] {
                    position[axis] = kept;
                    velocity[axis] = 0.0;
                    if !blockers.contains(&BodyTag::Boundary) {
                        blockers.push(BodyTag::Boundary);
                    }
                }
            }
        }

        if let Some(body) = self.slots[index].body.as_mut() {
            body.position = position;
            body.velocity = velocity;
        }
        self.contacts.extend(
            blockers
                .into_iter()
                .map(|by| ContactEvent::Blocked { body: tag, by }),
        );
    }

    fn update_touching(&mut self, dynamic: &[usize]) {
        let mut now = HashSet::new();

        for &i in dynamic {
            let Some(a) = self.slots[i].body.as_ref() else {
                continue;
            };
            for (j, slot) in self.slots.iter().enumerate() {
                if i == j {
                    continue;
                }
                let Some(b) = slot.body.as_ref() else {
                    continue;
                };
                let pairs_with = b.sensor || (b.kind == BodyKind::Dynamic && j > i);
                if !pairs_with {
                    continue;
                }
                if !box_overlap(a.position, a.half_extents, b.position, b.half_extents).hit {
                    continue;
                }
                let key = ordered(i as u32, j as u32);
                if now.insert(key) && !self.touching.contains(&key) {
                    self.contacts.push(ContactEvent::Began { a: a.tag, b: b.tag });
                }
            }
        }

        self.touching = now;
    }

    fn body(&self, handle: BodyHandle) -> Option<&Body> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}
