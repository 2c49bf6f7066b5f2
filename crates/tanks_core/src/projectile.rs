//! Pooled projectiles.
//!
//! The pool allocates its slots once and recycles them: destroying a
//! projectile only clears its `alive` flag. When every slot is busy the
//! pool grows by one instead of failing.

use serde::{Deserialize, Serialize};

use crate::components::ActorId;
use crate::math::{Fixed, Rect, Vec2Fixed};

/// Class of actor that fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectileOwner {
    /// Fired by the player.
    #[default]
    Player,
    /// Fired by an AI tank.
    Ai,
}

/// One pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Projectile {
    /// Center, in pixels.
    pub position: Vec2Fixed,
    /// Unit flight direction.
    pub direction: Vec2Fixed,
    /// Pixels per second.
    pub speed: Fixed,
    /// Damage applied on an actor or base hit.
    pub damage: u32,
    /// Shooter class.
    pub owner: ProjectileOwner,
    /// Shooter id, if known.
    pub shooter: Option<ActorId>,
    /// Bounding box size.
    pub size: Vec2Fixed,
    /// Inert slots have `alive == false`.
    pub alive: bool,
}

impl Projectile {
    /// Bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }
}

/// Parameters for a new projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileSpawn {
    /// Start center.
    pub position: Vec2Fixed,
    /// Flight direction (normalized on acquire).
    pub direction: Vec2Fixed,
    /// Pixels per second.
    pub speed: Fixed,
    /// Damage.
    pub damage: u32,
    /// Shooter class.
    pub owner: ProjectileOwner,
    /// Shooter id.
    pub shooter: Option<ActorId>,
}

/// Reusable projectile storage with an active index list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectilePool {
    slots: Vec<Projectile>,
    /// Slot indices in activation order. May briefly hold dead slots until
    /// [`ProjectilePool::cleanup`].
    active: Vec<usize>,
    size: Vec2Fixed,
}

impl ProjectilePool {
    /// Pre-allocate `capacity` inert projectiles of `size`.
    #[must_use]
    pub fn new(capacity: usize, size: Vec2Fixed) -> Self {
        let slot = Projectile {
            size,
            ..Projectile::default()
        };
        Self {
            slots: vec![slot; capacity],
            active: Vec::with_capacity(capacity),
            size,
        }
    }

    /// Reinitialize the first inert slot (or a new one) and mark it alive.
    /// Returns the slot index.
    pub fn acquire(&mut self, spawn: ProjectileSpawn) -> usize {
        let index = if let Some(free) = self.slots.iter().position(|p| !p.alive) {
            free
        } else {
            self.slots.push(Projectile::default());
            tracing::debug!(capacity = self.slots.len(), "Projectile pool grown");
            self.slots.len() - 1
        };

        self.slots[index] = Projectile {
            position: spawn.position,
            direction: spawn.direction.normalize(),
            speed: spawn.speed,
            damage: spawn.damage,
            owner: spawn.owner,
            shooter: spawn.shooter,
            size: self.size,
            alive: true,
        };
        if !self.active.contains(&index) {
            self.active.push(index);
        }
        index
    }

    /// Mark a projectile inert. It stays in the active list until cleanup.
    pub fn deactivate(&mut self, index: usize) {
        if let Some(p) = self.slots.get_mut(index) {
            p.alive = false;
        }
    }

    /// Slot by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Projectile> {
        self.slots.get(index)
    }

    /// Active list snapshot (activation order).
    #[must_use]
    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    /// Alive projectiles with their slot index, in activation order.
    pub fn iter_alive(&self) -> impl Iterator<Item = (usize, &Projectile)> {
        self.active
            .iter()
            .map(|&i| (i, &self.slots[i]))
            .filter(|(_, p)| p.alive)
    }

    /// Number of alive projectiles.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|p| p.alive).count()
    }

    /// Total slots, alive or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Fly every alive projectile for `dt` seconds.
    pub fn advance(&mut self, dt: Fixed) {
        for &index in &self.active {
            let p = &mut self.slots[index];
            if p.alive {
                p.position = p.position + p.direction.scale(p.speed * dt);
            }
        }
    }

    /// Drop dead entries from the active list. Slots are kept for reuse.
    pub fn cleanup(&mut self) {
        let slots = &self.slots;
        self.active.retain(|&i| slots[i].alive);
    }
}
