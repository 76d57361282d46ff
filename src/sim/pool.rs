//! Fixed-capacity projectile pool
//!
//! Slots live in a dense arena and are addressed by `ProjectileHandle`
//! (index + generation). Every deactivation bumps the slot's generation, so a
//! handle held past its projectile's death can never reach the slot's next
//! occupant.
//!
//! Invariants:
//! - `free + live == allocated <= capacity`
//! - a slot index is in exactly one of `free` / `live`
//! - `live` holds only alive projectiles

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::{Deactivation, Projectile, ProjectileKind, StepOutcome};
use crate::error::SimError;

/// Generational reference to a pooled projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileHandle {
    index: u32,
    generation: u32,
}

impl ProjectileHandle {
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ProjectileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Sentinel for "not in the live list"
const NOT_LIVE: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Slot {
    projectile: Projectile,
    generation: u32,
    /// Position in `live`, or NOT_LIVE
    live_pos: usize,
}

/// Pool construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Slots allocated up front
    pub initial_size: usize,
    /// Hard cap on allocated slots
    pub capacity: usize,
    /// Lifetime given to every projectile (seconds)
    pub lifetime: f32,
    /// Face travel direction on spawn
    pub rotate_to_direction: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        use crate::consts::*;
        Self {
            initial_size: POOL_INITIAL_SIZE,
            capacity: POOL_CAPACITY,
            lifetime: BULLET_LIFETIME,
            rotate_to_direction: true,
        }
    }
}

/// Projectile pool
#[derive(Debug, Clone)]
pub struct ProjectilePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: Vec<u32>,
    capacity: usize,
    lifetime: f32,
    rotate_to_direction: bool,
    /// Stamped onto projectiles activated during the current tick
    current_tick: u64,
}

impl ProjectilePool {
    /// Create a pool, pre-allocating `initial_size` dormant slots
    pub fn new(settings: &PoolSettings) -> Self {
        let capacity = settings.capacity.max(1);
        let initial = settings.initial_size.min(capacity);
        let mut pool = Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            live: Vec::with_capacity(capacity),
            capacity,
            lifetime: settings.lifetime,
            rotate_to_direction: settings.rotate_to_direction,
            current_tick: 0,
        };
        for _ in 0..initial {
            let index = pool.allocate_slot();
            pool.free.push(index);
        }
        log::debug!("Projectile pool ready: {} of {} slots allocated", initial, capacity);
        pool
    }

    fn allocate_slot(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            projectile: Projectile::dormant(self.lifetime),
            generation: 0,
            live_pos: NOT_LIVE,
        });
        index
    }

    /// Mark the start of a simulation tick
    pub fn begin_tick(&mut self, tick: u64) {
        self.current_tick = tick;
    }

    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots allocated so far (free + live)
    #[inline]
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Every slot allocated; further spawns only succeed by reuse
    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Activate a projectile, reusing a free slot or allocating up to capacity
    pub fn spawn(
        &mut self,
        pos: Vec2,
        dir: Vec2,
        speed: f32,
        kind: ProjectileKind,
    ) -> Result<ProjectileHandle, SimError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if !self.is_full() => self.allocate_slot(),
            None => {
                return Err(SimError::PoolExhausted {
                    capacity: self.capacity,
                });
            }
        };

        let live_pos = self.live.len();
        self.live.push(index);

        let slot = &mut self.slots[index as usize];
        slot.live_pos = live_pos;
        slot.projectile.activate(
            pos,
            dir,
            speed,
            kind,
            self.rotate_to_direction,
            self.current_tick,
        );

        Ok(ProjectileHandle {
            index,
            generation: slot.generation,
        })
    }

    fn slot_index(&self, handle: ProjectileHandle) -> Option<usize> {
        let index = handle.index();
        let slot = self.slots.get(index)?;
        (slot.generation == handle.generation && slot.projectile.is_alive()).then_some(index)
    }

    /// Look up a live projectile
    pub fn get(&self, handle: ProjectileHandle) -> Option<&Projectile> {
        self.slot_index(handle).map(|i| &self.slots[i].projectile)
    }

    /// Look up a live projectile mutably
    pub fn get_mut(&mut self, handle: ProjectileHandle) -> Option<&mut Projectile> {
        self.slot_index(handle).map(|i| &mut self.slots[i].projectile)
    }

    #[inline]
    pub fn is_live(&self, handle: ProjectileHandle) -> bool {
        self.slot_index(handle).is_some()
    }

    /// Enable acceleration on a freshly spawned projectile
    pub fn set_acceleration(
        &mut self,
        handle: ProjectileHandle,
        rate: f32,
        max_speed: f32,
    ) -> Result<(), SimError> {
        let projectile = self.get_mut(handle).ok_or(SimError::StaleHandle(handle))?;
        projectile.set_acceleration(rate, max_speed);
        Ok(())
    }

    /// Deactivate a projectile and return its slot. No-op on stale handles.
    pub fn deactivate(&mut self, handle: ProjectileHandle, reason: Deactivation) -> bool {
        match self.slot_index(handle) {
            Some(index) => {
                self.release(index);
                log::trace!("Projectile {} returned to pool ({:?})", handle, reason);
                true
            }
            None => false,
        }
    }

    /// Return a projectile to the pool (idempotent)
    pub fn recycle(&mut self, handle: ProjectileHandle) -> bool {
        self.deactivate(handle, Deactivation::Recycled)
    }

    /// Return every live projectile to the pool
    pub fn recycle_all(&mut self) -> usize {
        let count = self.live.len();
        while let Some(&index) = self.live.last() {
            self.release(index as usize);
        }
        count
    }

    fn release(&mut self, index: usize) {
        let live_pos = self.slots[index].live_pos;
        debug_assert!(live_pos != NOT_LIVE, "released slot {} was not live", index);

        // O(1) removal; the moved entry gets its back-pointer fixed
        self.live.swap_remove(live_pos);
        if let Some(&moved) = self.live.get(live_pos) {
            self.slots[moved as usize].live_pos = live_pos;
        }

        let slot = &mut self.slots[index];
        slot.projectile.deactivate();
        slot.generation = slot.generation.wrapping_add(1);
        slot.live_pos = NOT_LIVE;
        self.free.push(index as u32);
    }

    /// Handles of all live projectiles, in live-list order
    pub fn live_handles(&self) -> impl Iterator<Item = ProjectileHandle> + '_ {
        self.live.iter().map(|&index| ProjectileHandle {
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Live projectiles with their handles
    pub fn iter_live(&self) -> impl Iterator<Item = (ProjectileHandle, &Projectile)> + '_ {
        self.live.iter().map(|&index| {
            let slot = &self.slots[index as usize];
            (
                ProjectileHandle {
                    index,
                    generation: slot.generation,
                },
                &slot.projectile,
            )
        })
    }

    /// Advance every live projectile; expired ones go back to the pool.
    /// Returns how many expired.
    pub fn advance(&mut self, dt: f32) -> usize {
        let mut expired = 0;
        // Walk backwards so swap_remove never skips an entry
        let mut i = self.live.len();
        while i > 0 {
            i -= 1;
            let index = self.live[i] as usize;
            if self.slots[index].projectile.step(dt) == StepOutcome::Expired {
                self.release(index);
                expired += 1;
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DOWN;

    fn pool(initial: usize, capacity: usize) -> ProjectilePool {
        ProjectilePool::new(&PoolSettings {
            initial_size: initial,
            capacity,
            ..Default::default()
        })
    }

    fn spawn(pool: &mut ProjectilePool) -> Result<ProjectileHandle, SimError> {
        pool.spawn(Vec2::ZERO, DOWN, 1.0, ProjectileKind::Normal)
    }

    #[test]
    fn test_prewarm_clamped_to_capacity() {
        let p = pool(10, 4);
        assert_eq!(p.allocated(), 4);
        assert_eq!(p.free_count(), 4);
        assert!(p.is_full());
    }

    #[test]
    fn test_exhaustion_at_capacity() {
        let mut p = pool(2, 5);
        for _ in 0..5 {
            assert!(spawn(&mut p).is_ok());
        }
        assert_eq!(spawn(&mut p), Err(SimError::PoolExhausted { capacity: 5 }));
        assert_eq!(p.live_count(), 5);
        assert_eq!(p.free_count(), 0);
    }

    #[test]
    fn test_recycle_twice_is_noop() {
        let mut p = pool(0, 3);
        let a = spawn(&mut p).unwrap();
        let _b = spawn(&mut p).unwrap();
        assert!(p.recycle(a));
        let (live, free) = (p.live_count(), p.free_count());
        assert!(!p.recycle(a));
        assert_eq!((p.live_count(), p.free_count()), (live, free));
    }

    #[test]
    fn test_stale_handle_cannot_reach_new_occupant() {
        let mut p = pool(0, 1);
        let old = spawn(&mut p).unwrap();
        p.recycle(old);
        let new = spawn(&mut p).unwrap();
        assert_eq!(old.index(), new.index());
        assert!(p.get(old).is_none());
        assert!(!p.recycle(old));
        assert!(p.is_live(new));
        assert_eq!(
            p.set_acceleration(old, 1.0, 2.0),
            Err(SimError::StaleHandle(old))
        );
    }

    #[test]
    fn test_removal_keeps_live_list_consistent() {
        let mut p = pool(0, 8);
        let handles: Vec<_> = (0..6).map(|_| spawn(&mut p).unwrap()).collect();
        p.recycle(handles[1]);
        p.recycle(handles[4]);
        let live: Vec<_> = p.live_handles().collect();
        assert_eq!(live.len(), 4);
        for h in [handles[0], handles[2], handles[3], handles[5]] {
            assert!(live.contains(&h));
            assert!(p.recycle(h));
        }
        assert_eq!(p.live_count(), 0);
        assert_eq!(p.free_count(), 6);
    }

    #[test]
    fn test_advance_expires_and_recycles() {
        let mut p = ProjectilePool::new(&PoolSettings {
            initial_size: 0,
            capacity: 4,
            lifetime: 1.0,
            rotate_to_direction: false,
        });
        let a = spawn(&mut p).unwrap();
        p.advance(0.5);
        let b = spawn(&mut p).unwrap();
        assert_eq!(p.advance(0.5), 1);
        assert!(!p.is_live(a));
        assert!(p.is_live(b));
        assert_eq!(p.live_count() + p.free_count(), p.allocated());
    }

    #[test]
    fn test_recycle_all() {
        let mut p = pool(0, 4);
        for _ in 0..3 {
            spawn(&mut p).unwrap();
        }
        assert_eq!(p.recycle_all(), 3);
        assert_eq!(p.live_count(), 0);
        assert_eq!(p.free_count(), 3);
    }

    #[test]
    fn test_spawn_stamps_current_tick() {
        let mut p = pool(1, 1);
        p.begin_tick(42);
        let h = spawn(&mut p).unwrap();
        assert_eq!(p.get(h).map(|b| b.spawn_tick), Some(42));
    }
}
