//! Discrete-event tick scheduler on a virtual millisecond clock.
//!
//! Each live entity owns one timer. A timer is armed when the entity appears,
//! fires once, and is re-armed only after its tick has completed, so an entity
//! never runs two ticks concurrently. Every arming draws a fresh generation, and
//! heap entries whose generation no longer matches a live timer are dropped
//! when popped.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ahash::AHashMap;
use hoard_common::EntityKey;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::EntityType;
use crate::world::World;

/// Inclusive range a tick delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickBand {
    /// Shortest delay in milliseconds
    pub min_ms: u64,
    /// Longest delay in milliseconds
    pub max_ms: u64,
}

impl TickBand {
    /// Creates a band; bounds are swapped if given backwards.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// Draws a delay uniformly from the band.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> u64 {
        rng.u64(self.min_ms..=self.max_ms)
    }
}

/// Delay bands for every recurring job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickBands {
    /// Minion think interval
    pub minion: TickBand,
    /// Stealer think interval
    pub stealer: TickBand,
    /// Delay before the first random point drop
    pub point_drop_initial: TickBand,
    /// Interval between later point drops
    pub point_drop: TickBand,
}

impl Default for TickBands {
    fn default() -> Self {
        Self {
            minion: TickBand::new(2500, 3500),
            stealer: TickBand::new(2000, 3000),
            point_drop_initial: TickBand::new(1000, 10_000),
            point_drop: TickBand::new(1000, 5000),
        }
    }
}

impl TickBands {
    /// Band for an entity variant.
    #[must_use]
    pub const fn for_entity(&self, entity_type: EntityType) -> TickBand {
        match entity_type {
            EntityType::Minion => self.minion,
            EntityType::Stealer => self.stealer,
        }
    }
}

/// Something the scheduler fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    /// One behavior tick for an entity
    EntityTick(EntityKey),
    /// One random point drop
    PointDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    fire_at: u64,
    seq: u64,
    job: Job,
    generation: u32,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at, self.seq).cmp(&(other.fire_at, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    generation: u32,
    /// False while the entity's tick is in flight
    pending: bool,
}

/// Min-heap of timed jobs plus the per-entity timer table.
#[derive(Debug, Clone)]
pub struct Scheduler {
    now_ms: u64,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
    timers: AHashMap<EntityKey, Timer>,
    next_generation: u32,
    point_drops_armed: bool,
    bands: TickBands,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new(bands: TickBands) -> Self {
        Self {
            now_ms: 0,
            seq: 0,
            queue: BinaryHeap::new(),
            timers: AHashMap::new(),
            next_generation: 0,
            point_drops_armed: false,
            bands,
        }
    }

    /// Current virtual time.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Configured delay bands.
    #[must_use]
    pub const fn bands(&self) -> &TickBands {
        &self.bands
    }

    /// Number of entities with a timer.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }

    /// Returns true if `key` has a live timer.
    #[must_use]
    pub fn is_armed(&self, key: EntityKey) -> bool {
        self.timers.contains_key(&key)
    }

    /// Arms the first tick for a new entity. No-op if already armed.
    pub fn arm(&mut self, key: EntityKey, entity_type: EntityType, rng: &mut fastrand::Rng) {
        if self.timers.contains_key(&key) {
            return;
        }
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        self.timers.insert(
            key,
            Timer {
                generation,
                pending: true,
            },
        );
        let delay = self.bands.for_entity(entity_type).sample(rng);
        self.push(delay, Job::EntityTick(key), generation);
        trace!("Armed {} in {}ms", key, delay);
    }

    /// Cancels an entity's timer. Returns true if one was armed.
    pub fn cancel(&mut self, key: EntityKey) -> bool {
        let removed = self.timers.remove(&key).is_some();
        if removed {
            trace!("Cancelled timer for {}", key);
        }
        removed
    }

    /// Starts the random point drop cycle. No-op if already running.
    pub fn arm_point_drops(&mut self, rng: &mut fastrand::Rng) {
        if self.point_drops_armed {
            return;
        }
        self.point_drops_armed = true;
        let delay = self.bands.point_drop_initial.sample(rng);
        self.push(delay, Job::PointDrop, 0);
    }

    /// Arms timers for entities that lack one and cancels timers for entities
    /// that no longer exist.
    pub fn sync(&mut self, world: &World, rng: &mut fastrand::Rng) {
        let stale: Vec<EntityKey> = self
            .timers
            .keys()
            .copied()
            .filter(|key| !world.contains_entity(*key))
            .collect();
        for key in stale {
            self.cancel(key);
        }
        for entity in world.entities() {
            self.arm(entity.key(), entity.entity_type(), rng);
        }
    }

    /// Pops the next job due at or before `until`, advancing the clock to it.
    ///
    /// Entity ticks popped here are in flight until [`Scheduler::complete`].
    pub fn pop_due(&mut self, until: u64) -> Option<Job> {
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if entry.fire_at > until {
                return None;
            }
            self.queue.pop();
            self.now_ms = self.now_ms.max(entry.fire_at);
            match entry.job {
                Job::PointDrop => return Some(Job::PointDrop),
                Job::EntityTick(key) => match self.timers.get_mut(&key) {
                    Some(timer) if timer.generation == entry.generation && timer.pending => {
                        timer.pending = false;
                        return Some(entry.job);
                    },
                    // Cancelled or superseded.
                    _ => continue,
                },
            }
        }
        None
    }

    /// Re-arms an entity after its tick finished. Ignored if cancelled meanwhile.
    pub fn complete(&mut self, key: EntityKey, entity_type: EntityType, rng: &mut fastrand::Rng) {
        let Some(timer) = self.timers.get_mut(&key) else {
            return;
        };
        timer.pending = true;
        let generation = timer.generation;
        let delay = self.bands.for_entity(entity_type).sample(rng);
        self.push(delay, Job::EntityTick(key), generation);
    }

    /// Schedules the next point drop after one fired.
    pub fn complete_point_drop(&mut self, rng: &mut fastrand::Rng) {
        let delay = self.bands.point_drop.sample(rng);
        self.push(delay, Job::PointDrop, 0);
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_clock(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    fn push(&mut self, delay_ms: u64, job: Job, generation: u32) {
        let entry = Entry {
            fire_at: self.now_ms.saturating_add(delay_ms),
            seq: self.seq,
            job,
            generation,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_common::{GridSize, Position};
    use proptest::prelude::*;

    fn fixed_bands(ms: u64) -> TickBands {
        TickBands {
            minion: TickBand::new(ms, ms),
            stealer: TickBand::new(ms, ms),
            point_drop_initial: TickBand::new(ms, ms),
            point_drop: TickBand::new(ms, ms),
        }
    }

    #[test]
    fn test_band_swaps_reversed_bounds() {
        let band = TickBand::new(50, 10);
        assert_eq!(band, TickBand { min_ms: 10, max_ms: 50 });
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(fixed_bands(100));
        let a = EntityKey::from_raw(1);
        let b = EntityKey::from_raw(2);
        sched.arm(a, EntityType::Minion, &mut rng);
        sched.advance_clock(10);
        sched.arm(b, EntityType::Minion, &mut rng);

        assert_eq!(sched.pop_due(99), None);
        assert_eq!(sched.pop_due(200), Some(Job::EntityTick(a)));
        assert_eq!(sched.now_ms(), 100);
        assert_eq!(sched.pop_due(200), Some(Job::EntityTick(b)));
        assert_eq!(sched.pop_due(200), None);
    }

    #[test]
    fn test_no_overlap_until_complete() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(fixed_bands(10));
        let key = EntityKey::from_raw(1);
        sched.arm(key, EntityType::Minion, &mut rng);

        assert_eq!(sched.pop_due(1_000), Some(Job::EntityTick(key)));
        // Not re-armed yet: nothing else fires even far in the future.
        assert_eq!(sched.pop_due(1_000), None);

        sched.complete(key, EntityType::Minion, &mut rng);
        assert_eq!(sched.pop_due(1_000), Some(Job::EntityTick(key)));
        assert_eq!(sched.now_ms(), 20);
    }

    #[test]
    fn test_cancel_drops_pending_tick() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(fixed_bands(10));
        let key = EntityKey::from_raw(1);
        sched.arm(key, EntityType::Stealer, &mut rng);
        assert!(sched.cancel(key));
        assert!(!sched.is_armed(key));
        assert_eq!(sched.pop_due(1_000), None);
    }

    #[test]
    fn test_cancel_during_tick_blocks_rearm() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(fixed_bands(10));
        let key = EntityKey::from_raw(1);
        sched.arm(key, EntityType::Minion, &mut rng);
        assert_eq!(sched.pop_due(100), Some(Job::EntityTick(key)));

        sched.cancel(key);
        sched.complete(key, EntityType::Minion, &mut rng);
        assert_eq!(sched.pop_due(1_000), None);
    }

    #[test]
    fn test_rearm_after_cancel_ignores_old_entry() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(fixed_bands(10));
        let key = EntityKey::from_raw(1);
        sched.arm(key, EntityType::Minion, &mut rng);
        sched.cancel(key);
        sched.advance_clock(5);
        sched.arm(key, EntityType::Minion, &mut rng);

        // The stale entry at t=10 is skipped; the fresh one fires at t=15.
        assert_eq!(sched.pop_due(12), None);
        assert_eq!(sched.pop_due(15), Some(Job::EntityTick(key)));
        assert_eq!(sched.pop_due(1_000), None);
    }

    #[test]
    fn test_sync_tracks_world() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(TickBands::default());
        let mut world = World::new(GridSize::new(5, 5));
        let a = world.create_minion(Position::new(0, 0), "a").expect("free");
        let b = world.create_stealer(Position::new(1, 1), "b").expect("free");

        sched.sync(&world, &mut rng);
        assert!(sched.is_armed(a) && sched.is_armed(b));

        world.remove_entity(a).expect("registered");
        sched.sync(&world, &mut rng);
        assert!(!sched.is_armed(a));
        assert_eq!(sched.armed_count(), 1);
    }

    #[test]
    fn test_point_drop_cycle() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut sched = Scheduler::new(fixed_bands(100));
        sched.arm_point_drops(&mut rng);
        sched.arm_point_drops(&mut rng);

        assert_eq!(sched.pop_due(100), Some(Job::PointDrop));
        assert_eq!(sched.pop_due(1_000), None);
        sched.complete_point_drop(&mut rng);
        assert_eq!(sched.pop_due(1_000), Some(Job::PointDrop));
        assert_eq!(sched.now_ms(), 200);
    }

    #[test]
    fn test_default_bands() {
        let bands = TickBands::default();
        assert_eq!(bands.minion, TickBand::new(2500, 3500));
        assert_eq!(bands.point_drop_initial, TickBand::new(1000, 10_000));
        assert_eq!(bands.point_drop, TickBand::new(1000, 5000));
    }

    proptest! {
        #[test]
        fn prop_sample_within_band(min in 0u64..10_000, span in 0u64..10_000, seed: u64) {
            let band = TickBand::new(min, min + span);
            let mut rng = fastrand::Rng::with_seed(seed);
            let delay = band.sample(&mut rng);
            prop_assert!(delay >= band.min_ms && delay <= band.max_ms);
        }
    }
}
