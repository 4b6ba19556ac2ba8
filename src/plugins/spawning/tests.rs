//! Spawning tests: pool bookkeeping, lane spacing, coordinator and visibility policy.
//!
//! Coordinator tests drive the real systems against a bare `World`; no schedule,
//! no physics step. `with_resource_commands` applies the recorded commands so the
//! assertions see the final component values.

use bevy::ecs::message::Messages;
use bevy::prelude::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::deferred::with_resource_commands;
use crate::common::test_utils::run_system_once;
use crate::common::tunables::{SpawnRange, Tunables};
use crate::plugins::player::Player;

use super::lanes::{next_offset, sample, LaneCursor, LaneSpacing};
use super::pool::{PoolError, PooledAllocator, Released};
use super::visibility::{apply_visibility_signals, detect_visibility_changes};
use super::*;

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn seeded_tunables() -> Tunables {
    Tunables { spawn_seed: Some(7), ..default() }
}

fn world_with_coordinator(tunables: Tunables) -> World {
    let mut world = World::new();
    let coordinator = SpawnCoordinator::from_tunables(&tunables, RUN_START_Y).unwrap();
    world.insert_resource(coordinator);
    world.insert_resource(tunables);
    world.init_resource::<VisibleEnemySet>();
    world.init_resource::<Messages<VisibilitySignal>>();
    world
}

fn populate(world: &mut World) -> usize {
    with_resource_commands::<SpawnCoordinator, _>(world, |commands, coordinator, _| {
        coordinator.populate(commands, RUN_START_Y)
    })
    .unwrap()
}

fn actors_of(world: &mut World, kind: ActorKind) -> Vec<Entity> {
    let mut q = world.query::<(Entity, &Actor)>();
    let mut out: Vec<Entity> = q.iter(world).filter(|(_, a)| a.kind == kind).map(|(e, _)| e).collect();
    out.sort();
    out
}

fn spawn_player(world: &mut World, y: f32) -> Entity {
    world.spawn((Player, Transform::from_xyz(0.0, y, 1.0))).id()
}

fn set_y(world: &mut World, entity: Entity, y: f32) {
    world.get_mut::<Transform>(entity).unwrap().translation.y = y;
}

fn run_visibility(world: &mut World) {
    run_system_once(world, detect_visibility_changes);
    run_system_once(world, apply_visibility_signals);
    world.resource_mut::<Messages<VisibilitySignal>>().clear();
}

// -----------------------------------------------------------------------------
// PooledAllocator
// -----------------------------------------------------------------------------

#[test]
fn pool_of_three_reuses_released_instance() {
    let mut pool = PooledAllocator::new(3);
    let mut next = 0u32;
    let mut make = || {
        next += 1;
        next
    };

    let a = pool.acquire_with(&mut make).unwrap();
    let _b = pool.acquire_with(&mut make).unwrap();
    let _c = pool.acquire_with(&mut make).unwrap();
    assert_eq!(pool.acquire_with(&mut make), None);

    assert_eq!(pool.release(a), Ok(Released::Pooled));
    assert_eq!(pool.acquire_with(&mut make), Some(a));
    assert_eq!(next, 3, "factory must not run when an instance is parked");
}

#[test]
fn double_release_is_rejected() {
    let mut pool = PooledAllocator::new(2);
    let a = pool.acquire_with(|| 10u32).unwrap();

    assert_eq!(pool.release(a), Ok(Released::Pooled));
    assert_eq!(pool.release(a), Err(PoolError::NotCheckedOut));
    assert_eq!(pool.release(99), Err(PoolError::NotCheckedOut));
    assert_eq!(pool.inactive_count(), 1);
}

#[test]
fn shrinking_capacity_discards_on_release() {
    let mut pool = PooledAllocator::new(3);
    let mut next = 0u32;
    let items: Vec<u32> = (0..3)
        .map(|_| {
            pool.acquire_with(|| {
                next += 1;
                next
            })
            .unwrap()
        })
        .collect();

    assert!(pool.set_capacity(2).is_empty());
    assert_eq!(pool.release(items[0]), Ok(Released::Discarded(items[0])));
    assert_eq!(pool.release(items[1]), Ok(Released::Pooled));
    assert_eq!(pool.active_count() + pool.inactive_count(), 2);

    // Parked instances above the new limit come back for destruction.
    assert_eq!(pool.set_capacity(1), vec![items[1]]);
    assert_eq!(pool.inactive_count(), 0);
}

#[test]
fn clear_returns_parked_and_forgets_checked_out() {
    let mut pool = PooledAllocator::new(2);
    let a = pool.acquire_with(|| 1u32).unwrap();
    let b = pool.acquire_with(|| 2u32).unwrap();
    pool.release(b).unwrap();

    assert_eq!(pool.clear(), vec![b]);
    assert!(!pool.is_checked_out(a));
    assert_eq!(pool.active_count(), 0);
}

proptest! {
    #[test]
    fn pool_never_exceeds_capacity(
        capacity in 0usize..8,
        ops in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 0..200),
    ) {
        let mut pool = PooledAllocator::new(capacity);
        let mut out: Vec<u32> = Vec::new();
        let mut next = 0u32;

        for (acquire, pick) in ops {
            if acquire {
                let parked = pool.inactive_count();
                let got = pool.acquire_with(|| { next += 1; next });
                match got {
                    Some(item) => out.push(item),
                    None => {
                        prop_assert_eq!(parked, 0);
                        prop_assert_eq!(pool.active_count(), capacity);
                    }
                }
            } else if !out.is_empty() {
                let item = out.swap_remove(pick.index(out.len()));
                prop_assert!(pool.release(item).is_ok());
            }
            prop_assert!(pool.active_count() + pool.inactive_count() <= capacity);
            prop_assert_eq!(pool.active_count(), out.len());
        }
    }
}

// -----------------------------------------------------------------------------
// Lanes
// -----------------------------------------------------------------------------

#[test]
fn zero_probability_settles_after_one_roll() {
    let spacing = LaneSpacing::new(SpawnRange::new(2.0, 2.0), SpawnRange::new(1.0, 1.0), 0).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        assert_eq!(next_offset(0.0, 0.0, &spacing, &mut rng), 2.0);
    }
}

#[test]
fn probability_above_limit_is_rejected() {
    let err = LaneSpacing::new(SpawnRange::new(2.0, 2.0), SpawnRange::new(1.0, 1.0), 100).unwrap_err();
    assert!(matches!(err, crate::common::tunables::ConfigError::SpawnProbability(100)));
}

#[test]
fn non_finite_or_inverted_spacing_is_rejected() {
    let err = LaneSpacing::new(SpawnRange::new(f32::NAN, 10.0), SpawnRange::new(1.0, 1.0), 0).unwrap_err();
    assert!(matches!(err, crate::common::tunables::ConfigError::NonFinite("initial_delta")));

    let err = LaneSpacing::new(SpawnRange::new(2.0, 2.0), SpawnRange::new(1.0, f32::INFINITY), 0).unwrap_err();
    assert!(matches!(err, crate::common::tunables::ConfigError::NonFinite("step_delta")));

    let err = LaneSpacing::new(SpawnRange::new(5.0, 2.0), SpawnRange::new(1.0, 1.0), 0).unwrap_err();
    assert!(matches!(err, crate::common::tunables::ConfigError::InvertedRange("initial_delta")));
}

#[test]
fn sample_falls_back_to_min_on_bad_range() {
    let mut rng = StdRng::seed_from_u64(9);
    assert_eq!(sample(SpawnRange::new(3.0, f32::INFINITY), &mut rng), 3.0);
    assert!(sample(SpawnRange::new(f32::NAN, 10.0), &mut rng).is_nan());
    assert_eq!(sample(SpawnRange::new(4.0, 4.0), &mut rng), 4.0);
}

#[test]
fn spacing_exposes_validated_values() {
    let spacing = LaneSpacing::new(SpawnRange::new(2.0, 3.0), SpawnRange::new(1.0, 1.5), 42).unwrap();
    assert_eq!(spacing.initial(), SpawnRange::new(2.0, 3.0));
    assert_eq!(spacing.step(), SpawnRange::new(1.0, 1.5));
    assert_eq!(spacing.spawn_probability(), 42);
}

#[test]
fn high_probability_skips_slots() {
    let spacing = LaneSpacing::new(SpawnRange::new(2.0, 2.0), SpawnRange::new(1.0, 1.0), 99).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    // Offsets are 2 + k for k extra rolls; at 99% some rolls must repeat.
    let total: f32 = (0..20).map(|_| next_offset(0.0, 0.0, &spacing, &mut rng)).sum();
    assert!(total > 40.0);
}

#[test]
fn lane_cursor_steps_from_its_own_offset() {
    let spacing = LaneSpacing::new(SpawnRange::new(10.0, 10.0), SpawnRange::new(3.0, 3.0), 0).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let mut cursor = LaneCursor::new(2, 0.0);

    assert_eq!(cursor.advance(0, 0.0, &spacing, &mut rng), 10.0);
    assert_eq!(cursor.advance(0, 0.0, &spacing, &mut rng), 13.0);
    assert_eq!(cursor.offset(1), Some(0.0));

    // Player overtook the lane: reseed relative to the player.
    assert_eq!(cursor.advance(0, 50.0, &spacing, &mut rng), 60.0);
}

proptest! {
    #[test]
    fn next_offset_moves_ahead(
        seed in any::<u64>(),
        initial_min in 1.0f32..100.0,
        initial_width in 0.0f32..100.0,
        step_min in 1.0f32..100.0,
        step_width in 0.0f32..100.0,
        probability in 0u8..=99,
        current in -500.0f32..500.0,
        player_y in -500.0f32..500.0,
    ) {
        let spacing = LaneSpacing::new(
            SpawnRange::new(initial_min, initial_min + initial_width),
            SpawnRange::new(step_min, step_min + step_width),
            probability,
        ).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        let next = next_offset(current, player_y, &spacing, &mut rng);
        prop_assert!(next > player_y);
        if current > player_y {
            prop_assert!(next > current);
        } else {
            prop_assert!(next >= player_y + initial_min);
        }
    }
}

// -----------------------------------------------------------------------------
// SpawnCoordinator
// -----------------------------------------------------------------------------

#[test]
fn populate_fills_both_pools_ahead_of_player() {
    let tunables = seeded_tunables();
    let enemy_lanes = tunables.enemies.lanes_x.clone();
    let mut world = world_with_coordinator(tunables);

    assert_eq!(populate(&mut world), 9 + 6);

    let enemies = actors_of(&mut world, ActorKind::Enemy);
    assert_eq!(enemies.len(), 9);
    assert_eq!(actors_of(&mut world, ActorKind::Obstacle).len(), 6);

    for e in enemies {
        assert_eq!(*world.get::<PoolState>(e).unwrap(), PoolState::Active);
        assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Visible);
        let pos = world.get::<Transform>(e).unwrap().translation;
        assert!(pos.y > RUN_START_Y);
        assert!(enemy_lanes.contains(&pos.x));
    }

    let coordinator = world.resource::<SpawnCoordinator>();
    assert_eq!(coordinator.spawner(ActorKind::Enemy).pool().active_count(), 9);
}

#[test]
fn exhausted_pool_spawns_nothing() {
    let mut world = world_with_coordinator(seeded_tunables());
    populate(&mut world);

    let extra = with_resource_commands::<SpawnCoordinator, _>(&mut world, |commands, coordinator, _| {
        coordinator.spawn(commands, ActorKind::Enemy, RUN_START_Y)
    })
    .unwrap();

    assert_eq!(extra, None);
    assert_eq!(actors_of(&mut world, ActorKind::Enemy).len(), 9);
}

#[test]
fn released_enemy_is_parked_then_reused_with_new_lease() {
    let mut world = world_with_coordinator(seeded_tunables());
    populate(&mut world);
    let victim = actors_of(&mut world, ActorKind::Enemy)[0];
    let old_lease = world.get::<Actor>(victim).unwrap().lease;

    with_resource_commands::<SpawnCoordinator, _>(&mut world, |commands, coordinator, _| {
        coordinator.release(commands, ActorKind::Enemy, victim)
    })
    .unwrap()
    .unwrap();

    assert_eq!(*world.get::<PoolState>(victim).unwrap(), PoolState::Inactive);
    assert_eq!(*world.get::<Visibility>(victim).unwrap(), Visibility::Hidden);

    let reused = with_resource_commands::<SpawnCoordinator, _>(&mut world, |commands, coordinator, _| {
        coordinator.spawn(commands, ActorKind::Enemy, 500.0)
    })
    .unwrap();

    assert_eq!(reused, Some(victim));
    assert!(world.get::<Actor>(victim).unwrap().lease > old_lease);
    assert!(world.get::<Transform>(victim).unwrap().translation.y > 500.0);
}

#[test]
fn releasing_twice_reports_error() {
    let mut world = world_with_coordinator(seeded_tunables());
    populate(&mut world);
    let victim = actors_of(&mut world, ActorKind::Obstacle)[0];

    let results = with_resource_commands::<SpawnCoordinator, _>(&mut world, |commands, coordinator, _| {
        let first = coordinator.release(commands, ActorKind::Obstacle, victim);
        let second = coordinator.release(commands, ActorKind::Obstacle, victim);
        (first, second)
    })
    .unwrap();

    assert_eq!(results, (Ok(()), Err(PoolError::NotCheckedOut)));
}

#[test]
fn teardown_removes_every_actor() {
    let mut world = world_with_coordinator(seeded_tunables());
    populate(&mut world);
    let parked = actors_of(&mut world, ActorKind::Enemy)[0];
    with_resource_commands::<SpawnCoordinator, _>(&mut world, |commands, coordinator, _| {
        coordinator.release(commands, ActorKind::Enemy, parked)
    })
    .unwrap()
    .unwrap();
    world.resource_mut::<VisibleEnemySet>().insert(parked);

    run_system_once(&mut world, teardown_run);

    assert!(actors_of(&mut world, ActorKind::Enemy).is_empty());
    assert!(actors_of(&mut world, ActorKind::Obstacle).is_empty());
    assert!(world.resource::<VisibleEnemySet>().is_empty());
    assert!(!world.contains_resource::<SpawnCoordinator>());
}

#[test]
fn invalid_tunables_leave_spawner_disabled() {
    let mut world = World::new();
    let mut tunables = Tunables::default();
    tunables.enemies.spawn_probability = 100;
    world.insert_resource(tunables);

    run_system_once(&mut world, setup_run);

    assert!(!world.contains_resource::<SpawnCoordinator>());
}

// -----------------------------------------------------------------------------
// Visibility policy
// -----------------------------------------------------------------------------

#[test]
fn enemy_enters_and_leaves_visible_set() {
    let mut world = world_with_coordinator(seeded_tunables());
    populate(&mut world);
    let player = spawn_player(&mut world, 0.0);

    // Park everything far ahead so only the chosen enemy transitions.
    for e in actors_of(&mut world, ActorKind::Enemy).into_iter().chain(actors_of(&mut world, ActorKind::Obstacle)) {
        set_y(&mut world, e, 100_000.0);
    }
    let enemy = actors_of(&mut world, ActorKind::Enemy)[0];
    set_y(&mut world, enemy, 100.0);

    run_visibility(&mut world);
    assert!(world.resource::<VisibleEnemySet>().contains(enemy));
    assert_eq!(world.resource::<VisibleEnemySet>().len(), 1);
    assert!(world.get::<InView>(enemy).unwrap().0);

    set_y(&mut world, player, 1_000.0);
    run_visibility(&mut world);

    assert!(world.resource::<VisibleEnemySet>().is_empty());
    // Enemies are not recycled on exit.
    assert_eq!(*world.get::<PoolState>(enemy).unwrap(), PoolState::Active);
    assert_eq!(world.get::<Transform>(enemy).unwrap().translation.y, 100.0);
}

#[test]
fn obstacle_leaving_view_is_recycled_ahead() {
    let mut world = world_with_coordinator(seeded_tunables());
    populate(&mut world);
    let player = spawn_player(&mut world, 0.0);

    for e in actors_of(&mut world, ActorKind::Enemy).into_iter().chain(actors_of(&mut world, ActorKind::Obstacle)) {
        set_y(&mut world, e, 100_000.0);
    }
    let obstacle = actors_of(&mut world, ActorKind::Obstacle)[0];
    set_y(&mut world, obstacle, 100.0);
    let old_lease = world.get::<Actor>(obstacle).unwrap().lease;

    run_visibility(&mut world);
    assert!(world.get::<InView>(obstacle).unwrap().0);
    assert!(world.resource::<VisibleEnemySet>().is_empty());

    set_y(&mut world, player, 1_000.0);
    run_visibility(&mut world);

    // Pool was full, so the released obstacle is the one handed out again.
    let actor = world.get::<Actor>(obstacle).unwrap();
    assert!(actor.lease > old_lease);
    assert_eq!(*world.get::<PoolState>(obstacle).unwrap(), PoolState::Active);
    assert!(world.get::<Transform>(obstacle).unwrap().translation.y > 1_000.0);
    assert!(!world.get::<InView>(obstacle).unwrap().0);
    assert_eq!(actors_of(&mut world, ActorKind::Obstacle).len(), 6);
}

#[test]
fn signals_without_coordinator_are_dropped() {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    world.init_resource::<VisibleEnemySet>();
    world.init_resource::<Messages<VisibilitySignal>>();
    let e = world.spawn_empty().id();
    world.write_message(VisibilitySignal { entity: e, visible: true });

    run_system_once(&mut world, apply_visibility_signals);

    assert!(world.resource::<VisibleEnemySet>().is_empty());
}
