//! Whole-tick behavior of the tank simulation: commands, pickups,
//! modifiers, scoring and reinforcements.

use tanks_core::components::{ActorKind, AiArchetype, Direction, PlayerInput};
use tanks_core::config::{EngineConfig, SpawnerConfig};
use tanks_core::error::GameError;
use tanks_core::grid::TileCoord;
use tanks_core::math::{ratio, Fixed, Vec2Fixed};
use tanks_core::modifiers::ModifierKind;
use tanks_core::pickups::{Pickup, PickupEffect};
use tanks_core::simulation::{GameStatus, Simulation};
use tanks_test_utils::fixtures::{empty_sim, open_grid, tile_center, TILE};

fn dt() -> Fixed {
    ratio(1, 60)
}

// =============================================================================
// Commands
// =============================================================================

mod commands {
    use super::*;

    #[test]
    fn test_command_errors() {
        let mut sim = empty_sim(6, 6);
        let player = sim.spawn_player(TileCoord::new(1, 1));
        let ai = sim.spawn_ai(AiArchetype::Standard, TileCoord::new(4, 4), 1);

        assert_eq!(
            sim.set_strategic_target(player, Some(TileCoord::new(2, 2))),
            Err(GameError::NotAiControlled(player))
        );
        assert_eq!(
            sim.set_player_input(ai, PlayerInput::default()),
            Err(GameError::NotPlayerControlled(ai))
        );
        assert_eq!(
            sim.set_strategic_target(99, None),
            Err(GameError::ActorNotFound(99))
        );
        assert_eq!(
            sim.apply_modifier(99, ModifierKind::SpeedIncrease, Fixed::ONE, Fixed::ONE),
            Err(GameError::ActorNotFound(99))
        );
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let result = Simulation::from_layout(&["..."], 0, TILE, EngineConfig::default());
        assert!(matches!(result, Err(GameError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.arrival_threshold = Fixed::ZERO;
        assert!(matches!(
            Simulation::new(open_grid(3, 3), config),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_ids_are_ascending_and_actors_ordered() {
        let mut sim = empty_sim(8, 8);
        let a = sim.spawn_ai(AiArchetype::Fast, TileCoord::new(1, 1), 1);
        let p = sim.spawn_player(TileCoord::new(4, 4));
        let b = sim.spawn_ai(AiArchetype::Heavy, TileCoord::new(6, 6), 2);

        assert!(a < p && p < b);
        let ids: Vec<_> = sim.actors().iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![a, p, b]);
        assert_eq!(sim.player_id(), Some(p));
        assert_eq!(sim.ai_count(), 2);
    }

    #[test]
    fn test_ai_targets_base_by_default() {
        let layout = ["@@@@@", "@...@", "@...@", "@.B.@", "@@@@@"];
        let mut sim = Simulation::from_layout(&layout, TILE, TILE, EngineConfig::default()).unwrap();
        let ai = sim.spawn_ai(AiArchetype::Standard, TileCoord::new(1, 1), 4);
        assert_eq!(
            sim.actor(ai).unwrap().brain().unwrap().strategic_target,
            Some(TileCoord::new(2, 3))
        );
    }

    #[test]
    fn test_ai_stats_jittered_within_spread() {
        let mut sim = empty_sim(8, 8);
        for seed in 0..20 {
            let id = sim.spawn_ai(AiArchetype::Heavy, TileCoord::new(1, 1), seed);
            let actor = sim.actor(id).unwrap();
            let speed = actor.base.speed;
            assert!(speed > Fixed::from_num(33) && speed < Fixed::from_num(47));
            assert!((48..=72).contains(&actor.health.max));
            assert_eq!(actor.health.current, actor.health.max);
        }
    }
}

// =============================================================================
// Player movement
// =============================================================================

mod player {
    use super::*;

    #[test]
    fn test_player_moves_and_reports_facing_change() {
        let mut sim = empty_sim(6, 6);
        let player = sim.spawn_player(TileCoord::new(2, 2));
        let start = sim.actor(player).unwrap().position;
        sim.set_player_input(
            player,
            PlayerInput {
                direction: Some(Direction::Right),
                fire: false,
            },
        )
        .unwrap();

        let events = sim.tick(ratio(1, 2));
        let tank = sim.actor(player).unwrap();
        assert_eq!(tank.position, start + Vec2Fixed::from_ints(50, 0));
        assert_eq!(events.facing_changes.len(), 1);
        assert_eq!(events.facing_changes[0].actor, player);
        assert_eq!(events.facing_changes[0].kind, ActorKind::Player);
        assert_eq!(events.facing_changes[0].direction, Direction::Right);

        // Same facing next tick: no event.
        assert!(sim.tick(dt()).facing_changes.is_empty());
    }

    #[test]
    fn test_player_slowed_on_water() {
        let layout = ["~~~~", "~~~~", "~~~~"];
        let mut sim = Simulation::from_layout(&layout, TILE, TILE, EngineConfig::default()).unwrap();
        let player = sim.spawn_player(TileCoord::new(1, 1));
        assert_eq!(sim.actor(player).unwrap().stats.speed, Fixed::from_num(50));
    }

    #[test]
    fn test_player_fire_rate_limited() {
        let mut sim = empty_sim(20, 20);
        let player = sim.spawn_player(TileCoord::new(10, 18));
        sim.set_player_input(
            player,
            PlayerInput {
                direction: None,
                fire: true,
            },
        )
        .unwrap();

        let shots: usize = (0..120).map(|_| sim.tick(dt()).shots.len()).sum();
        // 0.5 s cooldown over two seconds, first shot after the first half second.
        assert!((3..=4).contains(&shots), "got {shots} shots");
    }
}

// =============================================================================
// Modifiers
// =============================================================================

mod modifiers {
    use super::*;

    #[test]
    fn test_attack_buff_replaces_not_stacks() {
        let mut sim = empty_sim(6, 6);
        let player = sim.spawn_player(TileCoord::new(2, 2));
        let five = Fixed::from_num(5);

        sim.apply_modifier(player, ModifierKind::AttackMultiplier, Fixed::from_num(2), five)
            .unwrap();
        sim.apply_modifier(player, ModifierKind::AttackMultiplier, Fixed::from_num(3), five)
            .unwrap();
        let tank = sim.actor(player).unwrap();
        assert_eq!(tank.stats.attack, Fixed::from_num(30));
        assert_eq!(tank.modifiers.len(), 1);

        let mut expired = Vec::new();
        for _ in 0..5 {
            expired.extend(sim.tick(Fixed::ONE).expired_modifiers);
        }
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].kind, ModifierKind::AttackMultiplier);
        assert_eq!(sim.actor(player).unwrap().stats.attack, Fixed::from_num(10));
    }

    #[test]
    fn test_speed_reverts_to_terrain_speed() {
        let layout = ["~~~~", "~~~~", "~~~~"];
        let mut sim = Simulation::from_layout(&layout, TILE, TILE, EngineConfig::default()).unwrap();
        let player = sim.spawn_player(TileCoord::new(1, 1));

        sim.apply_pickup_effect(player, PickupEffect::Speed).unwrap();
        assert_eq!(sim.actor(player).unwrap().stats.speed, Fixed::from_num(150));

        for _ in 0..6 {
            sim.tick(Fixed::ONE);
        }
        assert_eq!(sim.actor(player).unwrap().stats.speed, Fixed::from_num(50));
    }

    #[test]
    fn test_slow_ai_scales_and_restores_cooldown_range() {
        let mut sim = empty_sim(8, 8);
        let player = sim.spawn_player(TileCoord::new(1, 6));
        let ai = sim.spawn_ai(AiArchetype::Standard, TileCoord::new(6, 1), 12);
        let original = sim.actor(ai).unwrap().brain().unwrap().cooldown_range;

        sim.apply_pickup_effect(player, PickupEffect::SlowAi).unwrap();
        let brain = sim.actor(ai).unwrap().brain().unwrap();
        assert_eq!(brain.saved_cooldown_range, Some(original));
        assert_eq!(brain.cooldown_range, original.scaled(Fixed::from_num(2)));
        assert!(brain.shot_cooldown >= Fixed::from_num(2));
        assert!(sim.actor(player).unwrap().modifiers.is_empty());

        for _ in 0..11 {
            sim.tick(Fixed::ONE);
        }
        let brain = sim.actor(ai).unwrap().brain().unwrap();
        assert_eq!(brain.cooldown_range, original);
        assert_eq!(brain.saved_cooldown_range, None);
    }
}

// =============================================================================
// Pickups, score, reinforcements
// =============================================================================

mod game_flow {
    use super::*;

    #[test]
    fn test_pickup_collected_once_by_overlapping_player() {
        let mut sim = empty_sim(6, 6);
        let player = sim.spawn_player(TileCoord::new(2, 2));
        let index = sim.add_pickup(Pickup::new(
            tile_center(TileCoord::new(2, 2)),
            Vec2Fixed::from_ints(20, 20),
            PickupEffect::Armor,
        ));

        let events = sim.tick(dt());
        assert_eq!(events.pickups.len(), 1);
        assert_eq!(events.pickups[0].pickup, index);
        assert_eq!(events.pickups[0].actor, player);
        assert_eq!(sim.actor(player).unwrap().armor.current, 1);
        assert!(!sim.pickups()[index].active);

        assert!(sim.tick(dt()).pickups.is_empty());
    }

    #[test]
    fn test_grenade_clears_ai_without_score() {
        let mut sim = empty_sim(8, 8);
        let player = sim.spawn_player(TileCoord::new(1, 6));
        let a = sim.spawn_ai(AiArchetype::Fast, TileCoord::new(1, 1), 1);
        let b = sim.spawn_ai(AiArchetype::Heavy, TileCoord::new(6, 1), 2);

        sim.apply_pickup_effect(player, PickupEffect::Grenade).unwrap();
        let events = sim.tick(dt());

        assert_eq!(events.deaths, vec![a, b]);
        assert_eq!(sim.ai_count(), 0);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.status(), GameStatus::Running);
    }

    #[test]
    fn test_destroying_ai_awards_archetype_score() {
        let mut config = EngineConfig::default();
        config.archetypes.fast.max_health = 1;
        let mut sim = Simulation::new(open_grid(7, 7), config).unwrap();
        let player = sim.spawn_player(TileCoord::new(3, 5));
        let ai = sim.spawn_ai(AiArchetype::Fast, TileCoord::new(3, 1), 6);
        sim.set_strategic_target(ai, Some(TileCoord::new(3, 1))).unwrap();
        sim.set_player_input(
            player,
            PlayerInput {
                direction: None,
                fire: true,
            },
        )
        .unwrap();

        let mut killed = false;
        for _ in 0..120 {
            let events = sim.tick(dt());
            if events.deaths.contains(&ai) {
                killed = true;
                break;
            }
        }

        assert!(killed);
        assert_eq!(sim.score(), 200);
        assert_eq!(sim.status(), GameStatus::Running);
        assert!(sim.actor(ai).is_none());
    }

    #[test]
    fn test_spawner_respects_interval_and_cap() {
        let mut config = EngineConfig::default();
        config.spawner = Some(SpawnerConfig {
            interval: Fixed::ONE,
            max_active: 2,
            spawn_points: vec![TileCoord::new(1, 1), TileCoord::new(5, 1)],
            archetypes: vec![AiArchetype::Fast, AiArchetype::Heavy],
            seed: 77,
        });
        let mut sim = Simulation::new(open_grid(8, 8), config).unwrap();
        let half = ratio(1, 2);

        assert!(sim.tick(half).spawned.is_empty());
        let first = sim.tick(half).spawned;
        assert_eq!(first.len(), 1);
        assert_eq!(
            sim.actor(first[0]).unwrap().kind,
            ActorKind::Ai(AiArchetype::Fast)
        );
        assert_eq!(sim.actor(first[0]).unwrap().position, tile_center(TileCoord::new(1, 1)));

        sim.tick(half);
        let second = sim.tick(half).spawned;
        assert_eq!(
            sim.actor(second[0]).unwrap().kind,
            ActorKind::Ai(AiArchetype::Heavy)
        );

        for _ in 0..10 {
            assert!(sim.tick(half).spawned.is_empty());
        }
        assert_eq!(sim.ai_count(), 2);
    }
}
