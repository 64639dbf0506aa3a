//! End-to-end level scenarios driven through the public tick API

use blast_grid::consts::SIM_DT;
use blast_grid::manhattan;
use blast_grid::map::TileCode;
use blast_grid::sim::{
    AiMode, Bomb, GameEvent, GamePhase, GameState, GridObject, LossCause, PowerUpKind, TickInput,
    find_path,
};
use blast_grid::tuning::Tuning;
use glam::{IVec2, Vec2};

fn run(state: &mut GameState, input: &TickInput, frames: usize) {
    for _ in 0..frames {
        state.tick_with_input(input, SIM_DT);
    }
}

fn drop_bomb(state: &mut GameState, tile: IVec2, radius: u32) -> u32 {
    let id = state.next_entity_id();
    let bomb = Bomb::new(&mut state.world, id, tile, radius, &state.tuning);
    state.add_bomb(bomb);
    id
}

fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn test_blast_stops_at_solid_wall_and_reveals_power_up() {
    let mut state = GameState::new(6, 6, Tuning::default(), 3);
    state.create_object(3, 2, TileCode::IndestructibleWall);
    state.create_object(2, 3, TileCode::SpeedPowerUpWall);
    drop_bomb(&mut state, IVec2::new(2, 2), 1);

    // Just past the fuse, while the explosion tiles are still up
    run(&mut state, &TickInput::default(), 185);

    let mut flames: Vec<IVec2> = state.explosion_tiles().iter().map(|e| e.tile).collect();
    flames.sort_by_key(|t| (t.y, t.x));
    assert_eq!(
        flames,
        vec![
            IVec2::new(2, 1),
            IVec2::new(1, 2),
            IVec2::new(2, 2),
            IVec2::new(2, 3),
        ]
    );

    // Explosion animation runs out
    run(&mut state, &TickInput::default(), 60);

    assert!(state.explosion_tiles().is_empty());
    assert!(matches!(
        state.get_object_at(3, 2),
        Some(GridObject::IndestructibleWall { .. })
    ));
    assert!(state.get_object_at(2, 3).is_none());
    let power_ups = state.power_ups();
    assert_eq!(power_ups.len(), 1);
    assert_eq!(power_ups[0].tile, IVec2::new(2, 3));
    assert_eq!(power_ups[0].kind, PowerUpKind::Speed);
    assert!(state.bombs().is_empty());

    let events = state.drain_events();
    assert!(events.contains(&GameEvent::PowerUpRevealed {
        tile: IVec2::new(2, 3),
        kind: PowerUpKind::Speed,
    }));
}

#[test]
fn test_enemy_follows_path_toward_player() {
    let tuning = Tuning {
        enemy_contact_kills: false,
        ..Default::default()
    };
    let mut state = GameState::new(8, 1, tuning, 3);
    state.create_object(5, 0, TileCode::Entrance);
    state.create_object(0, 0, TileCode::EnemySpawn);
    let player_tile = IVec2::new(5, 0);

    let path = find_path(&state.grid, IVec2::new(0, 0), player_tile);
    assert_eq!(path.len(), 6);

    let mut last_x = state.enemies()[0].position(&state.world).x;
    let mut frames = 0;
    loop {
        state.tick(SIM_DT);
        frames += 1;

        let enemy = &state.enemies()[0];
        assert_eq!(enemy.ai.mode, AiMode::Chase, "frame {frames}");
        let body = enemy.life.body().unwrap();
        let velocity = state.world.velocity(body).unwrap();
        assert!(velocity.x > 0.0, "frame {frames}");
        assert!(velocity.y.abs() < 1e-4, "frame {frames}");

        let x = enemy.position(&state.world).x;
        assert!(x > last_x, "frame {frames}");
        last_x = x;

        if manhattan(enemy.tile(&state.world), player_tile) <= 1 {
            break;
        }
        assert!(frames < 300, "enemy never reached the player");
    }
    assert_eq!(state.phase(), GamePhase::Playing);
}

#[test]
fn test_wall_scores_once_across_ticks() {
    let mut state = GameState::new(5, 5, Tuning::default(), 3);
    state.create_object(2, 1, TileCode::DestructibleWall);
    drop_bomb(&mut state, IVec2::new(2, 2), 3);

    let mut events = Vec::new();
    for _ in 0..400 {
        state.tick(SIM_DT);
        events.extend(state.drain_events());
    }

    assert_eq!(state.score(), state.tuning.score.wall_destroyed);
    assert_eq!(count(&events, |e| matches!(e, GameEvent::WallDestroyed { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, GameEvent::BombExploded { .. })), 1);
}

#[test]
fn test_player_places_bomb_and_escapes() {
    let mut state = GameState::new(12, 3, Tuning::default(), 3);
    state.create_object(1, 1, TileCode::Entrance);

    let drop_and_run = TickInput {
        direction: Vec2::X,
        place_bomb: true,
        ..Default::default()
    };
    state.tick_with_input(&drop_and_run, SIM_DT);
    assert_eq!(state.bombs().len(), 1);
    assert!(state.bombs()[0].is_armed());

    let right = TickInput {
        direction: Vec2::X,
        ..Default::default()
    };
    run(&mut state, &right, 60);
    run(&mut state, &TickInput::default(), 240);

    assert_eq!(state.phase(), GamePhase::Playing);
    assert!(state.bombs().is_empty());
    assert!(state.explosion_tiles().is_empty());
    let events = state.drain_events();
    assert!(events.contains(&GameEvent::BombExploded {
        tile: IVec2::new(1, 1)
    }));

    // Capacity is free again
    assert!(state.place_bomb());
}

#[test]
fn test_player_caught_in_own_blast() {
    let mut state = GameState::new(5, 5, Tuning::default(), 3);
    state.create_object(2, 2, TileCode::Entrance);
    assert!(state.place_bomb());

    run(&mut state, &TickInput::default(), 200);

    assert_eq!(state.phase(), GamePhase::Lost(LossCause::Explosion));
}

#[test]
fn test_chain_reaction_sets_off_second_bomb() {
    let mut state = GameState::new(9, 5, Tuning::default(), 3);
    drop_bomb(&mut state, IVec2::new(2, 2), 2);
    drop_bomb(&mut state, IVec2::new(4, 2), 1);
    state.bombs[1].fuse = 30.0;

    let mut exploded = 0;
    for _ in 0..185 {
        state.tick(SIM_DT);
        exploded += count(&state.drain_events(), |e| {
            matches!(e, GameEvent::BombExploded { .. })
        });
    }
    assert_eq!(exploded, 2);
}

#[test]
fn test_blast_reveals_exit_and_clears_last_enemy() {
    let tuning = Tuning {
        enemy_speed: 0.0,
        ..Default::default()
    };
    let mut state = GameState::new(7, 5, tuning, 3);
    state.create_object(3, 4, TileCode::ExitWall);
    state.create_object(1, 2, TileCode::EnemySpawn);
    drop_bomb(&mut state, IVec2::new(3, 2), 2);

    run(&mut state, &TickInput::default(), 200);

    assert_eq!(state.remaining_enemies(), 0);
    assert!(state.exit_active());
    assert_eq!(state.exit_tile(), Some(IVec2::new(3, 4)));
    assert!(matches!(
        state.get_object_at(3, 4),
        Some(GridObject::Exit(exit)) if exit.active
    ));
    assert_eq!(
        state.score(),
        state.tuning.score.wall_destroyed + state.tuning.score.enemy_defeated
    );
    let events = state.drain_events();
    assert!(events.contains(&GameEvent::ExitRevealed {
        tile: IVec2::new(3, 4)
    }));
    assert!(events.contains(&GameEvent::ExitActivated));
}
