use bracket_geometry::prelude::Point;
use roguedepths::{
    ActionError, Command, Direction, EquipSlot, FrameView, GameConfig, GameHooks, GameMode,
    MessageKey, NullHooks, PersistenceError, Session, SessionSnapshot, SoundEvent,
    data::{
        items::{ItemId, ItemInstance, ItemTemplate},
        monsters::MonsterTemplate,
    },
    ecs::{
        components::{Merchant, Projectile, TrapKind},
        resources::LogEntry,
    },
    map::{FloorMap, TileKind},
    rng::GameRng,
};

const CORRIDOR: [&str; 3] = [
    "####################",
    "#..................#",
    "####################",
];

fn item(name: &str, id: u64) -> ItemInstance {
    ItemTemplate::by_name(name)
        .unwrap_or_else(|| panic!("unknown item {name}"))
        .instantiate(ItemId(id))
}

fn corridor_session() -> Session<NullHooks> {
    Session::on_map(
        GameConfig::default().with_seed(11),
        NullHooks,
        FloorMap::from_rows(&CORRIDOR),
        Point::new(1, 1),
    )
    .expect("valid config")
}

fn logged(session: &Session<impl GameHooks>, key: MessageKey) -> bool {
    session.messages().iter().any(|entry| entry.key == key)
}

#[test]
fn generated_floor_is_fully_connected() {
    for seed in [1, 7, 42, 1234] {
        let session = Session::new(GameConfig::default().with_seed(seed), NullHooks)
            .expect("default config is valid");
        let start = session.player().position;
        assert!(session.map().is_walkable(start), "seed {seed}");
        assert!(
            session.map().unreachable_floor_tiles(start).is_empty(),
            "seed {seed} left floor tiles unreachable"
        );
        assert_eq!(session.turn(), 0);
        assert_eq!(session.floor(), 1);
        assert_eq!(session.mode(), GameMode::Playing);
        assert!(logged(&session, MessageKey::Welcome));
    }
}

#[test]
fn walking_onto_gold_banks_it_and_costs_one_turn() {
    let mut session = corridor_session();
    session
        .ecs_mut()
        .spawn_ground_item(item("Gold Coin", 500), Point::new(2, 1));

    let report = session
        .handle(Command::Move(Direction::East))
        .expect("corridor is open");

    assert!(report.turn_advanced);
    assert_eq!(report.turn, 1);
    let player = session.player();
    assert_eq!(player.position, Point::new(2, 1));
    assert_eq!(player.gold, 25);
    assert!(player.inventory.is_empty());
    drop(player);
    assert!(logged(&session, MessageKey::PickedUpGold));
    assert!(session.frame().items.is_empty());
    assert!(session.snapshot().ground_items.is_empty());
}

#[test]
fn waiting_rests_a_little() {
    let mut session = corridor_session();
    {
        let mut player = session.player_mut();
        player.hp = 50;
        player.mp = 10;
    }

    let report = session.handle(Command::Wait).expect("wait");
    assert!(report.turn_advanced);
    let player = session.player();
    assert_eq!((player.hp, player.mp), (52, 11));
    drop(player);

    {
        let mut player = session.player_mut();
        player.hp = player.max_hp - 1;
        player.mp = player.max_mp;
    }
    session.handle(Command::Wait).expect("wait");
    let player = session.player();
    assert_eq!(player.hp, player.max_hp);
    assert_eq!(player.mp, player.max_mp);
}

#[test]
fn bumping_a_wall_is_refused_without_a_turn() {
    let mut session = corridor_session();
    let err = session
        .handle(Command::Move(Direction::North))
        .expect_err("wall above the corridor");
    assert_eq!(err, ActionError::Blocked);
    assert_eq!(session.turn(), 0);
    assert!(logged(&session, MessageKey::MoveBlocked));
}

#[test]
fn picking_up_on_an_empty_tile_is_refused() {
    let mut session = corridor_session();
    assert_eq!(
        session.handle(Command::PickUp),
        Err(ActionError::NothingHere)
    );
    assert_eq!(session.turn(), 0);
}

#[test]
fn equipping_a_second_weapon_returns_the_first_to_the_pack() {
    let mut session = corridor_session();
    {
        let mut player = session.player_mut();
        player.inventory.push(item("Sword", 900));
        player.inventory.push(item("Long Sword", 901));
    }
    let base_attack = session.player().base.attack;

    session.handle(Command::Equip(0)).expect("sword equips");
    assert_eq!(session.player().stats.attack, base_attack + 5);

    session.handle(Command::Equip(0)).expect("long sword equips");
    let player = session.player();
    assert_eq!(player.stats.attack, base_attack + 8);
    let names: Vec<&str> = player.inventory.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Sword"]);
    assert_ne!(player.inventory[0].id, ItemId(900));
    drop(player);
    assert_eq!(session.turn(), 2);

    session
        .handle(Command::Unequip(EquipSlot::Weapon))
        .expect("weapon slot is filled");
    assert_eq!(session.player().stats.attack, base_attack);
    assert_eq!(
        session.handle(Command::Unequip(EquipSlot::Armor)),
        Err(ActionError::EmptySlot(EquipSlot::Armor))
    );
}

#[test]
fn cancelling_a_targeted_spell_refunds_mana_and_spends_no_turn() {
    let mut session = corridor_session();
    let mp = session.player().mp;

    let report = session.handle(Command::CastSpell(0)).expect("enough mana");
    assert!(!report.turn_advanced);
    assert!(matches!(session.mode(), GameMode::Targeting { .. }));
    assert_eq!(session.player().mp, mp - 5);
    assert_eq!(
        session.handle(Command::Wait),
        Err(ActionError::WrongMode)
    );

    session.handle(Command::Cancel).expect("cancel always works");
    assert_eq!(session.mode(), GameMode::Playing);
    assert_eq!(session.player().mp, mp);
    assert_eq!(session.turn(), 0);
    assert!(logged(&session, MessageKey::SpellCancelled));
}

#[test]
fn not_enough_mana_is_reported() {
    let mut session = corridor_session();
    session.player_mut().mp = 2;
    assert_eq!(
        session.handle(Command::CastSpell(0)),
        Err(ActionError::InsufficientMana { need: 5, have: 2 })
    );
    assert_eq!(session.mode(), GameMode::Playing);
}

#[test]
fn missile_flies_one_tile_per_turn_and_hits_the_first_monster() {
    let mut session = corridor_session();
    let centaur = MonsterTemplate::by_name("Centaur").expect("centaur");
    session.ecs_mut().spawn_monster(centaur, Point::new(4, 1));
    session
        .ecs()
        .affect_monsters_within(Point::new(4, 1), 0, |status| status.frozen = 100);

    session.handle(Command::CastSpell(0)).expect("enough mana");
    session
        .handle(Command::Aim(Direction::East))
        .expect("aiming releases the missile");
    assert_eq!(session.turn(), 1);
    assert_eq!(session.frame().projectiles.len(), 1);
    assert_eq!(session.frame().projectiles[0].point, Point::new(2, 1));

    session.handle(Command::Wait).expect("wait");
    session.handle(Command::Wait).expect("wait");

    assert!(session.frame().projectiles.is_empty());
    let hit = session
        .messages()
        .into_iter()
        .find(|entry| entry.key == MessageKey::ProjectileHits)
        .expect("missile reached the centaur");
    assert_eq!(hit.params.get("damage").map(String::as_str), Some("8"));
}

#[test]
fn missile_expires_after_its_range() {
    let mut session = corridor_session();
    session.handle(Command::CastSpell(0)).expect("enough mana");
    session
        .handle(Command::Aim(Direction::East))
        .expect("aiming releases the missile");
    for _ in 0..6 {
        session.handle(Command::Wait).expect("wait");
    }
    assert_eq!(session.frame().projectiles.len(), 1);
    session.handle(Command::Wait).expect("wait");
    assert!(session.frame().projectiles.is_empty());
}

#[test]
fn short_range_projectile_stops_after_three_tiles() {
    let mut session = Session::on_map(
        GameConfig::default(),
        NullHooks,
        FloorMap::from_rows(&["############", "#..........#", "############"]),
        Point::new(1, 1),
    )
    .expect("valid config");
    session.ecs_mut().spawn_projectile(
        Point::new(1, 1),
        Projectile {
            direction: Point::new(1, 0),
            range: 3,
            damage: 99,
        },
    );

    let mut path = Vec::new();
    for _ in 0..2 {
        session.handle(Command::Wait).expect("wait");
        let frame = session.frame();
        assert_eq!(frame.projectiles.len(), 1);
        path.push(frame.projectiles[0].point);
    }
    assert_eq!(path, vec![Point::new(2, 1), Point::new(3, 1)]);

    session.handle(Command::Wait).expect("wait");
    assert!(session.frame().projectiles.is_empty());
    assert!(session.snapshot().projectiles.is_empty());
    assert!(!logged(&session, MessageKey::ProjectileHits));
    assert_eq!(session.turn(), 3);
}

#[test]
fn dying_on_a_trap_ends_the_game() {
    let mut session = corridor_session();
    session.ecs_mut().spawn_trap(TrapKind::Damage, Point::new(2, 1));
    {
        let mut player = session.player_mut();
        player.hp = 1;
        player.base.dexterity = -60;
        player.recompute_stats();
    }

    let report = session
        .handle(Command::Move(Direction::East))
        .expect("the move itself is legal");
    assert_eq!(report.mode, GameMode::Dead);
    let death = session.player().death.clone().expect("death recorded");
    assert_eq!(death.cause, "a trap");
    assert_eq!(session.player().hp, 0);
    assert_eq!(session.frame().player.hp, 0);
    assert!(logged(&session, MessageKey::TrapDamage));
    assert!(logged(&session, MessageKey::KilledBy));

    assert_eq!(session.handle(Command::Wait), Err(ActionError::GameOver));
}

#[test]
fn killing_blow_leaves_the_player_at_zero_hp() {
    let mut session = corridor_session();
    let emu = MonsterTemplate::by_name("Emu").expect("emu");
    session.ecs_mut().spawn_monster(emu, Point::new(2, 1));
    session.ecs().rouse_all(&mut GameRng::seeded(1));
    {
        let mut player = session.player_mut();
        player.hp = 1;
        player.base.defense = -100;
        player.recompute_stats();
    }

    for _ in 0..30 {
        if session.mode() == GameMode::Dead {
            break;
        }
        session.handle(Command::Wait).expect("still alive");
    }

    assert_eq!(session.mode(), GameMode::Dead);
    let player = session.player();
    assert_eq!(player.hp, 0);
    assert_eq!(player.death.as_ref().map(|death| death.cause.as_str()), Some("Emu"));
}

#[test]
fn teleport_trap_skips_the_rest_of_the_move() {
    let mut session = Session::on_map(
        GameConfig::default(),
        NullHooks,
        FloorMap::from_rows(&["######", "#....#", "######"]),
        Point::new(2, 1),
    )
    .expect("valid config");
    session.ecs_mut().spawn_trap(TrapKind::Teleport, Point::new(3, 1));
    session
        .ecs_mut()
        .spawn_ground_item(item("Gold Coin", 700), Point::new(3, 1));
    {
        let mut player = session.player_mut();
        player.base.dexterity = -60;
        player.recompute_stats();
    }

    session
        .handle(Command::Move(Direction::East))
        .expect("move onto the trap");

    let player = session.player();
    assert_eq!(player.position, Point::new(1, 1));
    assert_eq!(player.gold, 0);
    drop(player);
    assert!(logged(&session, MessageKey::TrapTeleport));
    assert_eq!(session.turn(), 1);
}

#[test]
fn stairs_lead_to_a_fresh_floor() {
    let mut session = Session::on_map(
        GameConfig::default().with_seed(3),
        NullHooks,
        FloorMap::from_rows(&["####", "#.%#", "####"]),
        Point::new(1, 1),
    )
    .expect("valid config");

    let report = session
        .handle(Command::Move(Direction::East))
        .expect("stairs are walkable");
    assert_eq!(report.floor, 2);
    assert_eq!(session.map().width, session.config().map_width);
    let position = session.player().position;
    assert!(session.map().is_walkable(position));
    assert!(logged(&session, MessageKey::Descend));
}

#[test]
fn shopping_costs_gold_but_not_turns() {
    let mut session = corridor_session();
    session.ecs_mut().spawn_merchant(
        Merchant {
            name: "The merchant".to_string(),
            stock: vec![item("Dagger", 800)],
        },
        Point::new(2, 1),
        '&',
    );

    session
        .handle(Command::Move(Direction::East))
        .expect("bumping the merchant opens the shop");
    assert_eq!(session.mode(), GameMode::Shop { merchant: 0 });
    assert_eq!(
        session.handle(Command::Buy(0)),
        Err(ActionError::InsufficientGold { price: 40, have: 0 })
    );

    session.player_mut().gold = 100;
    session.handle(Command::Buy(0)).expect("affordable");
    assert_eq!(session.player().gold, 60);
    assert_eq!(session.player().inventory.len(), 1);
    assert_eq!(
        session.handle(Command::Buy(0)),
        Err(ActionError::InvalidOfferIndex(0))
    );
    assert_eq!(session.turn(), 0);

    session.handle(Command::Cancel).expect("leave");
    assert_eq!(session.mode(), GameMode::Playing);
}

#[test]
fn healing_potion_is_consumed() {
    let mut session = corridor_session();
    {
        let mut player = session.player_mut();
        player.hp = 50;
        player.inventory.push(item("Potion of healing", 600));
    }

    session.handle(Command::UseItem(0)).expect("potions are usable");
    let player = session.player();
    assert!((52..=58).contains(&player.hp), "hp {}", player.hp);
    assert!(player.inventory.is_empty());
    drop(player);
    assert!(logged(&session, MessageKey::Drink));
    assert_eq!(session.turn(), 1);
}

#[test]
fn magic_mapping_reveals_the_whole_floor() {
    let mut session = corridor_session();
    session
        .player_mut()
        .inventory
        .push(item("Scroll of magic mapping", 601));
    assert!(!session.map().is_revealed(Point::new(19, 2)));

    session.handle(Command::UseItem(0)).expect("scrolls are usable");
    assert!(session.map().is_revealed(Point::new(19, 2)));
    assert!(logged(&session, MessageKey::StrangeFeeling));
}

#[test]
fn menus_switch_modes_without_spending_turns() {
    let mut session = corridor_session();
    session.handle(Command::OpenInventory).expect("menu");
    assert_eq!(session.mode(), GameMode::Playing);
    assert!(logged(&session, MessageKey::InventoryEmpty));

    session.player_mut().inventory.push(item("Sword", 902));
    session.handle(Command::OpenItemSelection).expect("menu");
    assert_eq!(session.mode(), GameMode::ItemSelection);
    assert_eq!(
        session.handle(Command::Move(Direction::East)),
        Err(ActionError::WrongMode)
    );
    session.handle(Command::OpenMagic).expect("menu");
    assert_eq!(session.mode(), GameMode::MagicSelection);
    session.handle(Command::Cancel).expect("cancel");
    assert_eq!(session.mode(), GameMode::Playing);
    assert_eq!(session.turn(), 0);
}

#[derive(Default)]
struct Recorder {
    sounds: Vec<SoundEvent>,
    messages: Vec<MessageKey>,
    frames: usize,
}

impl GameHooks for Recorder {
    fn render(&mut self, _frame: &FrameView) {
        self.frames += 1;
    }

    fn play_sound(&mut self, event: SoundEvent) {
        self.sounds.push(event);
    }

    fn message(&mut self, entry: &LogEntry) {
        self.messages.push(entry.key);
    }
}

#[test]
fn hooks_hear_every_step() {
    let mut session = Session::on_map(
        GameConfig::default(),
        Recorder::default(),
        FloorMap::from_rows(&CORRIDOR),
        Point::new(1, 1),
    )
    .expect("valid config");
    session
        .ecs_mut()
        .spawn_ground_item(item("Gold Coin", 501), Point::new(2, 1));
    let frames = session.hooks().frames;

    session.handle(Command::Move(Direction::East)).expect("open");

    let hooks = session.hooks();
    assert_eq!(hooks.sounds, vec![SoundEvent::Footstep, SoundEvent::Gold]);
    assert!(hooks.messages.contains(&MessageKey::PickedUpGold));
    assert_eq!(hooks.frames, frames + 1);
}

#[test]
fn same_seed_same_game() {
    let play = || {
        let mut session = Session::new(GameConfig::default().with_seed(99), NullHooks)
            .expect("valid config");
        for direction in [Direction::East, Direction::South, Direction::West, Direction::North] {
            let _ = session.handle(Command::Move(direction));
            let _ = session.handle(Command::Wait);
        }
        session.snapshot()
    };
    let first = play();
    let second = play();
    assert_eq!(first.player, second.player);
    assert_eq!(first.monsters, second.monsters);
    assert_eq!(first.map, second.map);
    assert_eq!(first.messages, second.messages);
}

#[test]
fn snapshots_survive_json_and_restore() {
    let mut session =
        Session::new(GameConfig::default().with_seed(5), NullHooks).expect("valid config");
    let _ = session.handle(Command::Wait);
    let _ = session.handle(Command::Wait);
    let snapshot = session.snapshot();

    let json = snapshot.to_json().expect("serializes");
    let parsed = SessionSnapshot::from_json(&json).expect("parses");
    assert_eq!(parsed, snapshot);

    let restored = Session::restore(parsed, NullHooks).expect("restores");
    let again = restored.snapshot();
    assert_eq!(again.player, snapshot.player);
    assert_eq!(again.map.width, snapshot.map.width);
    assert_eq!(again.rooms, snapshot.rooms);
    assert_eq!(again.monsters, snapshot.monsters);
    assert_eq!(again.ground_items, snapshot.ground_items);
    assert_eq!(again.traps, snapshot.traps);
    assert_eq!(again.merchants, snapshot.merchants);
    assert_eq!(again.turn, snapshot.turn);
    assert_eq!(again.floor, snapshot.floor);
    assert_eq!(again.seed, snapshot.seed);
    assert_eq!(again.next_item_id, snapshot.next_item_id);
    assert_eq!(
        again.messages.last().map(|entry| entry.key),
        Some(MessageKey::GameLoaded)
    );
}

#[test]
fn snapshot_files_round_trip() {
    let session =
        Session::new(GameConfig::default().with_seed(8), NullHooks).expect("valid config");
    let snapshot = session.snapshot();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("save.json");

    snapshot.save(&path).expect("writes");
    let loaded = SessionSnapshot::load(&path).expect("reads");
    assert_eq!(loaded, snapshot);
}

#[test]
fn snapshots_from_another_version_are_rejected() {
    let session =
        Session::new(GameConfig::default().with_seed(8), NullHooks).expect("valid config");
    let mut snapshot = session.snapshot();
    snapshot.version = 99;
    let json = snapshot.to_json().expect("serializes");

    match SessionSnapshot::from_json(&json) {
        Err(PersistenceError::Version { found, expected }) => {
            assert_eq!(found, 99);
            assert_eq!(expected, roguedepths::persistence::SNAPSHOT_VERSION);
        }
        other => panic!("expected a version error, got {other:?}"),
    }
}

#[test]
fn snapshots_with_unusable_config_are_rejected() {
    let session = corridor_session();
    let mut snapshot = session.snapshot();
    snapshot.config.room_size_max = snapshot.config.room_size_min;
    let json = snapshot.to_json().expect("serializes");

    assert!(matches!(
        SessionSnapshot::from_json(&json),
        Err(PersistenceError::Corrupted(_))
    ));
    assert!(matches!(
        Session::restore(snapshot, NullHooks),
        Err(PersistenceError::Corrupted(_))
    ));
}

#[test]
fn snapshot_tiles_are_preserved() {
    let session = corridor_session();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.map.tile(Point::new(1, 1)), TileKind::Floor);
    assert_eq!(snapshot.map.tile(Point::new(0, 0)), TileKind::Wall);
}
