use bracket_geometry::prelude::Point;
use tracing::debug;

use super::{Session, TurnReport};
use crate::{
    data::{
        items::{ItemKind, PotionEffect, ScrollEffect},
        monsters::MonsterTemplate,
    },
    ecs::{
        PlayerContext,
        components::{MonsterStatus, TrapKind},
        systems::record_death,
    },
    error::ActionError,
    hooks::{GameHooks, SoundEvent},
    map::TileKind,
    progression,
    rng::GameRng,
    status::StatusKind,
    text::{MessageCategory, MessageKey, params},
};

const SCROLL_RADIUS: i32 = 5;
const TELEPORT_ATTEMPTS: usize = 50;
const SUMMON_ATTEMPTS: usize = 20;
const TRAP_SAVE_TARGET: i32 = 15;

impl<H: GameHooks> Session<H> {
    pub(crate) fn use_item(&mut self, index: usize) -> Result<TurnReport, ActionError> {
        let kind = self.ecs.player().item(index)?.kind;
        match kind {
            ItemKind::Weapon { .. } | ItemKind::Armor { .. } | ItemKind::Ring { .. } => {
                self.equip(index)
            }
            ItemKind::Gold { .. } => Err(ActionError::NotUsable),
            ItemKind::Potion { effect, magnitude } => {
                {
                    let mut ctx = self.ecs.context();
                    let item = ctx.player.take_item_at(index)?;
                    ctx.sounds.push(drink_sound(effect));
                    ctx.log.push_with(
                        MessageKey::Drink,
                        MessageCategory::Item,
                        params([("item", item.name)]),
                    );
                    quaff(&mut ctx, effect, magnitude);
                }
                Ok(self.run_turn())
            }
            ItemKind::Scroll { effect } => {
                {
                    let mut ctx = self.ecs.context();
                    let item = ctx.player.take_item_at(index)?;
                    ctx.sounds.push(SoundEvent::Magic);
                    ctx.log.push_with(
                        MessageKey::Read,
                        MessageCategory::Item,
                        params([("item", item.name)]),
                    );
                }
                self.read_scroll(effect);
                Ok(self.run_turn())
            }
        }
    }

    fn read_scroll(&mut self, effect: ScrollEffect) {
        let message = match effect {
            ScrollEffect::MonsterConfusion => {
                self.scroll_area(|rng, status| status.confused = rng.range(10, 20) as u32);
                MessageKey::HummingNoise
            }
            ScrollEffect::MagicMapping => {
                self.map.reveal_all();
                MessageKey::StrangeFeeling
            }
            ScrollEffect::HoldMonster => {
                self.scroll_area(|rng, status| status.frozen = rng.range(10, 20) as u32);
                MessageKey::MonstersFreeze
            }
            ScrollEffect::Sleep => {
                self.scroll_area(|rng, status| status.sleeping = rng.range(15, 30) as u32);
                MessageKey::FaintCry
            }
            ScrollEffect::ScareMonster => {
                self.scroll_area(|rng, status| status.scared = rng.range(20, 40) as u32);
                MessageKey::ManiacalLaughter
            }
            ScrollEffect::EnchantArmor | ScrollEffect::EnchantWeapon => {
                let mut ctx = self.ecs.context();
                enchant(&mut ctx, effect == ScrollEffect::EnchantWeapon);
                return;
            }
            ScrollEffect::IdentifyPotion
            | ScrollEffect::IdentifyScroll
            | ScrollEffect::IdentifyWeapon
            | ScrollEffect::IdentifyArmor
            | ScrollEffect::IdentifyRing => MessageKey::IdentifyScroll,
            ScrollEffect::FoodDetection => MessageKey::NoseTingles,
            ScrollEffect::Teleportation => {
                self.teleport_player();
                MessageKey::StrangeSensation
            }
            ScrollEffect::CreateMonster => {
                self.summon_near_player();
                MessageKey::FaintCry
            }
            ScrollEffect::RemoveCurse => MessageKey::WatchedOver,
            ScrollEffect::AggravateMonsters => {
                self.ecs.with_rng(|rng| self.ecs.rouse_all(rng));
                MessageKey::HummingNoise
            }
            ScrollEffect::ProtectArmor => {
                let mut ctx = self.ecs.context();
                let armor = ctx.player.equipment.armor.as_ref().map(|armor| armor.name.clone());
                match armor {
                    Some(name) => ctx.log.push_with(
                        MessageKey::ArmorShielded,
                        MessageCategory::System,
                        params([("item", name)]),
                    ),
                    None => ctx.log.push(MessageKey::SkinCrawls, MessageCategory::System),
                }
                return;
            }
        };
        self.ecs
            .context()
            .log
            .push(message, MessageCategory::System);
    }

    /// Applies a scroll's effect to every living monster near the player.
    fn scroll_area<F>(&mut self, mut effect: F)
    where
        F: FnMut(&mut GameRng, &mut MonsterStatus),
    {
        let origin = self.ecs.player().position;
        let touched = self.ecs.with_rng(|rng| {
            self.ecs
                .affect_monsters_within(origin, SCROLL_RADIUS, |status| effect(rng, status))
        });
        debug!(touched, "scroll touched monsters");
    }

    /// Springs a trap the player just stepped on. Returns true when the player
    /// was teleported away, which ends the move.
    pub(crate) fn trigger_trap(&mut self, kind: TrapKind) -> bool {
        let mut ctx = self.ecs.context();
        let save = ctx.rng.range(1, 21) + ctx.player.stats.dexterity / 2;
        debug!(trap = kind.name(), save, "trap sprung");
        if save >= TRAP_SAVE_TARGET {
            ctx.log.push_with(
                MessageKey::TrapAvoided,
                MessageCategory::System,
                params([("trap", kind.name().to_string())]),
            );
            return false;
        }

        match kind {
            TrapKind::Damage => {
                let damage = ctx.rng.range(3, 8) + ctx.clock.floor as i32;
                ctx.player.hp -= damage;
                ctx.sounds.push(SoundEvent::Hurt);
                ctx.log.push_with(
                    MessageKey::TrapDamage,
                    MessageCategory::Combat,
                    params([("damage", damage.to_string())]),
                );
                if ctx.player.hp <= 0 {
                    let PlayerContext {
                        player,
                        log,
                        sounds,
                        clock,
                        ..
                    } = &mut ctx;
                    record_death(player, "a trap", clock, log, sounds);
                }
                false
            }
            TrapKind::Teleport => {
                ctx.sounds.push(SoundEvent::Magic);
                ctx.log.push(MessageKey::TrapTeleport, MessageCategory::System);
                drop(ctx);
                self.teleport_player();
                true
            }
            TrapKind::Alarm => {
                ctx.log.push(MessageKey::TrapAlarm, MessageCategory::System);
                self.ecs.rouse_all(&mut ctx.rng);
                false
            }
        }
    }

    /// Random free floor tile in a random room, or the first walkable tile.
    pub(crate) fn teleport_player(&mut self) {
        let mut destination = None;
        for _ in 0..TELEPORT_ATTEMPTS {
            let candidate = self.ecs.with_rng(|rng| {
                rng.pick(&self.rooms).map(|room| room.interior_point(rng))
            });
            let Some(point) = candidate else {
                break;
            };
            if self.map.tile(point) == TileKind::Floor && !self.ecs.is_occupied(point) {
                destination = Some(point);
                break;
            }
        }
        let Some(point) = destination.or_else(|| self.map.first_walkable()) else {
            return;
        };
        debug!(x = point.x, y = point.y, "teleported");
        self.ecs.player_mut().position = point;
    }

    fn summon_near_player(&mut self) {
        let origin = self.ecs.player().position;
        let floor = self.ecs.clock().floor;
        let templates = MonsterTemplate::for_floor(floor);
        for _ in 0..SUMMON_ATTEMPTS {
            let (offset, template) = self.ecs.with_rng(|rng| {
                (
                    Point::new(rng.range(-3, 4), rng.range(-3, 4)),
                    rng.pick(&templates).copied(),
                )
            });
            let point = origin + offset;
            if point == origin || !self.map.is_walkable(point) || self.ecs.is_occupied(point) {
                continue;
            }
            if let Some(template) = template {
                self.ecs.spawn_monster(template, point);
            }
            return;
        }
    }
}

fn drink_sound(effect: PotionEffect) -> SoundEvent {
    match effect {
        PotionEffect::Healing | PotionEffect::ExtraHealing | PotionEffect::RestoreHealth => {
            SoundEvent::Heal
        }
        PotionEffect::RestoreMana => SoundEvent::Mana,
        PotionEffect::Poison => SoundEvent::Poison,
        _ => SoundEvent::Magic,
    }
}

fn quaff(ctx: &mut PlayerContext, effect: PotionEffect, magnitude: i32) {
    match effect {
        PotionEffect::Healing => {
            let roll = ctx.rng.range(1, 8) + 1;
            let gained = ctx.player.heal(roll);
            ctx.log.push_with(
                MessageKey::Heal,
                MessageCategory::System,
                params([("amount", gained.to_string())]),
            );
        }
        PotionEffect::ExtraHealing => {
            let roll = ctx.rng.range(8, 16) + 8;
            let gained = ctx.player.heal(roll);
            ctx.log.push_with(
                MessageKey::HealMuch,
                MessageCategory::System,
                params([("amount", gained.to_string())]),
            );
        }
        PotionEffect::RestoreHealth => {
            let gained = ctx.player.heal(magnitude);
            ctx.log.push_with(
                MessageKey::Heal,
                MessageCategory::System,
                params([("amount", gained.to_string())]),
            );
        }
        PotionEffect::RestoreMana => {
            let gained = ctx.player.restore_mana(magnitude);
            ctx.log.push_with(
                MessageKey::ManaRestored,
                MessageCategory::System,
                params([("amount", gained.to_string())]),
            );
        }
        PotionEffect::GainStrength => {
            ctx.player.base.attack += 1;
            ctx.player.recompute_stats();
            ctx.log.push(MessageKey::Stronger, MessageCategory::System);
        }
        PotionEffect::RestoreStrength => {
            ctx.log.push(MessageKey::StrengthRestored, MessageCategory::System);
        }
        PotionEffect::RaiseLevel => {
            let gain = progression::raise_level(&mut ctx.player, &mut ctx.rng);
            ctx.log.push(MessageKey::RaiseLevel, MessageCategory::System);
            progression::announce(&[gain], &mut ctx.log, &mut ctx.sounds);
        }
        PotionEffect::HasteSelf => timed(ctx, StatusKind::Hasted, 40, 80, MessageKey::Haste),
        PotionEffect::SeeInvisible => {
            timed(ctx, StatusKind::SeeInvisible, 400, 600, MessageKey::EyesTingle)
        }
        PotionEffect::MonsterDetection => {
            timed(ctx, StatusKind::DetectMonsters, 40, 80, MessageKey::SenseMonsters)
        }
        PotionEffect::MagicDetection => {
            timed(ctx, StatusKind::DetectMagic, 40, 80, MessageKey::SenseMagic)
        }
        PotionEffect::Levitation => timed(ctx, StatusKind::Levitating, 80, 120, MessageKey::Float),
        PotionEffect::Confusion => {
            timed(ctx, StatusKind::Confused, 20, 40, MessageKey::FeelConfused)
        }
        PotionEffect::Hallucination => {
            timed(ctx, StatusKind::Hallucinating, 300, 500, MessageKey::Hallucinate)
        }
        PotionEffect::Poison => timed(ctx, StatusKind::Poisoned, 10, 20, MessageKey::FeelSick),
        PotionEffect::Blindness => timed(ctx, StatusKind::Blind, 800, 1000, MessageKey::Darkness),
    }
}

fn timed(ctx: &mut PlayerContext, kind: StatusKind, min: i32, max: i32, message: MessageKey) {
    let turns = ctx.rng.range(min, max) as u32;
    ctx.player.status.set(kind, turns);
    ctx.log.push(message, MessageCategory::System);
}

fn enchant(ctx: &mut PlayerContext, weapon: bool) {
    let bonus = ctx.rng.range(1, 3);
    let slot = if weapon {
        ctx.player.equipment.weapon.as_mut()
    } else {
        ctx.player.equipment.armor.as_mut()
    };
    let Some(item) = slot else {
        let message = if weapon {
            MessageKey::HandsTingle
        } else {
            MessageKey::SkinCrawls
        };
        ctx.log.push(message, MessageCategory::System);
        return;
    };
    match &mut item.kind {
        ItemKind::Weapon { attack } => *attack += bonus,
        ItemKind::Armor { defense } => *defense += bonus,
        _ => {}
    }
    let name = item.name.clone();
    ctx.player.recompute_stats();
    let message = if weapon {
        MessageKey::WeaponGlows
    } else {
        MessageKey::ArmorGlows
    };
    ctx.log
        .push_with(message, MessageCategory::System, params([("item", name)]));
}

#[cfg(test)]
mod tests {
    use bracket_geometry::prelude::Point;
    use specs::prelude::{Join, WorldExt};

    use super::*;
    use crate::{
        config::GameConfig,
        data::items::{ItemId, ItemTemplate},
        ecs::components::{Monster, MonsterAbilities, Position},
        hooks::NullHooks,
        map::FloorMap,
        session::Command,
    };

    const ROOM: [&str; 7] = [
        "#########",
        "#.......#",
        "#.......#",
        "#.......#",
        "#.......#",
        "#.......#",
        "#########",
    ];

    fn room_session() -> Session<NullHooks> {
        Session::on_map(
            GameConfig::default().with_seed(21),
            NullHooks,
            FloorMap::from_rows(&ROOM),
            Point::new(1, 1),
        )
        .expect("valid config")
    }

    fn give(session: &mut Session<NullHooks>, name: &str) {
        let item = ItemTemplate::by_name(name)
            .expect("known item")
            .instantiate(ItemId(950));
        session.player_mut().inventory.push(item);
    }

    fn spawn(session: &mut Session<NullHooks>, name: &str, point: Point) {
        let template = MonsterTemplate::by_name(name).expect("known monster");
        session.ecs_mut().spawn_monster(template, point);
    }

    fn statuses(session: &Session<NullHooks>) -> Vec<MonsterStatus> {
        let statuses = session.ecs().specs().read_storage::<MonsterStatus>();
        statuses.join().cloned().collect()
    }

    #[test]
    fn sleep_scroll_only_reaches_nearby_monsters() {
        let mut session = room_session();
        spawn(&mut session, "Emu", Point::new(3, 2));
        spawn(&mut session, "Emu", Point::new(7, 5));
        give(&mut session, "Scroll of sleep");

        session.handle(Command::UseItem(0)).expect("readable");

        let statuses = statuses(&session);
        assert!(statuses[0].sleeping > 0);
        assert_eq!(statuses[1].sleeping, 0);
    }

    #[test]
    fn aggravation_turns_every_monster_hostile() {
        let mut session = room_session();
        spawn(&mut session, "Bat", Point::new(6, 4));
        give(&mut session, "Scroll of aggravate monsters");

        session.handle(Command::UseItem(0)).expect("readable");

        let abilities = session.ecs().specs().read_storage::<MonsterAbilities>();
        assert!(abilities.join().all(|ability| ability.is_mean));
        drop(abilities);
        assert!(statuses(&session).iter().all(|status| status.aggravated > 0));
    }

    #[test]
    fn enchanting_without_a_weapon_only_tingles() {
        let mut session = room_session();
        give(&mut session, "Scroll of enchant weapon");
        let attack = session.player().stats.attack;

        session.handle(Command::UseItem(0)).expect("readable");

        assert_eq!(session.player().stats.attack, attack);
        assert!(session
            .messages()
            .iter()
            .any(|entry| entry.key == MessageKey::HandsTingle));
    }

    #[test]
    fn enchanting_a_weapon_raises_attack() {
        let mut session = room_session();
        give(&mut session, "Sword");
        session.handle(Command::Equip(0)).expect("equips");
        give(&mut session, "Scroll of enchant weapon");
        let attack = session.player().stats.attack;

        session.handle(Command::UseItem(0)).expect("readable");

        let gained = session.player().stats.attack - attack;
        assert!((1..=2).contains(&gained), "gained {gained}");
    }

    #[test]
    fn create_monster_summons_next_to_the_player() {
        let mut session = room_session();
        give(&mut session, "Scroll of create monster");

        session.handle(Command::UseItem(0)).expect("readable");

        assert_eq!(session.ecs().living_monster_count(), 1);
        let positions = session.ecs().specs().read_storage::<Position>();
        let monsters = session.ecs().specs().read_storage::<Monster>();
        let origin = session.player().position;
        for (pos, _) in (&positions, &monsters).join() {
            // summoned within three tiles, then one step of its own
            assert!((pos.point.x - origin.x).abs() <= 4);
            assert!((pos.point.y - origin.y).abs() <= 4);
        }
    }

    #[test]
    fn timed_potions_set_their_status() {
        let mut session = room_session();
        give(&mut session, "Potion of haste self");

        session.handle(Command::UseItem(0)).expect("drinkable");

        let remaining = session.player().status.remaining(StatusKind::Hasted);
        // one tick already passed at the end of the turn
        assert!((39..80).contains(&remaining), "remaining {remaining}");
    }

    #[test]
    fn only_restoring_potions_sound_like_healing() {
        assert_eq!(drink_sound(PotionEffect::ExtraHealing), SoundEvent::Heal);
        assert_eq!(drink_sound(PotionEffect::RestoreMana), SoundEvent::Mana);
        assert_eq!(drink_sound(PotionEffect::Poison), SoundEvent::Poison);
        assert_eq!(drink_sound(PotionEffect::Blindness), SoundEvent::Magic);
    }

    #[test]
    fn gold_cannot_be_used() {
        let mut session = room_session();
        give(&mut session, "Gold Coin");
        assert_eq!(
            session.handle(Command::UseItem(0)),
            Err(ActionError::NotUsable)
        );
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn alarm_trap_wakes_the_floor() {
        let mut session = room_session();
        spawn(&mut session, "Emu", Point::new(7, 5));
        session
            .ecs()
            .affect_monsters_within(Point::new(7, 5), 0, |status| status.sleeping = 50);
        {
            let mut player = session.player_mut();
            player.base.dexterity = -60;
            player.recompute_stats();
        }

        assert!(!session.trigger_trap(TrapKind::Alarm));

        let status = &statuses(&session)[0];
        assert_eq!(status.sleeping, 0);
        assert!(status.aggravated >= 50);
    }
}
