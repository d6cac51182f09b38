use bracket_geometry::prelude::Point;
use tracing::debug;

use super::{Direction, GameMode, Session, TurnReport};
use crate::{
    ai::EIGHT_WAY,
    data::{
        items::{ItemInstance, ItemKind},
        spells::{HOLD_RADIUS, MISSILE_RANGE, SpellKind},
    },
    ecs::{PlayerContext, components::Projectile},
    error::ActionError,
    hooks::{GameHooks, SoundEvent},
    map::TileKind,
    player::EquipSlot,
    status::StatusKind,
    text::{MessageCategory, MessageKey, params},
};

const REST_HP: i32 = 2;
const REST_MP: i32 = 1;

impl<H: GameHooks> Session<H> {
    pub(crate) fn player_move(&mut self, direction: Direction) -> Result<TurnReport, ActionError> {
        let (origin, incapacitated, confused) = {
            let player = self.ecs.player();
            (
                player.position,
                player.status.is_incapacitated(),
                player.status.has(StatusKind::Confused),
            )
        };

        if incapacitated {
            self.ecs
                .context()
                .log
                .push(MessageKey::Paralyzed, MessageCategory::System);
            return Ok(self.run_turn());
        }

        let mut delta = direction.delta();
        if confused {
            let mut ctx = self.ecs.context();
            if ctx.rng.coin() {
                if let Some(stumble) = ctx.rng.pick(&EIGHT_WAY).copied() {
                    delta = stumble;
                }
                ctx.log.push(MessageKey::Stumble, MessageCategory::System);
            }
        }

        let target = origin + delta;
        if !self.map.is_walkable(target) {
            return Err(ActionError::Blocked);
        }

        if let Some(monster) = self.ecs.living_monster_at(target) {
            let mut ctx = self.ecs.context();
            self.ecs.player_attack(monster, &mut ctx);
            drop(ctx);
            return Ok(self.run_turn());
        }

        if let Some(merchant) = self.ecs.merchant_at(target) {
            return Ok(self.open_shop(merchant));
        }

        let levitating = {
            let mut ctx = self.ecs.context();
            ctx.player.position = target;
            ctx.sounds.push(SoundEvent::Footstep);
            ctx.player.status.has(StatusKind::Levitating)
        };

        if !levitating {
            if let Some(kind) = self.ecs.spring_trap_at(target) {
                if self.trigger_trap(kind) {
                    return Ok(self.run_turn());
                }
            }
        }
        if self.ecs.player().is_dead() {
            return Ok(self.run_turn());
        }

        if self.map.tile(target) == TileKind::Stairs {
            if levitating {
                self.ecs
                    .context()
                    .log
                    .push(MessageKey::FloatOverStairs, MessageCategory::System);
            } else {
                self.descend();
                return Ok(self.run_turn());
            }
        }

        if !levitating {
            self.collect_items_at(target);
        }
        Ok(self.run_turn())
    }

    /// Waiting in place recovers a little hp and mana before the turn runs.
    pub(crate) fn rest(&mut self) -> TurnReport {
        {
            let mut player = self.ecs.player_mut();
            player.heal(REST_HP);
            player.restore_mana(REST_MP);
        }
        self.run_turn()
    }

    pub(crate) fn pick_up(&mut self) -> Result<TurnReport, ActionError> {
        let position = self.ecs.player().position;
        if self.collect_items_at(position) == 0 {
            return Err(ActionError::NothingHere);
        }
        Ok(self.run_turn())
    }

    /// Moves everything on `point` into the pack. Gold is banked, not stored.
    fn collect_items_at(&mut self, point: Point) -> usize {
        let mut collected = 0;
        while let Some(item) = self.ecs.take_ground_item_at(point) {
            let mut ctx = self.ecs.context();
            store_item(&mut ctx, item);
            collected += 1;
        }
        collected
    }

    pub(crate) fn equip(&mut self, index: usize) -> Result<TurnReport, ActionError> {
        {
            let mut ctx = self.ecs.context();
            let PlayerContext {
                player, ids, log, sounds, ..
            } = &mut ctx;
            let outcome = player.equip(index, ids)?;
            sounds.push(SoundEvent::Equip);
            if let Some(old) = &outcome.displaced {
                log.push_with(
                    MessageKey::Unequip,
                    MessageCategory::Item,
                    params([("item", old.name.clone())]),
                );
            }
            let item = outcome.equipped.name.clone();
            match (outcome.equipped.kind, outcome.slot.hand()) {
                (ItemKind::Weapon { attack }, _) => log.push_with(
                    MessageKey::EquipWeapon,
                    MessageCategory::Item,
                    params([("item", item), ("attack", attack.to_string())]),
                ),
                (ItemKind::Armor { defense }, _) => log.push_with(
                    MessageKey::EquipArmor,
                    MessageCategory::Item,
                    params([("item", item), ("defense", defense.to_string())]),
                ),
                (_, hand) => log.push_with(
                    MessageKey::PutOnRing,
                    MessageCategory::Item,
                    params([("item", item), ("hand", hand.unwrap_or("left").to_string())]),
                ),
            }
        }
        Ok(self.run_turn())
    }

    pub(crate) fn unequip(&mut self, slot: EquipSlot) -> Result<TurnReport, ActionError> {
        {
            let mut ctx = self.ecs.context();
            let PlayerContext {
                player, ids, log, sounds, ..
            } = &mut ctx;
            let item = player.unequip(slot, ids)?;
            sounds.push(SoundEvent::Equip);
            match slot.hand() {
                Some(hand) => log.push_with(
                    MessageKey::RemoveRing,
                    MessageCategory::Item,
                    params([("item", item.name), ("hand", hand.to_string())]),
                ),
                None => log.push_with(
                    MessageKey::Unequip,
                    MessageCategory::Item,
                    params([("item", item.name)]),
                ),
            }
        }
        Ok(self.run_turn())
    }

    pub(crate) fn drop_item(&mut self, index: usize) -> Result<TurnReport, ActionError> {
        let (item, point) = {
            let mut ctx = self.ecs.context();
            let item = ctx.player.take_item_at(index)?;
            let item = item.relocated(ctx.ids.mint());
            ctx.log.push_with(
                MessageKey::Dropped,
                MessageCategory::Item,
                params([("item", item.name.clone())]),
            );
            (item, ctx.player.position)
        };
        self.ecs.spawn_ground_item(item, point);
        Ok(self.run_turn())
    }

    pub(crate) fn cast_spell(&mut self, index: usize) -> Result<TurnReport, ActionError> {
        let (spell, cost) = {
            let mut ctx = self.ecs.context();
            let spell = *ctx
                .player
                .spells
                .get(index)
                .ok_or(ActionError::InvalidSpellIndex(index))?;
            let cost = spell.mana_cost();
            if ctx.player.mp < cost {
                return Err(ActionError::InsufficientMana {
                    need: cost,
                    have: ctx.player.mp,
                });
            }
            ctx.player.mp -= cost;
            (spell, cost)
        };

        if spell.is_targeted() {
            self.mode = GameMode::Targeting {
                spell,
                refund: cost,
            };
            self.ecs.context().log.push_with(
                MessageKey::AimPrompt,
                MessageCategory::System,
                params([("spell", spell.name().to_string())]),
            );
            self.refresh();
            return Ok(self.report(false));
        }

        {
            let mut ctx = self.ecs.context();
            ctx.sounds.push(SoundEvent::Magic);
            ctx.log.push_with(
                MessageKey::CastSpell,
                MessageCategory::Combat,
                params([("spell", spell.name().to_string())]),
            );
            match spell {
                SpellKind::Heal => {
                    let roll = ctx.rng.range(15, 26);
                    let gained = ctx.player.heal(roll);
                    ctx.sounds.push(SoundEvent::Heal);
                    ctx.log.push_with(
                        MessageKey::SpellHeal,
                        MessageCategory::Combat,
                        params([("amount", gained.to_string())]),
                    );
                }
                SpellKind::HoldMonsters => {
                    let origin = ctx.player.position;
                    let rng = &mut ctx.rng;
                    let held = self.ecs.affect_monsters_within(origin, HOLD_RADIUS, |status| {
                        status.frozen = rng.range(5, 10) as u32;
                    });
                    ctx.log.push_with(
                        MessageKey::HoldMonsters,
                        MessageCategory::Combat,
                        params([("count", held.to_string())]),
                    );
                }
                SpellKind::MagicMissile => {}
            }
        }
        Ok(self.run_turn())
    }

    /// Fires the pending targeted spell in `direction` and spends the turn.
    pub(crate) fn release_spell(&mut self, spell: SpellKind, direction: Direction) -> TurnReport {
        self.mode = GameMode::Playing;
        let (origin, damage) = {
            let mut ctx = self.ecs.context();
            ctx.sounds.push(SoundEvent::Magic);
            ctx.log.push_with(
                MessageKey::CastSpell,
                MessageCategory::Combat,
                params([("spell", spell.name().to_string())]),
            );
            (ctx.player.position, SpellKind::missile_damage(ctx.player.level))
        };
        debug!(?direction, damage, "missile away");
        self.ecs.spawn_projectile(
            origin,
            Projectile {
                direction: direction.delta(),
                range: MISSILE_RANGE,
                damage,
            },
        );
        self.run_turn()
    }

    pub(crate) fn cancel(&mut self) -> TurnReport {
        let previous = self.mode;
        self.mode = GameMode::Playing;
        {
            let mut ctx = self.ecs.context();
            match previous {
                GameMode::Targeting { spell, refund } => {
                    ctx.player.mp = (ctx.player.mp + refund).min(ctx.player.max_mp);
                    ctx.log.push_with(
                        MessageKey::SpellCancelled,
                        MessageCategory::System,
                        params([
                            ("spell", spell.name().to_string()),
                            ("cost", refund.to_string()),
                        ]),
                    );
                }
                GameMode::Shop { .. } => {
                    ctx.log.push(MessageKey::ShopLeave, MessageCategory::System);
                }
                GameMode::Inventory | GameMode::ItemSelection | GameMode::MagicSelection => {
                    ctx.log
                        .push(MessageKey::SelectionCancelled, MessageCategory::System);
                }
                GameMode::Playing | GameMode::Dead => {}
            }
        }
        self.refresh();
        self.report(false)
    }

    pub(crate) fn open_item_menu(&mut self, mode: GameMode) -> TurnReport {
        {
            let mut ctx = self.ecs.context();
            if ctx.player.inventory.is_empty() {
                ctx.log.push(MessageKey::InventoryEmpty, MessageCategory::System);
                self.mode = GameMode::Playing;
            } else {
                let lines: Vec<_> = ctx
                    .player
                    .inventory
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        params([
                            ("index", (idx + 1).to_string()),
                            ("glyph", item.glyph.to_string()),
                            ("name", item.name.clone()),
                        ])
                    })
                    .collect();
                for line in lines {
                    ctx.log
                        .push_with(MessageKey::InventoryLine, MessageCategory::Item, line);
                }
                if mode == GameMode::ItemSelection {
                    ctx.log
                        .push(MessageKey::SelectItemPrompt, MessageCategory::System);
                }
                self.mode = mode;
            }
        }
        self.refresh();
        self.report(false)
    }

    pub(crate) fn open_magic_menu(&mut self) -> TurnReport {
        {
            let mut ctx = self.ecs.context();
            let lines: Vec<_> = ctx
                .player
                .spells
                .iter()
                .enumerate()
                .map(|(idx, spell)| {
                    params([
                        ("index", (idx + 1).to_string()),
                        ("name", spell.name().to_string()),
                        ("cost", spell.mana_cost().to_string()),
                    ])
                })
                .collect();
            for line in lines {
                ctx.log
                    .push_with(MessageKey::SpellLine, MessageCategory::System, line);
            }
            ctx.log
                .push(MessageKey::SelectSpellPrompt, MessageCategory::System);
        }
        self.mode = GameMode::MagicSelection;
        self.refresh();
        self.report(false)
    }

    pub(crate) fn open_shop(&mut self, merchant: usize) -> TurnReport {
        let Some(shop) = self.ecs.merchant(merchant) else {
            return self.report(false);
        };
        {
            let mut ctx = self.ecs.context();
            let gold = ctx.player.gold;
            ctx.log.push_with(
                MessageKey::ShopWelcome,
                MessageCategory::System,
                params([("merchant", shop.name.clone()), ("gold", gold.to_string())]),
            );
            for (idx, offer) in shop.stock.iter().enumerate() {
                ctx.log.push_with(
                    MessageKey::ShopOffer,
                    MessageCategory::System,
                    params([
                        ("index", (idx + 1).to_string()),
                        ("name", offer.name.clone()),
                        ("price", offer.price.to_string()),
                    ]),
                );
            }
        }
        self.mode = GameMode::Shop { merchant };
        self.refresh();
        self.report(false)
    }

    /// Buys one offer. Shopping never costs a turn.
    pub(crate) fn buy(&mut self, merchant: usize, offer: usize) -> Result<TurnReport, ActionError> {
        let price = self
            .ecs
            .merchant(merchant)
            .and_then(|shop| shop.stock.get(offer).map(|item| item.price))
            .ok_or(ActionError::InvalidOfferIndex(offer))?;
        let gold = self.ecs.player().gold;
        if gold < price {
            return Err(ActionError::InsufficientGold { price, have: gold });
        }
        let item = self
            .ecs
            .take_offer(merchant, offer)
            .ok_or(ActionError::InvalidOfferIndex(offer))?;
        {
            let mut ctx = self.ecs.context();
            ctx.player.gold -= price;
            let item = item.relocated(ctx.ids.mint());
            ctx.sounds.push(SoundEvent::Gold);
            ctx.log.push_with(
                MessageKey::ShopBought,
                MessageCategory::Item,
                params([("item", item.name.clone()), ("price", price.to_string())]),
            );
            ctx.player.inventory.push(item);
        }
        self.refresh();
        Ok(self.report(false))
    }
}

/// Gold goes to the purse; anything else joins the pack under a fresh id.
fn store_item(ctx: &mut PlayerContext, item: ItemInstance) {
    if let ItemKind::Gold { value } = item.kind {
        ctx.player.gold += value;
        ctx.sounds.push(SoundEvent::Gold);
        ctx.log.push_with(
            MessageKey::PickedUpGold,
            MessageCategory::Item,
            params([("amount", value.to_string())]),
        );
        return;
    }
    let item = item.relocated(ctx.ids.mint());
    ctx.sounds.push(SoundEvent::ItemPickup);
    ctx.log.push_with(
        MessageKey::PickedUpItem,
        MessageCategory::Item,
        params([("item", item.name.clone())]),
    );
    ctx.player.inventory.push(item);
}
