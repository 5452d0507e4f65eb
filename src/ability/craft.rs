use super::{AbilityContext, CastParams};
use crate::battle::events::MatchEvent;
use crate::catalog::AbilityDef;
use crate::combatant::Combatant;
use crate::error::AbilityFailure;
use crate::item::{Artifact, EquipCategory, Item, ItemKind, SpecialEquipment};

const FUSION_SIZE: usize = 3;
const ARTIFACT_MAX_STAR: u8 = 5;

pub(super) fn check_alchemist(
    caster: &Combatant,
    index: u8,
    params: &CastParams,
) -> Result<(), AbilityFailure> {
    if index != 3 {
        return Ok(());
    }
    let pool = caster.fusable_items();
    match &params.item_ids {
        Some(chosen) => {
            let mut unique = chosen.clone();
            unique.sort_unstable();
            unique.dedup();
            if unique.len() != FUSION_SIZE || chosen.len() != FUSION_SIZE {
                return Err(AbilityFailure::InvalidTarget(format!(
                    "fusion takes exactly {} different items",
                    FUSION_SIZE
                )));
            }
            if let Some(missing) = chosen.iter().find(|id| !pool.contains(id)) {
                return Err(AbilityFailure::InvalidTarget(format!(
                    "item {} cannot be fused",
                    missing
                )));
            }
        }
        None if pool.len() < FUSION_SIZE => {
            return Err(AbilityFailure::InvalidTarget(format!(
                "fusion needs {} pieces of equipment, {} owned",
                FUSION_SIZE,
                pool.len()
            )))
        }
        None => {}
    }
    Ok(())
}

pub(super) fn check_archer(caster: &Combatant, index: u8) -> Result<(), AbilityFailure> {
    let armed = caster
        .archer()
        .map(|k| k.equipped_arrows().next().is_some())
        .unwrap_or(false);
    if index == 3 && !armed {
        return Err(AbilityFailure::InvalidTarget(
            "no arrow is equipped".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn alchemist(
    ctx: &mut AbilityContext,
    def: &AbilityDef,
    params: &CastParams,
) -> Vec<MatchEvent> {
    match def.index {
        1 => {
            for _ in 0..def.power {
                let made = ctx.shop.random_equipment(ctx.caster.level, ctx.rng);
                let made = ctx.ids.stamp(&made);
                log::debug!("{} transmutes {}", ctx.caster.name, made.name);
                ctx.caster.stow(made);
            }
        }
        2 => {
            let mut refined = 0;
            if let Some(item) = ctx.caster.equipped.as_mut() {
                refined += usize::from(item.refine());
            }
            for item in ctx.caster.equipment_inventory.iter_mut() {
                refined += usize::from(item.refine());
            }
            log::debug!("{} refines {} items", ctx.caster.name, refined);
        }
        _ => fuse(ctx, params),
    }
    Vec::new()
}

fn fuse(ctx: &mut AbilityContext, params: &CastParams) {
    let chosen = match &params.item_ids {
        Some(ids) => ids.clone(),
        None => {
            let pool = ctx.caster.fusable_items();
            ctx.rng
                .distinct_indexes(pool.len(), FUSION_SIZE)
                .into_iter()
                .map(|n| pool[n])
                .collect()
        }
    };
    let mut artifact = Artifact {
        attack: 0,
        defense: 0,
        coins: 0,
        star: 0,
    };
    let mut star_total: u32 = 0;
    for id in chosen {
        let Some(item) = ctx.caster.take_normal(id) else {
            continue;
        };
        if let Some(e) = item.as_equipment() {
            star_total += u32::from(e.star);
            match e.category {
                EquipCategory::Attack => artifact.attack += e.power,
                EquipCategory::Defense => artifact.defense += e.power,
                EquipCategory::Coin => artifact.coins += e.power.max(0) as u32,
            }
        }
    }
    artifact.star = star_total.min(u32::from(ARTIFACT_MAX_STAR)) as u8;
    let item = Item {
        id: ctx.ids.next_id(),
        name: format!("Fused Relic ★{}", artifact.star),
        price: 0,
        kind: ItemKind::Special(SpecialEquipment::Artifact(artifact)),
    };
    log::debug!("{} fuses {}", ctx.caster.name, item.name);
    ctx.caster.stow(item);
}

pub(super) fn archer(ctx: &mut AbilityContext, def: &AbilityDef) -> Vec<MatchEvent> {
    let Some(kit) = ctx.caster.archer_mut() else {
        return Vec::new();
    };
    match def.index {
        1 => kit.extra_shots = def.power as u32,
        2 => {
            if kit.slots.len() < 2 {
                kit.slots.push(None);
            }
            kit.extra_shots = def.power as u32;
        }
        _ => {
            for slot in kit.slots.iter_mut().flatten() {
                if let Some(a) = slot.as_arrow_mut() {
                    a.pierce = true;
                }
            }
        }
    }
    Vec::new()
}
