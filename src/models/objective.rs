use std::collections::HashSet;

use crate::models::{
    common::{Color, EntityId, EntityTag, Vector2},
    traits::{IDrawable, IEntity},
};

/// 目標エンティティ（防衛対象）
///
/// 到達した敵のIDを記録します。記録は敵がアリーナから除去された後も保持され、
/// 到達数が `lives` を超えるとゲームオーバーになります。
#[derive(Debug, Clone)]
pub struct Objective {
    pub id: EntityId,
    pub position: Vector2,
    pub size: u32,
    /// 許容する到達数
    pub lives: u32,
    pub enemies_reached: HashSet<EntityId>,
    pub alive: bool,
}

impl Objective {
    pub fn new(id: EntityId, position: Vector2, size: u32, lives: u32) -> Self {
        Self {
            id,
            position,
            size,
            lives,
            enemies_reached: HashSet::new(),
            alive: true,
        }
    }

    /// 敵の到達を記録
    ///
    /// 同じ敵を二重に数えることはない。新規の記録であればtrue。
    pub fn record_arrival(&mut self, enemy: EntityId) -> bool {
        self.enemies_reached.insert(enemy)
    }

    pub fn arrivals(&self) -> usize {
        self.enemies_reached.len()
    }

    /// 残りの許容到達数
    pub fn lives_remaining(&self) -> u32 {
        self.lives.saturating_sub(self.arrivals() as u32)
    }

    /// 到達数が許容数を超えたか
    pub fn is_overrun(&self) -> bool {
        self.arrivals() > self.lives as usize
    }
}

impl IEntity for Objective {
    fn get_id(&self) -> EntityId {
        self.id
    }

    fn get_position(&self) -> Vector2 {
        self.position
    }

    fn get_bounding_size(&self) -> u32 {
        self.size
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn kill(&mut self) {
        self.alive = false;
    }
}

impl IDrawable for Objective {
    fn tag(&self) -> EntityTag {
        EntityTag::Objective
    }

    fn color(&self) -> Color {
        Color::YELLOW
    }
}
