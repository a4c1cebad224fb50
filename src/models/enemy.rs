use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{
    common::{Color, EntityId, EntityTag, Vector2},
    targeting::{MovementMode, Targeting},
    traits::{IDrawable, IEntity},
};

/// 敵の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Basic,
    /// 高耐久・低速
    Strong,
    /// 低耐久・高速
    Fast,
}

impl EnemyKind {
    pub fn color(&self) -> Color {
        match self {
            EnemyKind::Basic => Color::RED,
            EnemyKind::Strong => Color::DARK_RED,
            EnemyKind::Fast => Color::ORANGE,
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Strong => "strong",
            EnemyKind::Fast => "fast",
        };
        f.write_str(name)
    }
}

/// 敵の種類ごとの性能パラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    /// 1ティックあたりの移動量（px）
    pub speed: f64,
    /// 初期耐久値
    pub endurance: u32,
    /// 当たり判定の一辺（px）
    pub size: u32,
    #[serde(default)]
    pub movement: MovementMode,
}

impl EnemyConfig {
    pub fn basic() -> Self {
        Self {
            speed: 1.0,
            endurance: 5,
            size: 15,
            movement: MovementMode::Tracking,
        }
    }

    pub fn strong() -> Self {
        Self {
            speed: 0.5,
            endurance: 15,
            size: 18,
            movement: MovementMode::Tracking,
        }
    }

    pub fn fast() -> Self {
        Self {
            speed: 2.5,
            endurance: 2,
            size: 12,
            movement: MovementMode::Tracking,
        }
    }
}

/// 敵エンティティ
///
/// 目標（Objective）に向かって移動し、到達すると目標の到達記録に登録されて消滅します。
/// 耐久値はインスタンスごとに設定から初期化され、弾の命中で減少します。
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub position: Vector2,
    pub size: u32,
    /// 現在の耐久値（残りHP）
    pub endurance: u32,
    pub targeting: Targeting,
    pub alive: bool,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, config: &EnemyConfig, position: Vector2) -> Self {
        Self {
            id,
            kind,
            position,
            size: config.size,
            endurance: config.endurance,
            targeting: Targeting::new(config.movement, config.speed),
            alive: true,
        }
    }

    /// 1ティックの処理
    ///
    /// 目標位置に向かって移動し、到達した場合はtrueを返します。
    /// 到達した敵の除去と到達記録は呼び出し側（アリーナ）が行います。
    pub fn tick(&mut self, objective_position: Vector2) -> bool {
        if !self.alive {
            return false;
        }
        self.position = self.targeting.advance(self.position, Some(objective_position));
        self.position.is_near(&objective_position)
    }

    /// ダメージを受ける
    ///
    /// 耐久値が0になった場合はtrueを返し、除去対象としてマークされます。
    pub fn take_damage(&mut self, damage: u32) -> bool {
        if !self.alive {
            return false;
        }
        self.endurance = self.endurance.saturating_sub(damage);
        if self.endurance == 0 {
            self.alive = false;
        }
        !self.alive
    }
}

impl IEntity for Enemy {
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

impl IDrawable for Enemy {
    fn tag(&self) -> EntityTag {
        EntityTag::Enemy
    }

    fn color(&self) -> Color {
        self.kind.color()
    }
}
