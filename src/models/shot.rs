use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::nearest_live_enemy;
use crate::models::{
    common::{Color, EntityId, EntityTag, Vector2},
    enemy::Enemy,
    targeting::{MovementMode, Targeting},
    traits::{IDrawable, IEntity},
};

/// 弾の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotKind {
    /// 追尾弾
    Shot,
    /// 直進する長射程弾
    TeleShot,
}

impl ShotKind {
    pub fn color(&self) -> Color {
        match self {
            ShotKind::Shot => Color::GREEN,
            ShotKind::TeleShot => Color::CYAN,
        }
    }
}

impl fmt::Display for ShotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShotKind::Shot => "shot",
            ShotKind::TeleShot => "tele_shot",
        };
        f.write_str(name)
    }
}

/// 弾の種類ごとの性能パラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotConfig {
    /// 1ティックあたりの移動量（px）
    pub speed: f64,
    /// 射程（px）。発射可否と飛翔距離上限の両方に使う
    pub range: f64,
    /// 命中時に与えるダメージ
    pub piercing: u32,
    /// 当たり判定の一辺（px）
    pub size: u32,
    #[serde(default)]
    pub movement: MovementMode,
}

impl ShotConfig {
    pub fn shot() -> Self {
        Self {
            speed: 2.0,
            range: 100.0,
            piercing: 1,
            size: 3,
            movement: MovementMode::Tracking,
        }
    }

    pub fn tele_shot() -> Self {
        Self {
            speed: 6.0,
            range: 250.0,
            piercing: 1,
            size: 4,
            movement: MovementMode::Straight,
        }
    }
}

/// 弾の生成失敗
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnError {
    /// 射程内に敵がいない（タワーは次のクールダウンまで待つ）
    #[error("射程 {range:.1}px 以内に敵がいません")]
    NoTargetInRange { range: f64 },
}

/// 1ティック処理の結果
#[derive(Debug, Clone, PartialEq)]
pub enum ShotOutcome {
    /// 飛翔中
    InFlight,
    /// 追尾対象が既に消滅していた
    TargetLost,
    /// 1体以上に命中した（命中した敵と撃破した敵）
    Hit {
        hits: Vec<EntityId>,
        kills: Vec<EntityId>,
    },
    /// 射程を超えて消滅した
    Expired,
}

/// 弾エンティティ
///
/// 生成時点で最も近い敵を追尾対象として固定します。追尾対象はIDで保持し、
/// 毎ティック生存確認を行います（他の弾に先に撃破されることがあるため）。
/// 衝突判定は追尾対象だけでなく全ての生存している敵に対して行い、
/// 重なった全ての敵に `piercing` のダメージを与えます。
#[derive(Debug, Clone)]
pub struct Shot {
    pub id: EntityId,
    pub kind: ShotKind,
    /// 発射したタワー
    pub source: EntityId,
    pub locked_target: EntityId,
    pub position: Vector2,
    /// 発射位置
    pub origin: Vector2,
    pub size: u32,
    pub range: f64,
    pub piercing: u32,
    pub targeting: Targeting,
    pub alive: bool,
}

impl Shot {
    /// 弾を生成し、最も近い敵に追尾対象を固定する
    ///
    /// # 引数
    ///
    /// * `id` - 新しい弾のID
    /// * `source` - 発射したタワーのID
    /// * `kind` - 弾の種類
    /// * `config` - 弾の性能パラメータ
    /// * `origin` - 発射位置
    /// * `piercing_override` - タワー側で上書きされた貫通力
    /// * `enemies` - アリーナ内の敵
    ///
    /// # 戻り値
    ///
    /// 最も近い敵が射程外、または敵がいない場合は `SpawnError::NoTargetInRange`
    pub fn spawn(
        id: EntityId,
        source: EntityId,
        kind: ShotKind,
        config: &ShotConfig,
        origin: Vector2,
        piercing_override: Option<u32>,
        enemies: &[Enemy],
    ) -> Result<Shot, SpawnError> {
        let no_target = SpawnError::NoTargetInRange {
            range: config.range,
        };
        let (target, distance) = nearest_live_enemy(enemies, origin).ok_or(no_target.clone())?;
        if distance > config.range {
            return Err(no_target);
        }

        Ok(Shot {
            id,
            kind,
            source,
            locked_target: target.id,
            position: origin,
            origin,
            size: config.size,
            range: config.range,
            piercing: piercing_override.unwrap_or(config.piercing),
            targeting: Targeting::new(config.movement, config.speed),
            alive: true,
        })
    }

    /// 発射位置からの距離
    pub fn travelled(&self) -> f64 {
        self.position.distance(&self.origin)
    }

    /// 1ティックの処理
    ///
    /// 追尾対象の生存確認 → 移動 → 全敵との衝突判定 → 射程判定 の順で処理します。
    /// 撃破された敵はその場で除去マークされ、以降の弾からは見えなくなります。
    pub fn tick(&mut self, enemies: &mut [Enemy]) -> ShotOutcome {
        if !self.alive {
            return ShotOutcome::InFlight;
        }

        let target_position = enemies
            .iter()
            .find(|enemy| enemy.alive && enemy.id == self.locked_target)
            .map(|enemy| enemy.position);
        let Some(target_position) = target_position else {
            self.alive = false;
            return ShotOutcome::TargetLost;
        };

        self.position = self.targeting.advance(self.position, Some(target_position));

        let bounds = self.bounds();
        let mut hits = Vec::new();
        let mut kills = Vec::new();
        for enemy in enemies.iter_mut().filter(|enemy| enemy.alive) {
            if bounds.intersects(&enemy.bounds()) {
                hits.push(enemy.id);
                if enemy.take_damage(self.piercing) {
                    kills.push(enemy.id);
                }
            }
        }
        if !hits.is_empty() {
            self.alive = false;
            return ShotOutcome::Hit { hits, kills };
        }

        if self.travelled() > self.range {
            self.alive = false;
            return ShotOutcome::Expired;
        }

        ShotOutcome::InFlight
    }
}

impl IEntity for Shot {
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

impl IDrawable for Shot {
    fn tag(&self) -> EntityTag {
        EntityTag::Shot
    }

    fn color(&self) -> Color {
        self.kind.color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enemy::{EnemyConfig, EnemyKind};

    const TOWER: EntityId = EntityId(100);

    fn enemy(id: u64, x: f64, y: f64, endurance: u32) -> Enemy {
        let config = EnemyConfig {
            endurance,
            ..EnemyConfig::basic()
        };
        Enemy::new(EntityId(id), EnemyKind::Basic, &config, Vector2::new(x, y))
    }

    fn spawn(config: &ShotConfig, enemies: &[Enemy]) -> Result<Shot, SpawnError> {
        Shot::spawn(
            EntityId(1),
            TOWER,
            ShotKind::Shot,
            config,
            Vector2::ZERO,
            None,
            enemies,
        )
    }

    #[test]
    fn test_spawn_without_enemies_fails() {
        let result = spawn(&ShotConfig::shot(), &[]);
        assert_eq!(result.unwrap_err(), SpawnError::NoTargetInRange { range: 100.0 });
    }

    #[test]
    fn test_spawn_range_boundary() {
        let config = ShotConfig::shot();
        assert!(spawn(&config, &[enemy(2, 101.0, 0.0, 5)]).is_err());
        let shot = spawn(&config, &[enemy(2, 100.0, 0.0, 5)]).expect("enemy at exact range");
        assert_eq!(shot.locked_target, EntityId(2));
    }

    #[test]
    fn test_spawn_locks_nearest_live_enemy() {
        let mut dead = enemy(2, 5.0, 0.0, 5);
        dead.kill();
        let enemies = vec![dead, enemy(3, 50.0, 0.0, 5), enemy(4, 0.0, 30.0, 5)];
        let shot = spawn(&ShotConfig::shot(), &enemies).expect("target in range");
        assert_eq!(shot.locked_target, EntityId(4));
        assert_eq!(shot.source, TOWER);
    }

    #[test]
    fn test_piercing_override_replaces_damage() {
        let enemies = vec![enemy(2, 10.0, 0.0, 5)];
        let shot = Shot::spawn(
            EntityId(1),
            TOWER,
            ShotKind::Shot,
            &ShotConfig::shot(),
            Vector2::ZERO,
            Some(4),
            &enemies,
        )
        .expect("target in range");
        assert_eq!(shot.piercing, 4);
    }

    #[test]
    fn test_piercing_two_against_endurance_five() {
        let config = ShotConfig {
            piercing: 2,
            ..ShotConfig::shot()
        };
        let mut enemies = vec![enemy(2, 2.0, 0.0, 5)];

        let expected = [(3, true), (1, true), (0, false)];
        for (endurance, alive) in expected {
            let mut shot = spawn(&config, &enemies).expect("target in range");
            let outcome = shot.tick(&mut enemies);
            assert!(matches!(outcome, ShotOutcome::Hit { .. }));
            assert!(!shot.is_alive());
            assert_eq!(enemies[0].endurance, endurance);
            assert_eq!(enemies[0].is_alive(), alive);
        }
    }

    #[test]
    fn test_hit_damages_every_overlapping_enemy() {
        let mut enemies = vec![
            enemy(2, 2.0, 0.0, 1),
            enemy(3, 4.0, 3.0, 5),
            enemy(4, 60.0, 0.0, 5),
        ];
        let mut shot = spawn(&ShotConfig::shot(), &enemies).expect("target in range");
        let outcome = shot.tick(&mut enemies);
        assert_eq!(
            outcome,
            ShotOutcome::Hit {
                hits: vec![EntityId(2), EntityId(3)],
                kills: vec![EntityId(2)],
            }
        );
        assert_eq!(enemies[1].endurance, 4);
        assert_eq!(enemies[2].endurance, 5);
    }

    #[test]
    fn test_target_lost_removes_shot_without_damage() {
        let mut enemies = vec![enemy(2, 50.0, 0.0, 5), enemy(3, 80.0, 0.0, 5)];
        let mut shot = spawn(&ShotConfig::shot(), &enemies).expect("target in range");
        enemies[0].kill();
        let before = shot.position;
        assert_eq!(shot.tick(&mut enemies), ShotOutcome::TargetLost);
        assert!(!shot.is_alive());
        assert_eq!(shot.position, before);
        assert_eq!(enemies[1].endurance, 5);
    }

    #[test]
    fn test_straight_shot_expires_past_range() {
        let config = ShotConfig {
            speed: 10.0,
            range: 30.0,
            movement: MovementMode::Straight,
            ..ShotConfig::shot()
        };
        let mut enemies = vec![enemy(2, 25.0, 0.0, 5)];
        let mut shot = spawn(&config, &enemies).expect("target in range");
        // 初回ティックで方向が確定した後、敵は射線から外れる
        assert_eq!(shot.tick(&mut enemies), ShotOutcome::InFlight);
        let locked = shot.targeting.direction;
        enemies[0].position = Vector2::new(25.0, 200.0);

        assert_eq!(shot.tick(&mut enemies), ShotOutcome::InFlight);
        assert_eq!(shot.tick(&mut enemies), ShotOutcome::InFlight);
        assert_eq!(shot.tick(&mut enemies), ShotOutcome::Expired);
        assert_eq!(shot.targeting.direction, locked);
        assert_eq!(enemies[0].endurance, 5);
    }
}
