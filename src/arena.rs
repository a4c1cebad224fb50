//! # Arena モジュール
//!
//! セッション内の全エンティティを所有するアリーナを提供します。
//!
//! 敵・タワー・弾・目標の4つのコレクションを挿入順で保持し、この順序が
//! そのまま更新順・描画順になります。他のエンティティへの参照は全て
//! [`EntityId`] で行い、アリーナを通して毎ティック生存確認します。
//!
//! ## 除去の扱い
//!
//! 更新中の除去（弾による撃破、目標への到達など）は `alive` フラグを倒すだけで、
//! 物理的な除去は各パスの終了時にまとめて行います。フラグが倒れたエンティティは
//! 以降の検索からは即座に見えなくなります。

use rand::Rng;
use tracing::{debug, trace};

use crate::interface::EntitySnapshot;
use crate::models::*;
use crate::scenario::ShotKinds;

/// 最も近い生存中の敵と、その距離を返す
///
/// 同距離の場合は挿入順で先にある敵を優先します。
pub fn nearest_live_enemy(enemies: &[Enemy], from: Vector2) -> Option<(&Enemy, f64)> {
    let mut nearest: Option<(&Enemy, f64)> = None;
    for enemy in enemies.iter().filter(|e| e.alive) {
        let distance = from.distance(&enemy.position);
        match nearest {
            Some((_, best)) if best <= distance => {}
            _ => nearest = Some((enemy, distance)),
        }
    }
    nearest
}

/// 位置が幅 `width`・高さ `height` の領域内（境界を含む）かどうか
pub fn in_bounds(width: u32, height: u32, position: Vector2) -> bool {
    position.x >= 0.0
        && position.x <= width as f64
        && position.y >= 0.0
        && position.y <= height as f64
}

/// タワー更新パスの結果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TowerPassReport {
    /// 発射された弾のID
    pub fired: Vec<EntityId>,
    /// 射程内に敵がおらず発射できなかった回数
    pub no_target: u32,
}

/// 弾更新パスの結果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShotPassReport {
    pub hits: u32,
    pub kills: Vec<EntityId>,
    pub expired: u32,
    pub target_lost: u32,
}

pub struct Arena {
    pub width: u32,
    pub height: u32,
    enemies: Vec<Enemy>,
    towers: Vec<Tower>,
    shots: Vec<Shot>,
    objectives: Vec<Objective>,
    next_id: u64,
}

impl Arena {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            enemies: Vec::new(),
            towers: Vec::new(),
            shots: Vec::new(),
            objectives: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(next_id: &mut u64) -> EntityId {
        let id = EntityId(*next_id);
        *next_id += 1;
        id
    }

    /// 領域内のランダムな位置（整数座標、境界を含む）
    pub fn random_position<R: Rng>(&self, rng: &mut R) -> Vector2 {
        Vector2::new(
            rng.gen_range(0..=self.width) as f64,
            rng.gen_range(0..=self.height) as f64,
        )
    }

    /// 位置が領域内かどうか
    pub fn contains(&self, position: Vector2) -> bool {
        in_bounds(self.width, self.height, position)
    }

    pub fn add_objective(&mut self, position: Vector2, size: u32, lives: u32) -> EntityId {
        let id = Self::allocate_id(&mut self.next_id);
        self.objectives.push(Objective::new(id, position, size, lives));
        id
    }

    pub fn add_enemy(&mut self, kind: EnemyKind, config: &EnemyConfig, position: Vector2) -> EntityId {
        let id = Self::allocate_id(&mut self.next_id);
        self.enemies.push(Enemy::new(id, kind, config, position));
        id
    }

    pub fn add_tower(&mut self, kind: TowerKind, config: &TowerConfig, position: Vector2) -> EntityId {
        let id = Self::allocate_id(&mut self.next_id);
        self.towers.push(Tower::new(id, kind, config, position));
        id
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn live_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.alive)
    }

    /// 唯一の生存中の目標
    ///
    /// 目標が存在しない状態での更新は不変条件違反なので即座にpanicします。
    pub fn objective(&self) -> &Objective {
        match self.objectives.iter().find(|o| o.alive) {
            Some(objective) => objective,
            None => panic!("arena has no live objective"),
        }
    }

    fn live_objective_mut(objectives: &mut [Objective]) -> &mut Objective {
        match objectives.iter_mut().find(|o| o.alive) {
            Some(objective) => objective,
            None => panic!("arena has no live objective"),
        }
    }

    /// IDで生存中の敵を検索
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.live_enemies().find(|e| e.id == id)
    }

    pub fn nearest_enemy(&self, from: Vector2) -> Option<(&Enemy, f64)> {
        nearest_live_enemy(&self.enemies, from)
    }

    /// 指定位置を含むタワー（後から置かれたものを優先）
    pub fn tower_at_mut(&mut self, position: Vector2) -> Option<&mut Tower> {
        self.towers
            .iter_mut()
            .rev()
            .find(|t| t.alive && t.bounds().contains(position))
    }

    /// 敵の更新パス
    ///
    /// 全ての敵を目標に向かって移動させ、到達した敵を目標に記録して除去します。
    ///
    /// # 戻り値
    ///
    /// このパスで到達した敵のID
    pub fn update_enemies(&mut self) -> Vec<EntityId> {
        let objective = Self::live_objective_mut(&mut self.objectives);
        let target = objective.position;
        let mut arrivals = Vec::new();

        for enemy in self.enemies.iter_mut().filter(|e| e.alive) {
            if enemy.tick(target) {
                enemy.kill();
                objective.record_arrival(enemy.id);
                arrivals.push(enemy.id);
            }
        }

        self.enemies.retain(|e| e.alive);
        arrivals
    }

    /// タワーの更新パス
    ///
    /// 発射タイミングのタワーについて弾の生成を試み、成功した場合のみ
    /// タワーの `AfterShot` イベントを発火します。新しい弾は挿入順で末尾に追加されます。
    pub fn update_towers(&mut self, shot_kinds: &ShotKinds) -> TowerPassReport {
        let Arena {
            towers,
            enemies,
            shots,
            next_id,
            ..
        } = self;
        let mut report = TowerPassReport::default();

        for tower in towers.iter_mut().filter(|t| t.alive) {
            let Some(request) = tower.tick() else {
                continue;
            };
            let config = shot_kinds.get(request.kind);
            let id = EntityId(*next_id);
            match Shot::spawn(
                id,
                request.tower,
                request.kind,
                config,
                request.origin,
                request.piercing_override,
                &enemies[..],
            ) {
                Ok(shot) => {
                    *next_id += 1;
                    debug!(
                        tower_id = %tower.id,
                        shot_id = %shot.id,
                        target_id = %shot.locked_target,
                        shot_kind = %shot.kind,
                        piercing = shot.piercing,
                        "SHOT_FIRED: タワーが弾を発射しました"
                    );
                    shots.push(shot);
                    tower.on_shot_fired();
                    report.fired.push(id);
                }
                Err(SpawnError::NoTargetInRange { range }) => {
                    trace!(
                        tower_id = %tower.id,
                        range,
                        "SHOT_SKIPPED: 射程内に敵がいません"
                    );
                    report.no_target += 1;
                }
            }
        }

        report
    }

    /// 弾の更新パス
    ///
    /// 撃破した敵は発射元タワーに通知し、パス終了時に敵と弾をまとめて除去します。
    pub fn update_shots(&mut self) -> ShotPassReport {
        let Arena {
            shots,
            enemies,
            towers,
            ..
        } = self;
        let mut report = ShotPassReport::default();

        for shot in shots.iter_mut().filter(|s| s.alive) {
            match shot.tick(&mut enemies[..]) {
                ShotOutcome::InFlight => {}
                ShotOutcome::TargetLost => {
                    trace!(shot_id = %shot.id, "SHOT_TARGET_LOST: 追尾対象が消滅しました");
                    report.target_lost += 1;
                }
                ShotOutcome::Expired => {
                    trace!(
                        shot_id = %shot.id,
                        travelled = shot.travelled(),
                        "SHOT_EXPIRED: 射程を超えました"
                    );
                    report.expired += 1;
                }
                ShotOutcome::Hit { hits, kills } => {
                    debug!(
                        shot_id = %shot.id,
                        hits = hits.len(),
                        kills = kills.len(),
                        piercing = shot.piercing,
                        "SHOT_HIT: 弾が命中しました"
                    );
                    report.hits += hits.len() as u32;
                    if !kills.is_empty() {
                        if let Some(tower) = towers.iter_mut().find(|t| t.id == shot.source) {
                            for _ in &kills {
                                tower.on_kill();
                            }
                        }
                    }
                    report.kills.extend(kills);
                }
            }
        }

        enemies.retain(|e| e.alive);
        shots.retain(|s| s.alive);
        report
    }

    /// 描画用スナップショット（敵 → タワー → 弾 → 目標 の順）
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        let mut frame = Vec::with_capacity(
            self.enemies.len() + self.towers.len() + self.shots.len() + self.objectives.len(),
        );
        frame.extend(self.enemies.iter().filter(|e| e.alive).map(EntitySnapshot::of));
        frame.extend(self.towers.iter().filter(|t| t.alive).map(EntitySnapshot::of));
        frame.extend(self.shots.iter().filter(|s| s.alive).map(EntitySnapshot::of));
        frame.extend(self.objectives.iter().filter(|o| o.alive).map(EntitySnapshot::of));
        frame
    }
}
