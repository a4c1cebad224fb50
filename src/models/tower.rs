use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{
    common::{Color, EntityId, EntityTag, Vector2},
    event_queue::{EventQueue, EventType},
    shot::ShotKind,
    traits::{IDrawable, IEntity},
};

/// オーバーチャージ中のタワーの描画色
pub const OVERCHARGED_COLOR: Color = Color::MAGENTA;

/// タワーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    #[default]
    Basic,
    Tele,
}

impl TowerKind {
    pub fn color(&self) -> Color {
        match self {
            TowerKind::Basic => Color::BLUE,
            TowerKind::Tele => Color::PURPLE,
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TowerKind::Basic => "basic",
            TowerKind::Tele => "tele",
        };
        f.write_str(name)
    }
}

/// タワーの種類ごとの性能パラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerConfig {
    /// 発射間隔（ティック）
    pub cooldown_ticks: u32,
    /// 当たり判定の一辺（px）
    pub size: u32,
    /// 発射する弾の種類
    pub shot: ShotKind,
    /// 弾の貫通力の上書き
    #[serde(default)]
    pub piercing_override: Option<u32>,
}

impl TowerConfig {
    pub fn basic() -> Self {
        Self {
            cooldown_ticks: 15,
            size: 15,
            shot: ShotKind::Shot,
            piercing_override: None,
        }
    }

    pub fn tele() -> Self {
        Self {
            cooldown_ticks: 30,
            size: 18,
            shot: ShotKind::TeleShot,
            piercing_override: None,
        }
    }
}

/// タワーが発射を試みるときの要求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub tower: EntityId,
    pub kind: ShotKind,
    pub origin: Vector2,
    pub piercing_override: Option<u32>,
}

/// タワーエンティティ
///
/// クールダウンが0になるたびに弾の発射を試みます。発射に成功した場合は
/// イベントキューに登録された `AfterShot` コールバックを1件だけ実行します。
#[derive(Debug)]
pub struct Tower {
    pub id: EntityId,
    pub kind: TowerKind,
    pub position: Vector2,
    pub size: u32,
    pub shot_kind: ShotKind,
    pub cooldown_period: u32,
    pub cooldown_remaining: u32,
    pub piercing_override: Option<u32>,
    pub color: Color,
    pub events: EventQueue<Tower>,
    pub shots_fired: u32,
    pub kills: u32,
    pub alive: bool,
}

impl Tower {
    pub fn new(id: EntityId, kind: TowerKind, config: &TowerConfig, position: Vector2) -> Self {
        Self {
            id,
            kind,
            position,
            size: config.size,
            shot_kind: config.shot,
            cooldown_period: config.cooldown_ticks,
            cooldown_remaining: config.cooldown_ticks,
            piercing_override: config.piercing_override,
            color: kind.color(),
            events: EventQueue::new(),
            shots_fired: 0,
            kills: 0,
            alive: true,
        }
    }

    /// 1ティックの処理
    ///
    /// クールダウンを進め、発射タイミングであれば発射要求を返します。
    /// 発射に失敗してもクールダウンはリセットされます。
    pub fn tick(&mut self) -> Option<ShotRequest> {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
        if self.cooldown_remaining > 0 {
            return None;
        }
        self.cooldown_remaining = self.cooldown_period;
        Some(ShotRequest {
            tower: self.id,
            kind: self.shot_kind,
            origin: self.position,
            piercing_override: self.piercing_override,
        })
    }

    /// 発射成功の通知
    pub fn on_shot_fired(&mut self) {
        self.shots_fired += 1;
        self.fire_event(EventType::AfterShot);
    }

    /// 自分の弾による撃破の通知
    pub fn on_kill(&mut self) {
        self.kills += 1;
        self.fire_event(EventType::AfterKill);
    }

    fn fire_event(&mut self, event: EventType) {
        if let Some(callback) = self.events.pick(event) {
            callback(self);
        }
    }

    /// 次の1発だけ貫通力を上書きする
    ///
    /// 上書き中は描画色も変わり、発射に成功した直後に元の貫通力と色へ戻ります。
    /// 発射前に重ねて呼んだ場合は貫通力だけを差し替え、復元先は最初の状態のままです。
    pub fn overcharge(&mut self, piercing: u32) {
        if self.is_overcharged() {
            self.piercing_override = Some(piercing);
            return;
        }
        let previous_override = self.piercing_override;
        let previous_color = self.color;
        self.piercing_override = Some(piercing);
        self.color = OVERCHARGED_COLOR;
        self.events.register(
            EventType::AfterShot,
            Box::new(move |tower: &mut Tower| {
                tower.piercing_override = previous_override;
                tower.color = previous_color;
            }),
        );
    }

    pub fn is_overcharged(&self) -> bool {
        self.events.pending(EventType::AfterShot) > 0
    }
}

impl IEntity for Tower {
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

impl IDrawable for Tower {
    fn tag(&self) -> EntityTag {
        EntityTag::Tower
    }

    fn color(&self) -> Color {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower(cooldown_ticks: u32) -> Tower {
        let config = TowerConfig {
            cooldown_ticks,
            ..TowerConfig::basic()
        };
        Tower::new(EntityId(7), TowerKind::Basic, &config, Vector2::new(5.0, 5.0))
    }

    #[test]
    fn test_fires_every_cooldown_period() {
        let mut tower = tower(3);
        let fired: Vec<bool> = (0..9).map(|_| tower.tick().is_some()).collect();
        assert_eq!(
            fired,
            vec![false, false, true, false, false, true, false, false, true]
        );
        assert_eq!(tower.cooldown_remaining, 3);
    }

    #[test]
    fn test_request_carries_tower_state() {
        let mut tower = tower(1);
        tower.piercing_override = Some(3);
        let request = tower.tick().expect("cooldown of one fires every tick");
        assert_eq!(request.tower, EntityId(7));
        assert_eq!(request.kind, ShotKind::Shot);
        assert_eq!(request.origin, Vector2::new(5.0, 5.0));
        assert_eq!(request.piercing_override, Some(3));
    }

    #[test]
    fn test_overcharge_lasts_exactly_one_shot() {
        let mut tower = tower(1);
        tower.overcharge(5);
        assert!(tower.is_overcharged());
        assert_eq!(tower.color, OVERCHARGED_COLOR);

        let request = tower.tick().expect("fires");
        assert_eq!(request.piercing_override, Some(5));
        tower.on_shot_fired();

        assert!(!tower.is_overcharged());
        assert_eq!(tower.piercing_override, None);
        assert_eq!(tower.color, TowerKind::Basic.color());
        assert_eq!(tower.tick().expect("fires").piercing_override, None);
    }

    #[test]
    fn test_repeated_overcharge_still_lasts_one_shot() {
        let mut tower = tower(1);
        tower.overcharge(3);
        tower.overcharge(5);
        assert_eq!(tower.events.pending(EventType::AfterShot), 1);

        assert_eq!(tower.tick().expect("fires").piercing_override, Some(5));
        tower.on_shot_fired();
        assert!(!tower.is_overcharged());
        assert_eq!(tower.color, TowerKind::Basic.color());

        for _ in 0..3 {
            assert_eq!(tower.tick().expect("fires").piercing_override, None);
            tower.on_shot_fired();
        }
        assert_eq!(tower.piercing_override, None);
        assert_eq!(tower.color, TowerKind::Basic.color());
    }

    #[test]
    fn test_after_kill_event() {
        let mut tower = tower(1);
        tower.events.register(
            EventType::AfterKill,
            Box::new(|tower: &mut Tower| tower.cooldown_period = 1_000),
        );
        tower.on_shot_fired();
        assert_eq!(tower.cooldown_period, 1);
        tower.on_kill();
        assert_eq!(tower.cooldown_period, 1_000);
        assert_eq!(tower.kills, 1);
    }
}
