//! # Interface モジュール
//!
//! シミュレーションコアと外部の協調者（入力・描画・タワー選択パネル）との境界を定義します。
//!
//! - 入力側はポインタやキーの生イベントを [`Command`] に変換して渡します。
//! - 描画側は [`EntitySnapshot`] の列を読み取るだけで、コアの状態は変更しません。

use tracing::trace;

use crate::models::{Color, EntityId, EntityTag, IDrawable, IEntity, TowerKind, Vector2};

/// 1ティック分の外部操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// 指定位置にタワーを配置
    PlaceTower { position: Vector2, kind: TowerKind },
    /// 配置するタワーの種類を選択（パネル側の状態で、アリーナには影響しない）
    SelectTowerKind(TowerKind),
    /// 指定位置のタワーを次の1発だけ強化
    OverchargeTower { position: Vector2, piercing: u32 },
    /// 即時終了
    Escape,
}

/// 描画用のエンティティ情報
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub tag: EntityTag,
    pub position: Vector2,
    pub bounding_size: u32,
    pub color: Color,
}

impl EntitySnapshot {
    pub fn of<E: IDrawable>(entity: &E) -> Self {
        Self {
            id: entity.get_id(),
            tag: entity.tag(),
            position: entity.get_position(),
            bounding_size: entity.get_bounding_size(),
            color: entity.color(),
        }
    }
}

/// 操作の供給元
pub trait InputSource {
    /// 指定ティックで処理する操作を順番に返す
    fn poll(&mut self, tick: u64) -> Vec<Command>;
}

/// 描画先
pub trait Renderer {
    /// 1フレーム分のスナップショットを受け取る
    fn draw(&mut self, tick: u64, frame: &[EntitySnapshot]);
}

/// 操作を一切行わない入力
#[derive(Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _tick: u64) -> Vec<Command> {
        Vec::new()
    }
}

/// フレームをtraceログに出力する描画先（ヘッドレス実行用）
#[derive(Debug, Default)]
pub struct TraceRenderer {
    pub frames: u64,
}

impl Renderer for TraceRenderer {
    fn draw(&mut self, tick: u64, frame: &[EntitySnapshot]) {
        self.frames += 1;
        let count = |tag: EntityTag| frame.iter().filter(|s| s.tag == tag).count();
        trace!(
            tick,
            enemies = count(EntityTag::Enemy),
            towers = count(EntityTag::Tower),
            shots = count(EntityTag::Shot),
            "FRAME: フレームを描画しました"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Enemy, EnemyConfig, EnemyKind};

    #[test]
    fn test_snapshot_of_enemy() {
        let enemy = Enemy::new(
            EntityId(9),
            EnemyKind::Fast,
            &EnemyConfig::fast(),
            Vector2::new(4.0, 2.0),
        );
        let snapshot = EntitySnapshot::of(&enemy);
        assert_eq!(snapshot.id, EntityId(9));
        assert_eq!(snapshot.tag, EntityTag::Enemy);
        assert_eq!(snapshot.position, Vector2::new(4.0, 2.0));
        assert_eq!(snapshot.bounding_size, EnemyConfig::fast().size);
        assert_eq!(snapshot.color, EnemyKind::Fast.color());
    }

    #[test]
    fn test_trace_renderer_counts_frames() {
        let mut renderer = TraceRenderer::default();
        renderer.draw(0, &[]);
        renderer.draw(1, &[]);
        assert_eq!(renderer.frames, 2);
        assert!(NoInput.poll(0).is_empty());
    }
}
