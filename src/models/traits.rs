use crate::models::common::*;

/// アリーナが所有する全エンティティの基本インターフェース
pub trait IEntity {
    /// エンティティIDの取得
    fn get_id(&self) -> EntityId;

    /// 現在位置の取得
    fn get_position(&self) -> Vector2;

    /// 当たり判定の一辺の長さ
    fn get_bounding_size(&self) -> u32;

    /// エンティティが生存しているかどうか
    fn is_alive(&self) -> bool;

    /// 除去対象としてマーク（実際の除去はパス終了時に行われる）
    fn kill(&mut self);

    /// 現在位置での当たり判定
    fn bounds(&self) -> Bounds {
        Bounds::new(self.get_position(), self.get_bounding_size())
    }
}

/// 描画側に公開する見た目情報のインターフェース
pub trait IDrawable: IEntity {
    /// エンティティ種別
    fn tag(&self) -> EntityTag;

    /// 描画色
    fn color(&self) -> Color;
}
