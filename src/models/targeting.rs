use serde::{Deserialize, Serialize};

use crate::models::common::Vector2;

/// 追尾方式
///
/// エンティティ生成時に設定から選択され、以後変わりません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// 毎ティック目標方向を再計算する
    #[default]
    Tracking,
    /// 最初のティックに決めた方向へ直進し続ける
    Straight,
}

impl MovementMode {
    /// 1ティック分の変位を計算する純粋関数
    ///
    /// # 引数
    ///
    /// * `speed` - 1ティックあたりの最大移動量
    /// * `position` - 現在位置
    /// * `target` - 目標の現在位置（消失している場合はNone）
    /// * `cached_direction` - 直進方式で確定済みの方向
    ///
    /// # 戻り値
    ///
    /// (変位, 今回使用した方向)。移動しない場合の方向はNone
    pub fn displacement(
        &self,
        speed: f64,
        position: Vector2,
        target: Option<Vector2>,
        cached_direction: Option<Vector2>,
    ) -> (Vector2, Option<Vector2>) {
        match self {
            MovementMode::Tracking => {
                let Some(target) = target else {
                    return (Vector2::ZERO, None);
                };
                let offset = target - position;
                let distance = offset.magnitude();
                if distance <= 0.0 {
                    return (Vector2::ZERO, None);
                }
                // 目標を通り過ぎないよう残り距離で頭打ち
                let direction = offset.normalize();
                (direction * speed.min(distance), Some(direction))
            }
            MovementMode::Straight => {
                let direction = match cached_direction {
                    Some(direction) => direction,
                    None => match target {
                        Some(target) => (target - position).normalize(),
                        None => return (Vector2::ZERO, None),
                    },
                };
                (direction * speed, Some(direction))
            }
        }
    }
}

/// 目標に向かって移動するエンティティの移動状態
#[derive(Debug, Clone, PartialEq)]
pub struct Targeting {
    pub mode: MovementMode,
    /// 1ティックあたりの移動量（px）
    pub speed: f64,
    /// 直近に使用した進行方向（直進方式では確定後に不変）
    pub direction: Option<Vector2>,
}

impl Targeting {
    pub fn new(mode: MovementMode, speed: f64) -> Self {
        Self {
            mode,
            speed,
            direction: None,
        }
    }

    /// 1ティック進めた後の位置を返す
    pub fn advance(&mut self, position: Vector2, target: Option<Vector2>) -> Vector2 {
        let (delta, direction) =
            self.mode
                .displacement(self.speed, position, target, self.direction);
        if let Some(direction) = direction {
            self.direction = Some(direction);
        }
        position + delta
    }
}
