// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エンティティの基本インターフェース（trait）定義
pub mod traits;

// 追尾移動とワンショットイベント
pub mod targeting;
pub mod event_queue;

// 各エンティティモデルの実装
pub mod enemy;
pub mod tower;
pub mod shot;
pub mod objective;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use targeting::{MovementMode, Targeting};
pub use event_queue::{Callback, EventQueue, EventType};
pub use enemy::{Enemy, EnemyConfig, EnemyKind};
pub use tower::{ShotRequest, Tower, TowerConfig, TowerKind, OVERCHARGED_COLOR};
pub use shot::{Shot, ShotConfig, ShotKind, ShotOutcome, SpawnError};
pub use objective::Objective;
