//! # towersim
//!
//! リアルタイム・タワーディフェンスのシミュレーションコアです。
//!
//! 敵はアリーナ上を目標に向かって移動し、配置されたタワーは一定間隔で
//! 敵を追尾・貫通する弾を発射します。目標への到達数が許容数を超えると
//! ゲームオーバーになります。描画・入力・タワー選択GUIは外部の協調者として扱い、
//! [`interface`] で定義した境界を通してコアとやり取りします。

pub mod arena;
pub mod interface;
pub mod logging;
pub mod models;
pub mod panel;
pub mod scenario;
pub mod simulation;
