use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::arena::in_bounds;
use crate::models::{
    EnemyConfig, EnemyKind, MovementMode, ShotConfig, ShotKind, TowerConfig, TowerKind, Vector2,
};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "default".to_string(),
            description: "組み込みの標準シナリオ".to_string(),
        }
    }
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 1フレームの間隔（ミリ秒）。リアルタイム実行時のみ使用
    pub tick_interval_ms: u64,
    /// 実行ティック数の上限（ゲームオーバーにならない場合の打ち切り）
    pub max_ticks: Option<u64>,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30,
            max_ticks: Some(20_000),
            seed: 0,
        }
    }
}

/// アリーナ設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// 目標設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    /// 許容する到達数
    pub lives: u32,
    pub size: u32,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self { lives: 5, size: 20 }
    }
}

/// 敵の種類ごとの設定表
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnemyKinds {
    #[serde(default = "EnemyConfig::basic")]
    pub basic: EnemyConfig,
    #[serde(default = "EnemyConfig::strong")]
    pub strong: EnemyConfig,
    #[serde(default = "EnemyConfig::fast")]
    pub fast: EnemyConfig,
}

impl EnemyKinds {
    pub fn get(&self, kind: EnemyKind) -> &EnemyConfig {
        match kind {
            EnemyKind::Basic => &self.basic,
            EnemyKind::Strong => &self.strong,
            EnemyKind::Fast => &self.fast,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (EnemyKind, &EnemyConfig)> {
        [
            (EnemyKind::Basic, &self.basic),
            (EnemyKind::Strong, &self.strong),
            (EnemyKind::Fast, &self.fast),
        ]
        .into_iter()
    }
}

impl Default for EnemyKinds {
    fn default() -> Self {
        Self {
            basic: EnemyConfig::basic(),
            strong: EnemyConfig::strong(),
            fast: EnemyConfig::fast(),
        }
    }
}

/// タワーの種類ごとの設定表
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TowerKinds {
    #[serde(default = "TowerConfig::basic")]
    pub basic: TowerConfig,
    #[serde(default = "TowerConfig::tele")]
    pub tele: TowerConfig,
}

impl TowerKinds {
    pub fn get(&self, kind: TowerKind) -> &TowerConfig {
        match kind {
            TowerKind::Basic => &self.basic,
            TowerKind::Tele => &self.tele,
        }
    }
}

impl Default for TowerKinds {
    fn default() -> Self {
        Self {
            basic: TowerConfig::basic(),
            tele: TowerConfig::tele(),
        }
    }
}

/// 弾の種類ごとの設定表
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShotKinds {
    #[serde(default = "ShotConfig::shot")]
    pub shot: ShotConfig,
    #[serde(default = "ShotConfig::tele_shot")]
    pub tele_shot: ShotConfig,
}

impl ShotKinds {
    pub fn get(&self, kind: ShotKind) -> &ShotConfig {
        match kind {
            ShotKind::Shot => &self.shot,
            ShotKind::TeleShot => &self.tele_shot,
        }
    }
}

impl Default for ShotKinds {
    fn default() -> Self {
        Self {
            shot: ShotConfig::shot(),
            tele_shot: ShotConfig::tele_shot(),
        }
    }
}

/// 出現ウェーブ（敵の種類と数）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WaveConfig {
    pub kind: EnemyKind,
    pub count: u32,
}

fn default_waves() -> Vec<WaveConfig> {
    vec![
        WaveConfig { kind: EnemyKind::Basic, count: 1 },
        WaveConfig { kind: EnemyKind::Strong, count: 5 },
        WaveConfig { kind: EnemyKind::Fast, count: 1 },
    ]
}

/// スクリプト化された操作
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    /// 指定位置をクリック（選択中の種類のタワーを配置）
    Place { x: f64, y: f64 },
    /// 配置するタワーの種類を選択
    Select { kind: TowerKind },
    /// 指定位置のタワーを次の1発だけ強化
    Overcharge { x: f64, y: f64, piercing: u32 },
    /// 終了
    Escape,
}

/// ティック番号付きの操作
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptEntry {
    pub tick: u64,
    pub action: ScriptAction,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub sim: SimulationConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub objective: ObjectiveConfig,
    #[serde(default)]
    pub enemy_kinds: EnemyKinds,
    #[serde(default)]
    pub tower_kinds: TowerKinds,
    #[serde(default)]
    pub shot_kinds: ShotKinds,
    #[serde(default = "default_waves")]
    pub waves: Vec<WaveConfig>,
    #[serde(default)]
    pub script: Vec<ScriptEntry>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            meta: ScenarioMeta::default(),
            sim: SimulationConfig::default(),
            arena: ArenaConfig::default(),
            objective: ObjectiveConfig::default(),
            enemy_kinds: EnemyKinds::default(),
            tower_kinds: TowerKinds::default(),
            shot_kinds: ShotKinds::default(),
            waves: default_waves(),
            script: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        if self.sim.max_ticks == Some(0) {
            return invalid("max_ticks must be positive when given");
        }

        if self.arena.width == 0 || self.arena.height == 0 {
            return invalid("arena bounds must be positive");
        }
        if self.objective.size == 0 {
            return invalid("objective size must be positive");
        }

        for (kind, enemy) in self.enemy_kinds.iter() {
            if !(enemy.speed > 0.0) {
                return invalid(format!("enemy kind {} speed must be positive", kind));
            }
            if enemy.endurance == 0 || enemy.size == 0 {
                return invalid(format!("enemy kind {} endurance and size must be positive", kind));
            }
            // 直進では目標で止まらず到達判定をすり抜けてしまう
            if enemy.movement != MovementMode::Tracking {
                return invalid(format!("enemy kind {} must use tracking movement", kind));
            }
        }

        for kind in [TowerKind::Basic, TowerKind::Tele] {
            let tower = self.tower_kinds.get(kind);
            if tower.cooldown_ticks == 0 || tower.size == 0 {
                return invalid(format!("tower kind {} cooldown and size must be positive", kind));
            }
            if tower.piercing_override == Some(0) {
                return invalid(format!("tower kind {} piercing_override must be positive", kind));
            }
        }

        for kind in [ShotKind::Shot, ShotKind::TeleShot] {
            let shot = self.shot_kinds.get(kind);
            if !(shot.speed > 0.0) || !(shot.range > 0.0) {
                return invalid(format!("shot kind {} speed and range must be positive", kind));
            }
            if shot.piercing == 0 || shot.size == 0 {
                return invalid(format!("shot kind {} piercing and size must be positive", kind));
            }
        }

        if self.waves.is_empty() {
            return invalid("at least one wave is required");
        }

        for entry in &self.script {
            match &entry.action {
                ScriptAction::Place { x, y } | ScriptAction::Overcharge { x, y, .. } => {
                    if !in_bounds(self.arena.width, self.arena.height, Vector2::new(*x, *y)) {
                        return invalid(format!(
                            "script action at tick {} is outside arena bounds",
                            entry.tick
                        ));
                    }
                }
                _ => {}
            }
            if let ScriptAction::Overcharge { piercing: 0, .. } = entry.action {
                return invalid(format!("overcharge at tick {} needs positive piercing", entry.tick));
            }
        }

        Ok(())
    }

    /// ウェーブ全体の敵数
    pub fn total_enemies(&self) -> u32 {
        self.waves.iter().map(|w| w.count).sum()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("フレーム間隔: {}ミリ秒", self.sim.tick_interval_ms);
        match self.sim.max_ticks {
            Some(max_ticks) => println!("最大ティック数: {}", max_ticks),
            None => println!("最大ティック数: 無制限"),
        }
        println!("シード値: {}", self.sim.seed);
        println!("アリーナ: {}x{}", self.arena.width, self.arena.height);
        println!("目標の許容到達数: {}", self.objective.lives);
        println!();

        println!("=== 敵ウェーブ ===");
        println!("総敵数: {}体", self.total_enemies());
        for wave in &self.waves {
            let enemy = self.enemy_kinds.get(wave.kind);
            println!(
                "  {}: {}体 (耐久: {}, 速度: {:.1})",
                wave.kind, wave.count, enemy.endurance, enemy.speed
            );
        }

        if !self.script.is_empty() {
            println!();
            println!("=== 操作スクリプト ===");
            println!("操作数: {}", self.script.len());
        }
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T, ScenarioError> {
    Err(ScenarioError::ValidationError(msg.into()))
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}
