//! # Simulation モジュール
//!
//! タワーディフェンスのシミュレーションループを提供します。
//!
//! セッションは `Initializing → Running → GameOver` の順に遷移します。
//! 1ティックは外部から一定間隔で駆動され、各ティックでは以下の順序で
//! 各コレクションの更新パスを最後まで実行してから次のパスへ進みます。
//!
//! 1. **操作処理**: タワー配置・種別選択・強化・終了
//! 2. **敵処理**: 目標への移動、到達判定
//! 3. **タワー処理**: クールダウン管理、弾の発射
//! 4. **弾処理**: 追尾移動、衝突判定、射程判定
//! 5. **目標処理**: 到達数の判定（ゲームオーバー）
//!
//! 弾は移動後の敵の位置に対して衝突判定を行い、目標の判定は敵の到達処理の後に行われます。
//! この順序を入れ替えると結果が変わります。
//!
//! ## 使用例
//!
//! ```rust
//! use towersim::interface::{NoInput, TraceRenderer};
//! use towersim::scenario::ScenarioConfig;
//! use towersim::simulation::SimulationEngine;
//!
//! let mut engine = SimulationEngine::new(ScenarioConfig::default(), 0);
//! engine.initialize();
//! let state = engine.run(&mut NoInput, &mut TraceRenderer::default(), false);
//! println!("{:?}", state);
//! ```

use std::fmt;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::arena::Arena;
use crate::interface::{Command, InputSource, Renderer};
use crate::models::{IEntity, TowerKind, Vector2};
use crate::scenario::ScenarioConfig;

/// ゲームオーバーの理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// 到達数が許容数を超えた
    ObjectiveOverrun,
    /// 利用者が終了を指示した
    Escaped,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOverReason::ObjectiveOverrun => f.write_str("objective_overrun"),
            GameOverReason::Escaped => f.write_str("escaped"),
        }
    }
}

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Running,
    /// 終端状態。以降アリーナは変更されない
    GameOver { reason: GameOverReason },
}

impl SessionState {
    pub fn is_over(&self) -> bool {
        matches!(self, SessionState::GameOver { .. })
    }
}

/// セッションの統計情報
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub ticks: u64,
    pub towers_placed: u32,
    pub shots_fired: u32,
    /// 発射タイミングで射程内に敵がいなかった回数
    pub shots_without_target: u32,
    pub hits: u32,
    pub enemies_spawned: u32,
    pub enemies_killed: u32,
    pub enemies_reached: u32,
}

pub struct SimulationEngine {
    pub arena: Arena,
    pub state: SessionState,
    pub tick_count: u64,
    pub stats: SessionStats,
    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
    rng: ChaCha8Rng,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let arena = Arena::new(scenario.arena.width, scenario.arena.height);
        let rng = ChaCha8Rng::seed_from_u64(scenario.sim.seed);

        Self {
            arena,
            state: SessionState::Initializing,
            tick_count: 0,
            stats: SessionStats::default(),
            scenario_config: scenario,
            verbose_level,
            rng,
        }
    }

    /// 目標と敵ウェーブを配置して実行状態へ移行
    pub fn initialize(&mut self) {
        if self.state != SessionState::Initializing {
            warn!(state = ?self.state, "セッションは既に初期化されています");
            return;
        }

        self.initialize_objective();
        self.initialize_waves();
        self.state = SessionState::Running;

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  アリーナ: {}x{}", self.arena.width, self.arena.height);
            info!("  目標: {}", self.arena.objective().position);
            info!("  敵: {}体", self.arena.enemies().len());
        }
    }

    fn initialize_objective(&mut self) {
        let position = self.arena.random_position(&mut self.rng);
        let objective = self.scenario_config.objective;
        let id = self.arena.add_objective(position, objective.size, objective.lives);

        debug!(
            objective_id = %id,
            position = %position,
            lives = objective.lives,
            "OBJECTIVE_PLACED: 目標を配置しました"
        );
    }

    fn initialize_waves(&mut self) {
        for wave in &self.scenario_config.waves {
            let config = self.scenario_config.enemy_kinds.get(wave.kind);
            for _ in 0..wave.count {
                let position = self.arena.random_position(&mut self.rng);
                self.arena.add_enemy(wave.kind, config, position);
                self.stats.enemies_spawned += 1;
            }

            if self.verbose_level > 1 {
                debug!(
                    kind = %wave.kind,
                    count = wave.count,
                    endurance = config.endurance,
                    speed = config.speed,
                    "WAVE_SPAWNED: 敵ウェーブを配置しました"
                );
            }
        }
    }

    /// 外部から操作を受け取りながらゲームオーバーまで実行
    ///
    /// # 引数
    ///
    /// * `input` - 操作の供給元
    /// * `renderer` - 描画先
    /// * `realtime` - trueの場合は `tick_interval_ms` ごとにティックを進める
    ///
    /// # 戻り値
    ///
    /// 終了時のセッション状態。`max_ticks` で打ち切った場合は `Running` のまま
    pub fn run(
        &mut self,
        input: &mut dyn InputSource,
        renderer: &mut dyn Renderer,
        realtime: bool,
    ) -> SessionState {
        if self.state == SessionState::Initializing {
            self.initialize();
        }
        let frame_interval = Duration::from_millis(self.scenario_config.sim.tick_interval_ms);

        info!("=== シミュレーション実行開始 ===");

        while !self.state.is_over() {
            if let Some(max_ticks) = self.scenario_config.sim.max_ticks {
                if self.tick_count >= max_ticks {
                    warn!(max_ticks, "最大ティック数に達したため打ち切ります");
                    break;
                }
            }

            let commands = input.poll(self.tick_count);
            self.step(&commands);
            renderer.draw(self.tick_count, &self.arena.snapshot());

            if self.tick_count % 100 == 0 && self.verbose_level > 0 {
                info!(
                    "進行状況: ティック {} (敵: {}体, タワー: {}基, 弾: {}発, 到達: {}/{})",
                    self.tick_count,
                    self.arena.enemies().len(),
                    self.arena.towers().len(),
                    self.arena.shots().len(),
                    self.arena.objective().arrivals(),
                    self.arena.objective().lives
                );
            }

            if realtime {
                thread::sleep(frame_interval);
            }
        }

        self.log_summary();
        self.state
    }

    /// 1ティック進める
    ///
    /// 実行状態でない場合は何もしない。
    pub fn step(&mut self, commands: &[Command]) -> SessionState {
        if self.state != SessionState::Running {
            return self.state;
        }

        self.process_commands(commands);
        if self.state.is_over() {
            return self.state;
        }

        self.process_enemies();
        self.process_towers();
        self.process_shots();
        self.process_objective();

        self.tick_count += 1;
        self.stats.ticks = self.tick_count;

        if self.verbose_level > 2 {
            trace!("ティック: {}", self.tick_count);
        }

        self.state
    }

    fn process_commands(&mut self, commands: &[Command]) {
        for command in commands {
            match *command {
                Command::PlaceTower { position, kind } => self.place_tower(position, kind),
                Command::SelectTowerKind(kind) => {
                    trace!(kind = %kind, "タワー種別の選択はパネル側で保持されます");
                }
                Command::OverchargeTower { position, piercing } => {
                    self.overcharge_tower(position, piercing)
                }
                Command::Escape => {
                    self.state = SessionState::GameOver {
                        reason: GameOverReason::Escaped,
                    };
                    info!(tick = self.tick_count, "GAME_OVER: 終了が指示されました");
                    return;
                }
            }
        }
    }

    fn place_tower(&mut self, position: Vector2, kind: TowerKind) {
        if !self.arena.contains(position) {
            warn!(position = %position, "アリーナ外にはタワーを配置できません");
            return;
        }
        let config = self.scenario_config.tower_kinds.get(kind);
        let id = self.arena.add_tower(kind, config, position);
        self.stats.towers_placed += 1;

        info!(
            tower_id = %id,
            kind = %kind,
            position = %position,
            "TOWER_PLACED: タワーを配置しました"
        );
    }

    fn overcharge_tower(&mut self, position: Vector2, piercing: u32) {
        match self.arena.tower_at_mut(position) {
            Some(tower) => {
                tower.overcharge(piercing);
                info!(
                    tower_id = %tower.get_id(),
                    piercing,
                    "TOWER_OVERCHARGED: 次の1発の貫通力を上書きしました"
                );
            }
            None => {
                debug!(position = %position, "指定位置にタワーがありません");
            }
        }
    }

    fn process_enemies(&mut self) {
        let arrivals = self.arena.update_enemies();
        for enemy_id in &arrivals {
            debug!(
                enemy_id = %enemy_id,
                tick = self.tick_count,
                arrivals = self.arena.objective().arrivals(),
                "ENEMY_REACHED_OBJECTIVE: 敵が目標に到達しました"
            );
        }
        self.stats.enemies_reached += arrivals.len() as u32;
    }

    fn process_towers(&mut self) {
        let report = self.arena.update_towers(&self.scenario_config.shot_kinds);
        self.stats.shots_fired += report.fired.len() as u32;
        self.stats.shots_without_target += report.no_target;
    }

    fn process_shots(&mut self) {
        let report = self.arena.update_shots();
        for enemy_id in &report.kills {
            debug!(
                enemy_id = %enemy_id,
                tick = self.tick_count,
                "ENEMY_DESTROYED: 敵を撃破しました"
            );
        }
        self.stats.hits += report.hits;
        self.stats.enemies_killed += report.kills.len() as u32;
    }

    fn process_objective(&mut self) {
        let objective = self.arena.objective();
        if objective.is_overrun() {
            self.state = SessionState::GameOver {
                reason: GameOverReason::ObjectiveOverrun,
            };
            info!(
                tick = self.tick_count,
                arrivals = objective.arrivals(),
                lives = objective.lives,
                "GAME_OVER: 到達数が許容数を超えました"
            );
        }
    }

    fn log_summary(&self) {
        info!("=== シミュレーション完了 ===");
        match self.state {
            SessionState::GameOver { reason } => info!(reason = %reason, "終了理由"),
            _ => info!("終了理由: 打ち切り"),
        }
        info!("総ティック数: {}", self.stats.ticks);
        info!("配置タワー: {}基", self.stats.towers_placed);
        info!(
            "発射: {}発 (射程外で見送り: {}回, 命中: {})",
            self.stats.shots_fired, self.stats.shots_without_target, self.stats.hits
        );
        info!(
            "敵: 出現 {}体 / 撃破 {}体 / 到達 {}体 / 残存 {}体",
            self.stats.enemies_spawned,
            self.stats.enemies_killed,
            self.stats.enemies_reached,
            self.arena.enemies().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{NoInput, TraceRenderer};
    use crate::models::{EnemyConfig, EnemyKind, TowerConfig};
    use crate::scenario::WaveConfig;

    /// 敵ウェーブなしで初期化したエンジン
    fn empty_engine(lives: u32) -> SimulationEngine {
        let mut scenario = ScenarioConfig::default();
        scenario.objective.lives = lives;
        scenario.waves = vec![WaveConfig {
            kind: EnemyKind::Basic,
            count: 0,
        }];
        let mut engine = SimulationEngine::new(scenario, 0);
        engine.initialize();
        engine
    }

    fn add_enemy_near_objective(engine: &mut SimulationEngine, offset: Vector2) {
        let position = engine.arena.objective().position + offset;
        engine
            .arena
            .add_enemy(EnemyKind::Basic, &EnemyConfig::basic(), position);
    }

    #[test]
    fn test_initialize_spawns_waves_in_bounds() {
        let mut engine = SimulationEngine::new(ScenarioConfig::default(), 0);
        assert_eq!(engine.state, SessionState::Initializing);
        engine.initialize();

        assert_eq!(engine.state, SessionState::Running);
        assert_eq!(engine.arena.live_enemies().count(), 7);
        assert_eq!(engine.arena.objectives().len(), 1);
        assert!(engine.arena.contains(engine.arena.objective().position));
        for enemy in engine.arena.enemies() {
            assert!(engine.arena.contains(enemy.position));
        }
        let strong = engine
            .arena
            .enemies()
            .iter()
            .filter(|e| e.kind == EnemyKind::Strong)
            .count();
        assert_eq!(strong, 5);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut a = SimulationEngine::new(ScenarioConfig::default(), 0);
        let mut b = SimulationEngine::new(ScenarioConfig::default(), 0);
        a.initialize();
        b.initialize();
        let positions = |engine: &SimulationEngine| -> Vec<Vector2> {
            engine.arena.enemies().iter().map(|e| e.position).collect()
        };
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_game_over_after_lives_exceeded() {
        let mut engine = empty_engine(5);
        for _ in 0..5 {
            add_enemy_near_objective(&mut engine, Vector2::new(0.5, 0.0));
        }
        assert_eq!(engine.step(&[]), SessionState::Running);
        assert_eq!(engine.arena.objective().arrivals(), 5);
        assert!(engine.arena.enemies().is_empty());

        add_enemy_near_objective(&mut engine, Vector2::new(0.0, 0.5));
        assert_eq!(
            engine.step(&[]),
            SessionState::GameOver {
                reason: GameOverReason::ObjectiveOverrun
            }
        );
        assert_eq!(engine.stats.enemies_reached, 6);
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut engine = empty_engine(0);
        add_enemy_near_objective(&mut engine, Vector2::new(0.5, 0.0));
        assert!(engine.step(&[]).is_over());
        let ticks = engine.tick_count;

        add_enemy_near_objective(&mut engine, Vector2::new(300.0, 0.0));
        let before = engine.arena.enemies()[0].position;
        let position = engine.arena.objective().position;
        engine.step(&[Command::PlaceTower {
            position,
            kind: TowerKind::Basic,
        }]);
        assert_eq!(engine.tick_count, ticks);
        assert_eq!(engine.arena.enemies()[0].position, before);
        assert!(engine.arena.towers().is_empty());
    }

    #[test]
    fn test_escape_ends_session_before_movement() {
        let mut engine = SimulationEngine::new(ScenarioConfig::default(), 0);
        engine.initialize();
        let before: Vec<Vector2> = engine.arena.enemies().iter().map(|e| e.position).collect();

        let state = engine.step(&[Command::Escape]);
        assert_eq!(
            state,
            SessionState::GameOver {
                reason: GameOverReason::Escaped
            }
        );
        let after: Vec<Vector2> = engine.arena.enemies().iter().map(|e| e.position).collect();
        assert_eq!(before, after);
        assert_eq!(engine.tick_count, 0);
    }

    #[test]
    fn test_place_select_and_overcharge_commands() {
        let mut engine = empty_engine(5);
        let position = Vector2::new(100.0, 100.0);
        engine.step(&[
            Command::SelectTowerKind(TowerKind::Tele),
            Command::PlaceTower {
                position,
                kind: TowerKind::Tele,
            },
            Command::PlaceTower {
                position: Vector2::new(-5.0, 10.0),
                kind: TowerKind::Basic,
            },
            Command::OverchargeTower {
                position,
                piercing: 3,
            },
        ]);

        assert_eq!(engine.arena.towers().len(), 1);
        let tower = &engine.arena.towers()[0];
        assert_eq!(tower.kind, TowerKind::Tele);
        assert_eq!(tower.piercing_override, Some(3));
        assert_eq!(engine.stats.towers_placed, 1);
    }

    #[test]
    fn test_tower_kills_moving_enemy() {
        let mut engine = empty_engine(5);
        engine.scenario_config.shot_kinds.shot.piercing = 5;
        let tower_config = TowerConfig {
            cooldown_ticks: 1,
            ..TowerConfig::basic()
        };
        let objective = engine.arena.objective().position;
        add_enemy_near_objective(&mut engine, Vector2::new(200.0, 0.0));
        engine.arena.add_tower(
            TowerKind::Basic,
            &tower_config,
            objective + Vector2::new(200.0, 10.0),
        );

        assert_eq!(engine.step(&[]), SessionState::Running);
        assert_eq!(engine.stats.shots_fired, 1);
        assert_eq!(engine.stats.enemies_killed, 1);
        assert!(engine.arena.enemies().is_empty());
        assert!(engine.arena.shots().is_empty());
        assert_eq!(engine.arena.towers()[0].kills, 1);
    }

    #[test]
    fn test_run_stops_at_max_ticks() {
        let mut scenario = ScenarioConfig::default();
        scenario.sim.max_ticks = Some(25);
        let mut engine = SimulationEngine::new(scenario, 0);
        let mut renderer = TraceRenderer::default();

        let state = engine.run(&mut NoInput, &mut renderer, false);
        assert_eq!(state, SessionState::Running);
        assert_eq!(engine.tick_count, 25);
        assert_eq!(renderer.frames, 25);
    }

    #[test]
    fn test_run_ends_on_game_over() {
        let mut engine = empty_engine(0);
        add_enemy_near_objective(&mut engine, Vector2::new(3.5, 0.0));
        let mut renderer = TraceRenderer::default();

        let state = engine.run(&mut NoInput, &mut renderer, false);
        assert!(state.is_over());
        assert_eq!(engine.tick_count, 3);
        assert_eq!(engine.stats.enemies_reached, 1);
    }
}
