//! # Panel モジュール
//!
//! タワー選択パネルと、シナリオの操作スクリプトを再生する入力のヘッドレス実装です。
//! 選択中のタワー種別はパネル側が保持し、クリック位置と組み合わせて
//! [`Command::PlaceTower`] を生成します。

use std::collections::VecDeque;

use tracing::debug;

use crate::interface::{Command, InputSource};
use crate::models::{TowerKind, Vector2};
use crate::scenario::{ScriptAction, ScriptEntry};

/// タワー選択パネル
#[derive(Debug, Default)]
pub struct TowerPanel {
    selected: TowerKind,
}

impl TowerPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> TowerKind {
        self.selected
    }

    /// 種類を選択し、コアへ通知する操作を返す
    pub fn select(&mut self, kind: TowerKind) -> Command {
        if self.selected != kind {
            debug!(previous = %self.selected, selected = %kind, "PANEL_SELECT: タワー種別を選択しました");
        }
        self.selected = kind;
        Command::SelectTowerKind(kind)
    }

    /// アリーナ上のクリックを配置操作に変換
    pub fn click(&self, position: Vector2) -> Command {
        Command::PlaceTower {
            position,
            kind: self.selected,
        }
    }
}

/// シナリオの操作スクリプトを再生する入力
#[derive(Debug)]
pub struct ScriptedInput {
    panel: TowerPanel,
    entries: VecDeque<ScriptEntry>,
}

impl ScriptedInput {
    pub fn new(script: &[ScriptEntry]) -> Self {
        let mut entries: Vec<ScriptEntry> = script.to_vec();
        // 同じティック内の記述順は保つ
        entries.sort_by_key(|entry| entry.tick);
        Self {
            panel: TowerPanel::new(),
            entries: entries.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    pub fn panel(&self) -> &TowerPanel {
        &self.panel
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, tick: u64) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Some(entry) = self.entries.front() {
            if entry.tick > tick {
                break;
            }
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            let command = match entry.action {
                ScriptAction::Place { x, y } => self.panel.click(Vector2::new(x, y)),
                ScriptAction::Select { kind } => self.panel.select(kind),
                ScriptAction::Overcharge { x, y, piercing } => Command::OverchargeTower {
                    position: Vector2::new(x, y),
                    piercing,
                },
                ScriptAction::Escape => Command::Escape,
            };
            commands.push(command);
        }
        commands
    }
}
