use std::str::FromStr;

use clap::{Arg, Command};
use towersim::interface::TraceRenderer;
use towersim::logging::{init_logging, parse_log_level, LogConfig, LogOutput};
use towersim::panel::ScriptedInput;
use towersim::scenario::ScenarioConfig;
use towersim::simulation::{SessionState, SimulationEngine};

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("towersim")
        .version("0.1.0")
        .about("タワーディフェンス・シミュレーション (Tower Defense Simulation)")
        .long_about("ティック駆動のタワーディフェンス・シミュレーション\n\
                     シナリオの敵ウェーブと操作スクリプトを再生し、防衛結果を記録します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、組み込みの標準シナリオで実行されます。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("ticks")
                .long("ticks")
                .value_name("N")
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("実行ティック数の上限（シナリオの max_ticks を上書き）")
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .action(clap::ArgAction::SetTrue)
                .help("フレーム間隔 (tick_interval_ms) ごとにティックを進める")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルの出力ディレクトリ")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .get_matches();

    println!("タワーディフェンス・シミュレーション - towersim v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        None => LogOutput::Console,
    };
    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| LogConfig::level_for_verbosity(verbose_level)),
        output,
        log_dir: matches
            .get_one::<String>("log-dir")
            .cloned()
            .unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: ログ初期化に失敗しました: {}", e);
            std::process::exit(1);
        }
    };

    let options = RunOptions {
        scenario_path: matches.get_one::<String>("scenario").cloned(),
        info_only: matches.get_flag("info"),
        max_ticks: matches.get_one::<u64>("ticks").copied(),
        realtime: matches.get_flag("realtime"),
        verbose_level,
    };

    match run_scenario(options) {
        Ok(_) => {
            if verbose_level > 0 {
                println!("シナリオ実行が正常に完了しました。");
            }
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    }
}

struct RunOptions {
    scenario_path: Option<String>,
    info_only: bool,
    max_ticks: Option<u64>,
    realtime: bool,
    verbose_level: u8,
}

/// シナリオを読み込んで実行
fn run_scenario(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = match &options.scenario_path {
        Some(path) => {
            let scenario = ScenarioConfig::from_file(path)?;
            if options.verbose_level > 0 {
                println!("シナリオファイル読み込み完了: {}", path);
            }
            scenario
        }
        None => ScenarioConfig::default(),
    };

    if let Some(max_ticks) = options.max_ticks {
        scenario.sim.max_ticks = Some(max_ticks);
    }

    // 情報表示のみの場合
    if options.info_only {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(scenario, options.realtime, options.verbose_level)
}

/// シナリオの実行
fn execute_scenario(
    scenario: ScenarioConfig,
    realtime: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    let mut input = ScriptedInput::new(&scenario.script);
    let mut renderer = TraceRenderer::default();

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize();
    let state = simulation.run(&mut input, &mut renderer, realtime);

    println!("=== 結果 ===");
    match state {
        SessionState::GameOver { reason } => println!("ゲームオーバー: {}", reason),
        _ => println!("打ち切り（ゲームオーバーに至らず）"),
    }
    let stats = &simulation.stats;
    println!("総ティック数: {}", stats.ticks);
    println!("撃破: {}体 / 到達: {}体", stats.enemies_killed, stats.enemies_reached);
    println!("発射: {}発 / 命中: {}", stats.shots_fired, stats.hits);

    Ok(())
}
