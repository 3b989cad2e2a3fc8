use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use comfy_table::Color;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

use excel_cache::{DecoderConfig, LoadStatus};
use excel_cli::cli::{Cli, Command, DecodeArgs, GenerateArgs, LogFormatArg};
use excel_cli::commands::{
    GenerateLine, GenerateStatus, resolve_anchors, run_datasets, run_decode, run_generate,
};
use excel_cli::summary::{confidence_color, decode_summaries, generate_line};
use excel_map::ConfidenceThresholds;

struct Fixture {
    _dir: TempDir,
    config: DecoderConfig,
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let dumps = dir.path().join("dumps");
    fs::create_dir_all(&dumps).unwrap();
    write_json(
        &dumps.join("AvatarExcelConfigData.json"),
        &json!([
            {"id": 10000021, "name": "Amber", "rank": 4, "useType": "AVATAR_FORMAL"},
            {"id": 10000015, "name": "Kaeya", "rank": 4, "useType": "AVATAR_FORMAL"},
            {"id": 10000006, "name": "Lisa", "rank": 4, "useType": "AVATAR_FORMAL"},
            {"id": 10000003, "name": "Jean", "rank": 5, "useType": "AVATAR_FORMAL"},
        ]),
    );
    let config = DecoderConfig {
        master_dir: dir.path().join("masters"),
        dump_dir: dumps,
        ..DecoderConfig::default()
    };
    Fixture { _dir: dir, config }
}

fn generate(targets: &[&str], force: bool) -> GenerateArgs {
    GenerateArgs {
        targets: targets.iter().map(|t| (*t).to_string()).collect(),
        force,
        source: None,
    }
}

#[test]
fn parses_generate_targets() {
    let cli = Cli::try_parse_from([
        "excel-decoder",
        "generate",
        "--target",
        "AvatarExcelConfigData",
        "--target",
        "WeaponExcelConfigData",
        "--force",
    ])
    .unwrap();
    let Command::Generate(args) = cli.command else {
        panic!("expected generate");
    };
    assert_eq!(
        args.targets,
        vec!["AvatarExcelConfigData", "WeaponExcelConfigData"]
    );
    assert!(args.force);
    assert!(args.source.is_none());
}

#[test]
fn parses_decode_with_global_flags() {
    let cli = Cli::try_parse_from([
        "excel-decoder",
        "decode",
        "--dataset",
        "AvatarExcelConfigData",
        "--accept-partial",
        "--log-format",
        "json",
        "--config",
        "custom.toml",
    ])
    .unwrap();
    assert!(matches!(cli.log_format, LogFormatArg::Json));
    assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    let Command::Decode(args) = cli.command else {
        panic!("expected decode");
    };
    assert_eq!(args.dataset.as_deref(), Some("AvatarExcelConfigData"));
    assert!(args.accept_partial);
    assert!(!args.json);
}

#[test]
fn rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["excel-decoder", "export"]).is_err());
}

#[test]
fn generate_skips_existing_masters_unless_forced() {
    let fx = fixture();
    let anchors = resolve_anchors(&fx.config, None).unwrap();

    let first = run_generate(&fx.config, &anchors, &generate(&[], false)).unwrap();
    assert_eq!(first.lines.len(), 1);
    assert!(matches!(
        first.lines[0].status,
        GenerateStatus::Written {
            fields: 4,
            required: 4,
            ..
        }
    ));

    let second = run_generate(&fx.config, &anchors, &generate(&[], false)).unwrap();
    assert!(matches!(
        second.lines[0].status,
        GenerateStatus::Skipped { .. }
    ));
    assert!(!second.has_failures());

    let forced = run_generate(
        &fx.config,
        &anchors,
        &generate(&["AvatarExcelConfigData"], true),
    )
    .unwrap();
    assert!(matches!(
        forced.lines[0].status,
        GenerateStatus::Written { .. }
    ));
}

#[test]
fn generate_reports_missing_target_and_continues() {
    let fx = fixture();
    let anchors = resolve_anchors(&fx.config, None).unwrap();
    let report = run_generate(
        &fx.config,
        &anchors,
        &generate(&["MissingExcelConfigData", "AvatarExcelConfigData"], false),
    )
    .unwrap();
    assert!(report.has_failures());
    assert_eq!(report.lines[0].dataset, "MissingExcelConfigData");
    assert!(matches!(
        report.lines[0].status,
        GenerateStatus::Failed { .. }
    ));
    assert!(matches!(
        report.lines[1].status,
        GenerateStatus::Written { .. }
    ));
}

#[test]
fn decode_after_generate_loads_every_dataset() {
    let fx = fixture();
    let anchors = resolve_anchors(&fx.config, None).unwrap();
    run_generate(&fx.config, &anchors, &generate(&[], false)).unwrap();

    let args = DecodeArgs {
        dataset: None,
        accept_partial: false,
        json: true,
    };
    let report = run_decode(&fx.config, &anchors, &args).unwrap();
    assert!(!report.has_failures());
    match report.outcome("AvatarExcelConfigData") {
        Some(LoadStatus::Loaded {
            records,
            confidence,
            ..
        }) => {
            assert_eq!(*records, 4);
            assert!((confidence - 1.0).abs() < 1e-9);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let summaries = decode_summaries(&report);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, "loaded");
    assert_eq!(summaries[0].records, Some(4));
}

#[test]
fn datasets_lists_generated_masters() {
    let fx = fixture();
    assert!(run_datasets(&fx.config).unwrap().is_empty());

    let anchors = resolve_anchors(&fx.config, None).unwrap();
    run_generate(&fx.config, &anchors, &generate(&[], false)).unwrap();
    let listings = run_datasets(&fx.config).unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].dataset, "AvatarExcelConfigData");
    assert_eq!(listings[0].fields, Some(4));
    assert_eq!(listings[0].strategy, "filtered_direct");
}

#[test]
fn extra_anchor_file_is_appended() {
    let fx = fixture();
    let dir = tempdir().unwrap();
    let path = dir.path().join("anchors.toml");
    fs::write(
        &path,
        r#"
[[anchors.ReliquaryExcelConfigData]]
field = "id"
expected = 21000
locate = { by = "value", value = "UI_RelicIcon_10001_4" }
"#,
    )
    .unwrap();
    let table = resolve_anchors(&fx.config, Some(&path)).unwrap();
    assert_eq!(table.for_dataset("ReliquaryExcelConfigData").len(), 1);
    assert!(!table.for_dataset("AvatarExcelConfigData").is_empty());

    let missing = resolve_anchors(&fx.config, Some(&dir.path().join("none.toml")));
    assert!(missing.is_err());
}

#[test]
fn summary_lines_name_the_dataset() {
    let skipped = GenerateLine {
        dataset: "WeaponExcelConfigData".to_string(),
        status: GenerateStatus::Skipped {
            path: PathBuf::from("masterFiles/WeaponExcelConfigData.master.json"),
        },
    };
    insta::assert_snapshot!(
        generate_line(&skipped),
        @"skipped  WeaponExcelConfigData: masterFiles/WeaponExcelConfigData.master.json exists (use --force to overwrite)"
    );

    let failed = GenerateLine {
        dataset: "MissingExcelConfigData".to_string(),
        status: GenerateStatus::Failed {
            message: "dump not found".to_string(),
        },
    };
    assert_eq!(
        generate_line(&failed),
        "failed   MissingExcelConfigData: dump not found"
    );
}

#[test]
fn confidence_colors_follow_configured_thresholds() {
    let defaults = ConfidenceThresholds::default();
    assert_eq!(confidence_color(0.85, &defaults), Color::Green);
    assert_eq!(confidence_color(0.8, &defaults), Color::Green);
    assert_eq!(confidence_color(0.5, &defaults), Color::Yellow);
    assert_eq!(confidence_color(0.49, &defaults), Color::Red);

    let strict = ConfidenceThresholds::new(0.9, 0.6);
    assert_eq!(confidence_color(0.85, &strict), Color::Yellow);
    assert_eq!(confidence_color(0.55, &strict), Color::Red);
    assert_eq!(confidence_color(0.9, &strict), Color::Green);
}
