// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use digipop_source::{LoadOutcome, Loader};
use digipop_tui::AppOptions;
use runtime::LoaderRuntime;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `digipop --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let loader = build_loader(&options, &config).with_context(|| {
        format!(
            "invalid [dataset] config in {}; fix url/path/timeout/headers values",
            options.config_path.display()
        )
    })?;
    let app_options = AppOptions {
        trigger: config.trigger(),
        anchor: config.commit_anchor(),
        style: config.popup_style()?,
    };

    let log_path = config.log_path()?;
    let _log_guard = logging::init(&log_path, &logging::filter_directive(config.log_level()))?;
    info!(
        config = %options.config_path.display(),
        dataset = %loader.describe(),
        anchor = app_options.anchor.as_str(),
        "starting digipop"
    );

    if options.check_only {
        let outcome = loader
            .load_outcome()
            .with_context(|| format!("load dataset from {}", loader.describe()))?;
        println!("{}", check_summary(&loader, &outcome, &log_path));
        return Ok(());
    }

    let mut runtime = LoaderRuntime::new(loader);
    digipop_tui::run_app(app_options, &mut runtime)
}

fn check_summary(loader: &Loader, outcome: &LoadOutcome, log_path: &Path) -> String {
    let mut summary = format!(
        "config ok; {} records from {}",
        outcome.dataset.len(),
        loader.describe()
    );
    if outcome.skipped > 0 {
        summary.push_str(&format!(
            "; skipped {} malformed rows (details in {})",
            outcome.skipped,
            log_path.display()
        ));
    }
    summary
}

/// `--demo` beats `--dataset`, which beats the config file. With none of
/// them the app starts with an empty dataset.
fn build_loader(options: &CliOptions, config: &Config) -> Result<Loader> {
    if options.demo {
        return Ok(Loader::demo());
    }
    let location = options
        .dataset
        .as_deref()
        .or_else(|| config.dataset_location());
    match location {
        Some(location) => Loader::from_location(
            location,
            config.dataset_timeout()?,
            &config.dataset_headers(),
        ),
        None => Ok(Loader::empty()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    dataset: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        dataset: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--dataset" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--dataset requires a URL or file path"))?;
                options.dataset = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("digipop: numeric id suggestions for tagged text fields");
    println!("  --config <path>          Use a specific config path");
    println!("  --dataset <url|path>     Load records from this URL or JSON file");
    println!("  --demo                   Use the built-in demo records");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and load the dataset once");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, build_loader, check_summary, parse_cli_args};
    use crate::config::Config;
    use anyhow::Result;
    use digipop_source::Loader;
    use digipop_testkit::temp_json_path;
    use std::path::{Path, PathBuf};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/digipop-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                dataset: None,
                print_config_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_dataset_overrides() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--dataset",
                "https://inventory.example/parts.json",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(
            options.dataset.as_deref(),
            Some("https://inventory.example/parts.json")
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--dataset"], default_options_path())
            .expect_err("missing dataset value should fail");
        assert!(error.to_string().contains("--dataset requires"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_demo_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--demo",
                "--check",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.demo);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn loader_prefers_demo_then_flag_then_config() -> Result<()> {
        let mut config = Config::default();
        config.dataset.path = Some("/from/config.json".to_owned());

        let demo = parse_cli_args(
            vec!["--demo", "--dataset", "/from/flag.json"],
            default_options_path(),
        )?;
        assert_eq!(
            build_loader(&demo, &config)?.describe(),
            "built-in demo records"
        );

        let flag = parse_cli_args(vec!["--dataset", "/from/flag.json"], default_options_path())?;
        assert_eq!(build_loader(&flag, &config)?.describe(), "/from/flag.json");

        let plain = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            build_loader(&plain, &config)?.describe(),
            "/from/config.json"
        );

        config.dataset.path = None;
        assert!(build_loader(&plain, &config)?.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn loader_rejects_bad_dataset_flag_url() -> Result<()> {
        let options = parse_cli_args(vec!["--dataset", "http://"], default_options_path())?;
        let error =
            build_loader(&options, &Config::default()).expect_err("empty host should fail");
        assert!(error.to_string().contains("invalid dataset url"));
        Ok(())
    }

    #[test]
    fn check_summary_reports_skipped_rows() -> Result<()> {
        let (_dir, path) = temp_json_path(r#"[{"id":12,"title":"B"},{"title":"no id"},{"id":"x"}]"#)?;
        let loader = Loader::file(&path);
        let log_path = Path::new("/tmp/digipop.log");

        let summary = check_summary(&loader, &loader.load_outcome()?, log_path);
        assert!(summary.contains("1 records"));
        assert!(summary.contains("skipped 2 malformed rows"));
        assert!(summary.contains("/tmp/digipop.log"));

        let demo = Loader::demo();
        let clean = check_summary(&demo, &demo.load_outcome()?, log_path);
        assert!(!clean.contains("skipped"));
        Ok(())
    }
}
