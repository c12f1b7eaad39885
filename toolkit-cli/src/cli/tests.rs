//! Unit tests for command registration, option merging, and dispatch.

use super::test_helpers::{argv, failing, registry, stub, temp_dir};
use super::{
    CommandError, CommandRegistry, DispatchError, DispatchOutcome, Dispatcher, GlobalArgs,
    OptionConflict, RegistryError, merge_short_options, split_argv,
};
use crate::logging::{LogLevel, LoggingConfig};

use std::fs;

use clap::error::ErrorKind;
use rstest::rstest;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

use toolkit_test_support::tracing::RecordingLayer;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[rstest]
fn builtin_short_options_merge_cleanly() -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let table = merge_short_options(registry.specs())?;
    assert_eq!(table.flag_for("input-file"), Some('i'));
    assert_eq!(table.flag_for("output-file"), Some('o'));
    assert_eq!(table.flag_for("snakemake-log"), Some('s'));
    assert_eq!(table.flag_for("overwrite"), None);
    Ok(())
}

#[rstest]
fn identical_requests_from_several_commands_merge_once() -> TestResult {
    let specs = [stub("one", &[("name", 'n')]), stub("two", &[("name", 'n')])];
    let table = merge_short_options(&specs)?;
    assert_eq!(table.iter().collect::<Vec<_>>(), vec![("name", 'n')]);
    Ok(())
}

#[rstest]
fn parameter_with_two_flags_is_rejected() {
    let specs = [stub("one", &[("name", 'n')]), stub("two", &[("name", 'm')])];
    let err = merge_short_options(&specs).expect_err("conflicting flags must fail");
    assert_eq!(
        err,
        OptionConflict::ParameterShortOptions {
            param: "name".to_owned(),
            first: 'n',
            second: 'm',
        }
    );
    assert_eq!(
        err.to_string(),
        "Parameter 'name' defined with different short options: 'n' and 'm'"
    );
}

#[rstest]
fn flag_claimed_by_two_parameters_is_rejected() {
    let specs = [stub("one", &[("name", 'n')]), stub("two", &[("verbose", 'n')])];
    let err = merge_short_options(&specs).expect_err("shared flag must fail");
    assert_eq!(
        err,
        OptionConflict::ShortOptionParameters {
            flag: 'n',
            first: "name".to_owned(),
            second: "verbose".to_owned(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Short option 'n' used for multiple parameters: 'name' and 'verbose'"
    );
}

#[rstest]
#[case::empty(Vec::new(), RegistryError::Empty)]
#[case::duplicate(
    vec![stub("dup", &[]), stub("other", &[]), stub("dup", &[])],
    RegistryError::DuplicateName { name: "dup" }
)]
fn invalid_registries_are_rejected(
    #[case] specs: Vec<super::CommandSpec>,
    #[case] expected: RegistryError,
) {
    let err = CommandRegistry::new(specs).expect_err("registry must be rejected");
    assert_eq!(err, expected);
}

#[rstest]
fn registry_doc_lists_commands_in_order() -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, vec!["example", "summarize-errors"]);
    assert!(
        registry
            .doc()
            .starts_with("* example\tDo an awesome thing.\n* summarize-errors\t")
    );
    Ok(())
}

#[rstest]
fn split_separates_global_and_command_segments() -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let argv = argv(&[
        "toolkit",
        "--log-level",
        "DEBUG",
        "example",
        "-i",
        "in.txt",
        "-o",
        "out.txt",
    ]);
    let split = split_argv(&argv, &registry);
    assert_eq!(split.program, "toolkit");
    assert_eq!(split.global, ["--log-level", "DEBUG"]);
    assert_eq!(
        split.command,
        Some(&["example", "-i", "in.txt", "-o", "out.txt"].map(str::to_owned)[..])
    );
    Ok(())
}

#[rstest]
#[case::no_command(&["toolkit", "--no-log"], &["--no-log"])]
#[case::program_only(&["toolkit"], &[])]
fn split_without_command_keeps_everything_global(
    #[case] tokens: &[&str],
    #[case] expected_global: &[&str],
) -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let argv = argv(tokens);
    let split = split_argv(&argv, &registry);
    assert_eq!(split.global, expected_global);
    assert!(split.command.is_none());
    Ok(())
}

#[rstest]
fn command_name_as_option_value_is_taken_as_command() -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let argv = argv(&["toolkit", "--log-file", "example", "summarize-errors"]);
    let split = split_argv(&argv, &registry);
    assert_eq!(split.global, ["--log-file"]);
    assert_eq!(
        split.command.and_then(<[String]>::first).map(String::as_str),
        Some("example")
    );
    Ok(())
}

#[rstest]
#[case::defaults(&[], LoggingConfig::new(LogLevel::Info), false)]
#[case::level(&["--log-level", "warning"], LoggingConfig::new(LogLevel::Warning), false)]
#[case::no_log(&["--no-log", "--log-level", "DEBUG"], LoggingConfig::errors_only(), false)]
#[case::file(
    &["--log-file", "run.log", "--overwrite"],
    LoggingConfig::new(LogLevel::Info).with_file("run.log", true),
    true
)]
fn global_options_map_to_logging_config(
    #[case] tokens: &[&str],
    #[case] expected: LoggingConfig,
    #[case] overwrite: bool,
) -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let args = std::iter::once("toolkit")
        .chain(tokens.iter().copied())
        .chain(std::iter::once("example"));
    let globals = GlobalArgs::parse_with_registry(&registry, args)?;
    assert_eq!(globals.logging_config(), expected);
    assert_eq!(globals.common_options().overwrite, overwrite);
    Ok(())
}

#[rstest]
fn global_help_lists_registered_commands() -> TestResult {
    let registry = CommandRegistry::builtin()?;
    let err = GlobalArgs::parse_with_registry(&registry, ["toolkit", "--help", "example"])
        .expect_err("help must short-circuit parsing");
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    let rendered = err.to_string();
    assert!(rendered.contains("* example\tDo an awesome thing."));
    assert!(rendered.contains("* summarize-errors\t"));
    Ok(())
}

#[rstest]
fn unknown_global_option_is_a_usage_error() -> TestResult {
    let dispatcher = Dispatcher::new(CommandRegistry::builtin()?);
    let err = dispatcher
        .dispatch(&argv(&["toolkit", "--bogus", "example"]))
        .expect_err("unknown option must fail");
    assert!(
        matches!(err, DispatchError::Usage(ref usage) if usage.kind() == ErrorKind::UnknownArgument)
    );
    Ok(())
}

#[rstest]
fn command_help_is_reported_as_display_help() -> TestResult {
    let dispatcher = Dispatcher::new(CommandRegistry::builtin()?);
    let err = dispatcher
        .dispatch(&argv(&["toolkit", "--no-log", "example", "--help"]))
        .expect_err("help must short-circuit dispatch");
    match err {
        DispatchError::Usage(usage) => {
            assert_eq!(usage.kind(), ErrorKind::DisplayHelp);
            let rendered = usage.to_string();
            assert!(rendered.contains("-i, --input-file"));
            assert!(rendered.contains("-o, --output-file"));
            assert!(rendered.contains("Do an awesome thing."));
            assert!(!rendered.contains("Arguments accepted"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[rstest]
fn boolean_flags_have_no_negated_form() {
    let dispatcher = Dispatcher::new(registry(vec![stub("stub", &[])]));
    let err = dispatcher
        .dispatch(&argv(&["toolkit", "--no-log", "stub", "--no-verbose"]))
        .expect_err("negated flags are not generated");
    assert!(matches!(err, DispatchError::Usage(_)));
}

#[rstest]
fn global_only_invocation_runs_nothing() -> TestResult {
    let dispatcher = Dispatcher::new(CommandRegistry::builtin()?);
    let outcome = dispatcher.dispatch(&argv(&["toolkit", "--no-log"]))?;
    assert_eq!(outcome, DispatchOutcome::GlobalOnly);
    Ok(())
}

#[rstest]
fn conflicting_registry_fails_before_running_command() {
    let dispatcher = Dispatcher::new(registry(vec![
        stub("one", &[("name", 'n')]),
        stub("two", &[("verbose", 'n')]),
    ]));
    let err = dispatcher
        .dispatch(&argv(&["toolkit", "--no-log", "one", "--name", "x"]))
        .expect_err("conflict must fail");
    assert!(matches!(
        err,
        DispatchError::Conflict(OptionConflict::ShortOptionParameters { flag: 'n', .. })
    ));
}

#[rstest]
fn merged_short_option_applies_to_every_command() -> TestResult {
    let dispatcher = Dispatcher::new(registry(vec![
        stub("one", &[("name", 'n')]),
        stub("two", &[]),
    ]));
    let outcome = dispatcher.dispatch(&argv(&["toolkit", "--no-log", "two", "-n", "x"]))?;
    assert_eq!(outcome, DispatchOutcome::Completed { command: "two" });
    Ok(())
}

#[rstest]
fn successful_dispatch_logs_start_and_finish() -> TestResult {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let dispatcher = Dispatcher::new(registry(vec![stub("stub", &[])]));
    let argv = argv(&["toolkit", "stub", "--name", "value"]);

    let outcome = tracing::subscriber::with_default(subscriber, || dispatcher.dispatch(&argv))?;

    assert_eq!(outcome, DispatchOutcome::Completed { command: "stub" });
    let info = layer.messages_at(Level::INFO);
    assert!(info.contains(&"Executing: toolkit stub --name value".to_owned()));
    assert!(info.contains(&"Finished executing successfully.".to_owned()));
    Ok(())
}

#[rstest]
fn failing_command_is_logged_as_critical() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let dispatcher = Dispatcher::new(registry(vec![failing("boom")]));
    let argv = argv(&["toolkit", "--no-log", "boom"]);

    let err = tracing::subscriber::with_default(subscriber, || dispatcher.dispatch(&argv))
        .expect_err("command must fail");

    assert!(matches!(
        err,
        DispatchError::Command {
            command: "boom",
            source: CommandError::Report { .. },
        }
    ));
    let critical: Vec<_> = layer
        .events()
        .into_iter()
        .filter(|event| event.fields.get("severity").map(String::as_str) == Some("critical"))
        .collect();
    assert_eq!(critical.len(), 1);
    let event = critical.first().expect("critical event recorded");
    assert_eq!(event.level, Level::ERROR);
    assert_eq!(event.fields.get("message").map(String::as_str), Some("Execution failed"));
    assert!(
        event
            .fields
            .get("error")
            .is_some_and(|error| error.contains("deliberate failure"))
    );
    let finished = "Finished executing successfully.".to_owned();
    assert!(!layer.messages_at(Level::INFO).contains(&finished));
}

#[rstest]
fn example_command_refuses_existing_output_without_overwrite() -> TestResult {
    let dir = temp_dir();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "fresh")?;
    fs::write(&output, "existing")?;
    let dispatcher = Dispatcher::new(CommandRegistry::builtin()?);
    let tokens = [
        "toolkit",
        "--no-log",
        "example",
        "-i",
        input.to_str().ok_or("non-UTF-8 temp path")?,
        "-o",
        output.to_str().ok_or("non-UTF-8 temp path")?,
    ];

    let err = dispatcher
        .dispatch(&argv(&tokens))
        .expect_err("existing output must be kept");
    assert!(matches!(
        err,
        DispatchError::Command {
            source: CommandError::OutputExists { .. },
            ..
        }
    ));
    assert_eq!(fs::read_to_string(&output)?, "existing");
    Ok(())
}

#[rstest]
fn command_failure_is_reported_once() -> TestResult {
    let dir = temp_dir();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "fresh")?;
    fs::write(&output, "existing")?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let dispatcher = Dispatcher::new(CommandRegistry::builtin()?);
    let tokens = [
        "toolkit",
        "--no-log",
        "example",
        "-i",
        input.to_str().ok_or("non-UTF-8 temp path")?,
        "-o",
        output.to_str().ok_or("non-UTF-8 temp path")?,
    ];
    let argv = argv(&tokens);

    let result = tracing::subscriber::with_default(subscriber, || dispatcher.dispatch(&argv));

    assert!(result.is_err());
    let errors: Vec<_> = layer
        .events()
        .into_iter()
        .filter(|event| event.level == Level::ERROR)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors
            .first()
            .and_then(|event| event.fields.get("message"))
            .map(String::as_str),
        Some("Execution failed")
    );
    Ok(())
}
