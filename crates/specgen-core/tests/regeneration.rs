//! End-to-end regeneration against real directories

use pretty_assertions::assert_eq;
use specgen_core::prelude::*;
use specgen_core::{ConfigError, GeneratorConfig as Config};
use specgen_protocol::ClientError;
use specgen_test_utils::{
    blank_named, checkout, entry_names, login_flow, snapshot, EngineScript, FakeEngine,
    InMemorySource,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Project {
    _dir: tempfile::TempDir,
    file: PathBuf,
    output: PathBuf,
}

fn project() -> Project {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("App.csproj");
    std::fs::write(&file, "<Project />").unwrap();
    let output = dir.path().join("GeneratedSpecs");
    Project {
        _dir: dir,
        file,
        output,
    }
}

fn seed_stale_output(output: &Path) {
    std::fs::create_dir_all(output.join("nested")).unwrap();
    std::fs::write(output.join("Stale.cs"), "// stale").unwrap();
    std::fs::write(output.join("nested/Older.cs"), "// older").unwrap();
}

fn generator(source: InMemorySource, config: &Config) -> Generator {
    Generator::new(Arc::new(source), config.coordinator())
}

#[tokio::test]
async fn login_flow_generates_one_class() {
    let project = project();
    let generator = generator(InMemorySource::new(vec![login_flow()]), &Config::default());

    let output = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output, project.output);
    assert_eq!(entry_names(&output), ["LoginFlow.cs"]);

    let text = std::fs::read_to_string(output.join("LoginFlow.cs")).unwrap();
    assert!(text.contains("namespace Specs.Generated"));
    assert!(text.contains("using Specgen.Runner;"));
    assert!(text.contains("public class LoginFlow"));
    assert!(text.contains("[Xunit.FactAttribute()]\n        public void Validlogin()"));
    assert!(text.contains("[Xunit.FactAttribute()]\n        public void Invalidpassword()"));
    assert!(text.find("Validlogin").unwrap() < text.find("Invalidpassword").unwrap());
}

#[tokio::test]
async fn empty_engine_leaves_empty_existing_directory() {
    let project = project();
    seed_stale_output(&project.output);
    let generator = generator(InMemorySource::new(vec![]), &Config::default());

    let output = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap();

    assert!(output.is_dir());
    assert!(entry_names(&output).is_empty());
}

#[tokio::test]
async fn protocol_error_keeps_previous_output() {
    let project = project();
    seed_stale_output(&project.output);
    let source = InMemorySource::protocol_error("expected AllSpecsResponse, got Unknown");
    let generator = generator(source, &Config::default());

    let err = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GeneratorError::Fetch(ClientError::Protocol(_))));
    assert_eq!(entry_names(&project.output), ["Stale.cs", "nested"]);
}

#[tokio::test]
async fn failing_specification_leaves_directory_empty_in_place() {
    let project = project();
    seed_stale_output(&project.output);
    let generator = generator(
        InMemorySource::new(vec![login_flow(), blank_named(), checkout()]),
        &Config::default(),
    );

    let err = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        GeneratorError::Write(WriteError::Synthesis { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].index, 1);
            assert_eq!(failures[0].error.parameter(), Some("specification"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(project.output.is_dir());
    assert!(entry_names(&project.output).is_empty());
}

#[tokio::test]
async fn failing_specification_keeps_output_when_staged() {
    let project = project();
    seed_stale_output(&project.output);
    let config = Config::default().with_output_mode(OutputMode::Staged);
    let generator = generator(
        InMemorySource::new(vec![login_flow(), blank_named()]),
        &config,
    );

    let err = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GeneratorError::Write(WriteError::Synthesis { .. })));
    assert_eq!(entry_names(&project.output), ["Stale.cs", "nested"]);
    assert_eq!(entry_names(project.file.parent().unwrap()), ["App.csproj", "GeneratedSpecs"]);
}

#[tokio::test]
async fn staged_success_replaces_output() {
    let project = project();
    seed_stale_output(&project.output);
    let config = Config::default().with_output_mode(OutputMode::Staged);
    let generator = generator(InMemorySource::new(vec![login_flow(), checkout()]), &config);

    generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entry_names(&project.output), ["CheckoutBasket.cs", "LoginFlow.cs"]);
    assert_eq!(entry_names(project.file.parent().unwrap()), ["App.csproj", "GeneratedSpecs"]);
}

#[tokio::test]
async fn regeneration_is_idempotent() {
    let project = project();
    let generator = generator(
        InMemorySource::new(vec![login_flow(), checkout()]),
        &Config::default(),
    );
    let cancel = CancellationToken::new();

    generator.create_or_update(&project.file, &cancel).await.unwrap();
    let first = snapshot(&project.output);
    generator.create_or_update(&project.file, &cancel).await.unwrap();
    let second = snapshot(&project.output);

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn framework_selection_changes_attribute() {
    let project = project();
    let config = Config::default().with_framework(specgen_synth::TestFramework::NUnit);
    let generator = generator(InMemorySource::new(vec![login_flow()]), &config);

    let output = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap();

    let text = std::fs::read_to_string(output.join("LoginFlow.cs")).unwrap();
    assert!(text.contains("[NUnit.Framework.TestAttribute()]"));
    assert!(!text.contains("Xunit"));
}

#[tokio::test]
async fn cancelled_run_deletes_nothing() {
    let project = project();
    seed_stale_output(&project.output);
    let source = InMemorySource::new(vec![login_flow()]);
    let generator = generator(source.clone(), &Config::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = generator.create_or_update(&project.file, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(source.calls(), 1);
    assert_eq!(entry_names(&project.output), ["Stale.cs", "nested"]);
}

#[tokio::test]
async fn connects_to_engine_over_tcp() {
    let engine = FakeEngine::start(EngineScript::Specs(vec![login_flow()]))
        .await
        .unwrap();
    let project = project();
    let config = Config::default().with_engine_address(engine.addr().to_string());

    let generator = Generator::connect(&config).await.unwrap();
    let output = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entry_names(&output), ["LoginFlow.cs"]);
    assert_eq!(engine.requests().len(), 1);
}

#[tokio::test]
async fn engine_wrong_type_over_tcp_keeps_output() {
    let engine = FakeEngine::start(EngineScript::WrongType).await.unwrap();
    let project = project();
    seed_stale_output(&project.output);
    let config = Config::default().with_engine_address(engine.addr().to_string());

    let generator = Generator::connect(&config).await.unwrap();
    let err = generator
        .create_or_update(&project.file, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GeneratorError::Fetch(ClientError::Protocol(_))));
    assert_eq!(entry_names(&project.output), ["Stale.cs", "nested"]);
}

#[test]
fn config_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("specgen.toml");
    std::fs::write(&path, "[output]\ndirectory_name = \"Specs\"\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.output.directory_name, "Specs");

    let missing = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Read { .. }));
}

#[tokio::test]
async fn mistyped_project_path_creates_nothing() {
    let project = project();
    let typo = project.file.with_file_name("Ap.csproj");
    let generator = generator(InMemorySource::new(vec![login_flow()]), &Config::default());

    let err = generator
        .create_or_update(&typo, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GeneratorError::Write(WriteError::Argument { parameter: "project_path", .. })
    ));
    assert_eq!(entry_names(project.file.parent().unwrap()), ["App.csproj"]);
}

#[test]
fn parent_directory_name_is_rejected_before_any_io() {
    let err = Config::from_toml_str("[output]\ndirectory_name = \"..\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "output.directory_name", .. }));
}
