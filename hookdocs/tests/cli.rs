use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Writes a config rooted in a fresh temporary directory.
fn workspace(extra: &str) -> (TempDir, std::path::PathBuf) {
    let root = tempdir().expect("temp dir");
    let base = root.path().display().to_string();
    let yaml = format!(
        "checkout_dir: {base}/repos\n\
         docs_dir: {base}/docs\n\
         json_dir: {base}/static/hooks\n\
         context_file: {base}/static/llms.txt\n\
         products:\n\
         \x20 - id: gravityview\n\
         \x20   repo: Org/GravityView\n\
         \x20   label: GravityView\n\
         \x20 - id: maps\n\
         \x20   repo: Org/Maps\n\
         {extra}"
    );
    let config = root.path().join("hookdocs.yaml");
    fs::write(&config, yaml).expect("write config");
    (root, config)
}

fn add_checkout(root: &Path, name: &str) {
    fs::create_dir_all(root.join("repos").join(name).join(".git")).unwrap();
}

fn hookdocs() -> Command {
    let mut cmd = Command::cargo_bin("hookdocs").expect("Binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_every_command() {
    hookdocs()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("sync")
                .and(predicate::str::contains("regenerate"))
                .and(predicate::str::contains("enhance"))
                .and(predicate::str::contains("index"))
                .and(predicate::str::contains("status")),
        );
}

#[test]
fn missing_config_file_fails() {
    let dir = tempdir().unwrap();
    hookdocs()
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .arg("enhance")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("hookdocs.yaml");
    fs::write(&config, "products:\n  - id: gv\n    repo: no-owner\n").unwrap();
    hookdocs()
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn unknown_product_is_an_error() {
    let (_root, config) = workspace("");
    hookdocs()
        .args(["regenerate", "--dry-run", "--product", "nope", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown product 'nope'"));
}

#[test]
fn dry_run_reports_paths_and_writes_nothing() {
    let (root, config) = workspace("");
    add_checkout(root.path(), "GravityView");
    add_checkout(root.path(), "Maps");

    hookdocs()
        .arg("--config")
        .arg(&config)
        .args(["regenerate", "--dry-run"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Regenerate summary")
                .and(predicate::str::contains("dry-run"))
                .and(predicate::str::contains("2 succeeded, 0 failed")),
        );
    assert!(!root.path().join("docs").exists());
}

#[test]
fn missing_extractor_stops_after_first_product() {
    let (root, config) = workspace("extractor:\n  command: hookdocs-test-no-such-extractor\n");
    add_checkout(root.path(), "GravityView");
    add_checkout(root.path(), "Maps");

    hookdocs()
        .arg("--config")
        .arg(&config)
        .arg("regenerate")
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("not found")
                .and(predicate::str::contains("0 succeeded, 1 failed, 1 skipped")),
        )
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn enhance_and_index_run_over_a_docs_tree() {
    let (root, config) = workspace("");
    let actions = root.path().join("docs/gravityview/actions");
    fs::create_dir_all(&actions).unwrap();
    fs::write(
        actions.join("gravityview_before.md"),
        "# Action: gravityview/before\n\nFires before the View is rendered.\n",
    )
    .unwrap();

    hookdocs()
        .arg("--config")
        .arg(&config)
        .arg("enhance")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Enhance summary")
                .and(predicate::str::contains("1 hooks (1 actions, 0 filters)"))
                .and(predicate::str::contains("1 usage examples added")),
        );
    assert!(root.path().join("static/hooks/hooks-compact.json").is_file());
    assert!(root.path().join("static/llms.txt").is_file());

    hookdocs()
        .arg("--config")
        .arg(&config)
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 index pages written"));
    let index = fs::read_to_string(actions.join("index.md")).unwrap();
    assert!(index.contains("**1** actions documented."));
}

#[test]
fn status_lists_each_product() {
    let (root, config) = workspace("");
    add_checkout(root.path(), "GravityView");

    hookdocs()
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("gravityview")
                .and(predicate::str::contains("branch=main"))
                .and(predicate::str::contains("checkout=missing")),
        );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use hookdocs::cli::{run, Cli, Commands};

    // A missing config file still gets past initialisation.
    let cli = Cli {
        config: std::path::PathBuf::from("dummy.yaml"),
        verbose: false,
        command: Commands::Enhance,
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
