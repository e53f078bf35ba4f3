use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(xdg_config.join("usage")).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    /// Configure a tracking id and an endpoint nothing listens on
    fn with_unreachable_endpoint(self) -> Self {
        let config = r#"
[analytics]
tracking_id = "UA-TEST-1"
application_name = "cli test"
collection_url = "http://127.0.0.1:1/collect"
"#;
        fs::write(self.xdg_config.join("usage/config.toml"), config)
            .expect("failed to write config");
        self
    }

    fn properties_path(&self, app: &str) -> PathBuf {
        self.home.join(format!(".{}", app.replace(' ', "_")))
    }

    fn read_properties(&self, app: &str) -> serde_json::Value {
        let raw = fs::read_to_string(self.properties_path(app)).expect("missing properties file");
        serde_json::from_str(&raw).expect("properties file is not JSON")
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str], lang: Option<&str>) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("usage"));
    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state);
    match lang {
        Some(lang) => command.env("LANG", lang),
        None => command.env_remove("LANG"),
    };

    command
        .output()
        .unwrap_or_else(|e| panic!("failed to execute usage: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "usage {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn props_round_trip_through_home_dotfile() {
    let env = CliTestEnv::new();

    let set = ["props", "set", "cid", "\"abc-123\""];
    let output = run_bin(&env, &set, None);
    assert_success(&set, &output);

    let get = ["props", "get", "cid"];
    let output = run_bin(&env, &get, None);
    assert_success(&get, &output);
    assert_eq!(stdout_of(&output).trim(), "\"abc-123\"");

    let raw = fs::read_to_string(env.properties_path("usage")).unwrap();
    assert_eq!(raw, "{\"cid\":\"abc-123\"}\n");

    let unset = ["props", "unset", "cid"];
    assert_success(&unset, &run_bin(&env, &unset, None));

    let output = run_bin(&env, &get, None);
    assert!(!output.status.success(), "unset property should not be found");
}

#[test]
fn props_set_falls_back_to_string() {
    let env = CliTestEnv::new();

    let args = ["props", "set", "channel", "beta build"];
    assert_success(&args, &run_bin(&env, &args, None));

    let args = ["props", "set", "launches", "3"];
    assert_success(&args, &run_bin(&env, &args, None));

    let props = env.read_properties("usage");
    assert_eq!(props["channel"], "beta build");
    assert_eq!(props["launches"], 3);
}

#[test]
fn locale_follows_lang() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["locale"], Some("en_US.UTF-8"));
    assert_success(&["locale"], &output);
    assert_eq!(stdout_of(&output).trim(), "en-us");

    let output = run_bin(&env, &["locale"], None);
    assert_success(&["locale"], &output);
    assert_eq!(stdout_of(&output).trim(), "(none)");
}

#[test]
fn user_agent_embeds_locale() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["user-agent"], Some("de_DE.UTF-8"));
    assert_success(&["user-agent"], &output);
    assert!(stdout_of(&output).trim().ends_with("; de-de)"));
}

#[test]
fn event_to_unreachable_endpoint_succeeds() {
    let env = CliTestEnv::new().with_unreachable_endpoint();

    let args = ["event", "files", "open", "--label", "csv", "--value", "2"];
    let output = run_bin(&env, &args, Some("en_US.UTF-8"));
    assert_success(&args, &output);
    assert!(stdout_of(&output).contains("Dispatched event hit to http://127.0.0.1:1/collect"));

    // The session assigned and persisted a client id on the way
    let props = env.read_properties("cli test");
    assert!(props["clientId"].as_str().is_some_and(|id| id.len() == 36));

    let args = ["exception", "boom", "--fatal"];
    assert_success(&args, &run_bin(&env, &args, None));
}

#[test]
fn sending_without_tracking_id_fails() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["screen", "home"], None);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tracking_id"), "unexpected stderr:\n{stderr}");
}

#[test]
fn disable_is_persisted_and_reported() {
    let env = CliTestEnv::new().with_unreachable_endpoint();

    assert_success(&["disable"], &run_bin(&env, &["disable"], None));
    assert_eq!(env.read_properties("cli test")["enabled"], false);

    let output = run_bin(&env, &["status"], None);
    assert_success(&["status"], &output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Usage Analytics Configuration"));
    assert!(stdout.contains("Enabled:         false"));
    assert!(stdout.contains("Status: Ready to send"));

    let output = run_bin(&env, &["screen", "home"], None);
    assert_success(&["screen", "home"], &output);
    assert!(stdout_of(&output).contains("Analytics is disabled"));

    assert_success(&["enable"], &run_bin(&env, &["enable"], None));
    assert_eq!(env.read_properties("cli test")["enabled"], true);
}

#[test]
fn dir_override_moves_properties_file() {
    let env = CliTestEnv::new();
    let elsewhere = env.home.join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();
    let dir = elsewhere.to_string_lossy().into_owned();

    let args = ["--dir", dir.as_str(), "props", "set", "k", "true"];
    assert_success(&args, &run_bin(&env, &args, None));

    assert!(elsewhere.join(".usage").exists());
    assert!(!env.properties_path("usage").exists());
}

#[test]
fn status_does_not_create_properties_file() {
    let env = CliTestEnv::new().with_unreachable_endpoint();

    let output = run_bin(&env, &["status"], None);
    assert_success(&["status"], &output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Enabled:         true"));
    assert!(stdout.contains("Client ID:       <not yet assigned>"));
    assert!(stdout.contains("Log Files:       0"));

    assert!(!env.properties_path("cli test").exists());
}

#[test]
fn props_set_null_clears_property() {
    let env = CliTestEnv::new();

    let set = ["props", "set", "k", "1"];
    assert_success(&set, &run_bin(&env, &set, None));

    let clear = ["props", "set", "k", "null"];
    assert_success(&clear, &run_bin(&env, &clear, None));
    assert_eq!(env.read_properties("usage"), serde_json::json!({}));

    let output = run_bin(&env, &["props", "get", "k"], None);
    assert!(!output.status.success(), "null should clear the property");
}
