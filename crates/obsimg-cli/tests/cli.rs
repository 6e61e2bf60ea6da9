//! Integration tests for the obsimg CLI.

use std::process::{Command, Output};

use mockito::{Mock, Server, ServerGuard};
use tempfile::TempDir;

const IMAGE: &str = "Leap.x86_64-15.6.0-Build3.1.raw.xz";
const MANIFEST: &str = "\
bash||5.2.15|150500.2.1|x86_64||GPL-3.0-or-later
busybox||1.36.1|150600.1.2|x86_64||GPL-2.0-or-later
zlib-devel||1.2.13|150500.4.3|x86_64||Zlib
";

/// Isolated home plus a mock build service.
struct TestContext {
    home: TempDir,
    server: ServerGuard,
    _mocks: Vec<Mock>,
}

impl TestContext {
    fn new() -> Self {
        let mut server = Server::new();
        let mocks = vec![
            server
                .mock("GET", "/images/")
                .with_body(format!("<a href=\"{IMAGE}\">{IMAGE}</a>\n"))
                .create(),
            server
                .mock("GET", "/images/Leap.x86_64-15.6.0-Build3.1.packages")
                .with_body(MANIFEST)
                .create(),
        ];
        Self {
            home: TempDir::new().expect("failed to create temp dir"),
            server,
            _mocks: mocks,
        }
    }

    fn cmd(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_obs-img"));
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env_remove("RUST_LOG")
            .args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        let url = format!("{}/images", self.server.url());
        let dir = self.home.path().join("downloads");
        let dir = dir.to_str().expect("utf-8 temp path").to_string();

        let mut full: Vec<&str> = args.to_vec();
        full.extend([
            "--image-name",
            "Leap",
            "--download-url",
            url.as_str(),
            "--download-dir",
            dir.as_str(),
            "--no-color",
        ]);
        self.cmd(&full).output().expect("failed to run obs-img")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn license_flag_prints_license() {
    let ctx = TestContext::new();
    let output = ctx.cmd(&["--license"]).output().expect("failed to run obs-img");
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "GPLv3+");
}

#[test]
fn help_lists_commands() {
    let ctx = TestContext::new();
    let output = ctx.cmd(&["--help"]).output().expect("failed to run obs-img");
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("download"));
    assert!(out.contains("packages"));
}

#[test]
fn packages_list_json_filters_by_name() {
    let ctx = TestContext::new();
    let output = ctx.run(&["packages", "list", "--json", "--name", "b*"]);
    assert!(output.status.success(), "{output:?}");

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    let names: Vec<&String> = json.as_object().expect("object").keys().collect();
    assert_eq!(names, vec!["bash", "busybox"]);
}

#[test]
fn packages_list_table_filters_by_license() {
    let ctx = TestContext::new();
    let output = ctx.run(&["packages", "list", "--license", "zlib"]);
    assert!(output.status.success(), "{output:?}");

    let out = stdout(&output);
    assert!(out.contains("zlib-devel"));
    assert!(!out.contains("bash"));
    assert!(out.contains("1 package"));
}

#[test]
fn packages_show_known_and_unknown() {
    let ctx = TestContext::new();

    let output = ctx.run(&["packages", "show", "--package-name", "bash"]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("5.2.15-150500.2.1"));

    let output = ctx.run(&["packages", "show", "--package-name", "vim"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn download_writes_image() {
    let mut ctx = TestContext::new();
    let _image = ctx
        .server
        .mock("GET", format!("/images/{IMAGE}").as_str())
        .with_body("image bytes")
        .create();

    let output = ctx.run(&["download", "--skip-verify", "--quiet"]);
    assert!(output.status.success(), "{output:?}");

    let path = ctx.home.path().join("downloads").join(IMAGE);
    assert_eq!(stdout(&output).trim(), format!("Image downloaded: {}", path.display()));
    assert_eq!(std::fs::read(&path).expect("image written"), b"image bytes");
}

#[test]
fn unmet_conditions_exit_with_status_2() {
    let ctx = TestContext::new();
    let output = ctx.run(&["download", "--condition", "bash>=6", "--conditions-wait-time", "0"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bash >= 6"));
    assert!(!ctx.home.path().join("downloads").exists());
}

#[test]
fn disallowed_package_exits_with_its_own_status() {
    let ctx = TestContext::new();
    let output = ctx.run(&["download", "--disallow-package", "*-devel"]);

    assert_eq!(output.status.code(), Some(8));
    assert!(String::from_utf8_lossy(&output.stderr).contains("zlib-devel"));
}
