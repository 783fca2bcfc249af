#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn scute() -> Command {
    Command::cargo_bin("scute").unwrap()
}

struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        for dir in ["app", "platform", "buildpacks", "layers"] {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        Self { root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn buildpack(&self, id: &str, version: &str, detect: &str, build: &str) {
        let dir = self.path("buildpacks").join(id).join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("buildpack.toml"),
            format!("[buildpack]\nid = \"{id}\"\nversion = \"{version}\"\nname = \"{id}\"\n"),
        )
        .unwrap();
        write_script(&dir.join("bin").join("detect"), detect);
        write_script(&dir.join("bin").join("build"), build);
    }

    fn write_order(&self, content: &str) -> PathBuf {
        let path = self.path("order.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn detect_cmd(&self) -> Command {
        let mut cmd = scute();
        cmd.arg("detect")
            .arg("--buildpacks")
            .arg(self.path("buildpacks"))
            .arg("--order")
            .arg(self.path("order.toml"))
            .arg("--group")
            .arg(self.path("group.toml"))
            .arg("--plan")
            .arg(self.path("plan.toml"))
            .arg("--app")
            .arg(self.path("app"))
            .arg("--platform")
            .arg(self.path("platform"));
        cmd
    }

    fn build_cmd(&self) -> Command {
        let mut cmd = scute();
        cmd.arg("build")
            .arg("--layers")
            .arg(self.path("layers"))
            .arg("--buildpacks")
            .arg(self.path("buildpacks"))
            .arg("--group")
            .arg(self.path("group.toml"))
            .arg("--plan")
            .arg(self.path("plan.toml"))
            .arg("--app")
            .arg(self.path("app"))
            .arg("--platform")
            .arg(self.path("platform"));
        cmd
    }
}

fn write_script(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

const ORDER_A: &str = "[[order]]\n  [[order.group]]\n  id = \"A\"\n  version = \"v1\"\n";

#[test]
fn help_exits_successfully() {
    scute().arg("--help").assert().success();
}

#[test]
fn unknown_flags_exit_with_invalid_args() {
    scute().arg("detect").arg("--no-such-flag").assert().code(3);
}

#[test]
fn missing_subcommand_exits_with_invalid_args() {
    scute().assert().code(3);
}

#[test]
fn detect_writes_group_and_plan() {
    let fx = Fixture::new();
    fx.buildpack("A", "v1", "#!/bin/sh\nexit 0\n", "#!/bin/sh\nexit 0\n");
    fx.write_order(ORDER_A);

    fx.detect_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("======== Results ========"))
        .stdout(predicate::str::contains("pass: A@v1"))
        .stdout(predicate::str::contains("Success! (1)"));

    let group = fs::read_to_string(fx.path("group.toml")).unwrap();
    assert_eq!(group, "[[group]]\nid = \"A\"\nversion = \"v1\"\n");
    assert!(fx.path("plan.toml").is_file());
}

#[test]
fn detect_without_a_viable_group_exits_six() {
    let fx = Fixture::new();
    fx.buildpack("A", "v1", "#!/bin/sh\nexit 100\n", "#!/bin/sh\nexit 0\n");
    fx.write_order(ORDER_A);

    fx.detect_cmd()
        .assert()
        .code(6)
        .stderr(predicate::str::contains("no buildpack group passed detection"));
}

#[test]
fn detect_with_a_missing_order_file_fails() {
    let fx = Fixture::new();
    fx.buildpack("A", "v1", "#!/bin/sh\nexit 0\n", "#!/bin/sh\nexit 0\n");

    fx.detect_cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("read buildpack order"));
}

#[test]
fn order_path_falls_back_to_the_environment() {
    let fx = Fixture::new();
    fx.buildpack("A", "v1", "#!/bin/sh\nexit 0\n", "#!/bin/sh\nexit 0\n");
    fx.write_order(ORDER_A);

    let mut cmd = scute();
    cmd.arg("detect")
        .arg("--buildpacks")
        .arg(fx.path("buildpacks"))
        .arg("--group")
        .arg(fx.path("group.toml"))
        .arg("--plan")
        .arg(fx.path("plan.toml"))
        .arg("--app")
        .arg(fx.path("app"))
        .arg("--platform")
        .arg(fx.path("platform"))
        .env("CNB_ORDER_PATH", fx.path("order.toml"));
    cmd.assert().success();
}

#[test]
fn build_writes_metadata() {
    let fx = Fixture::new();
    fx.buildpack(
        "A",
        "v1",
        "#!/bin/sh\nexit 0\n",
        concat!(
            "#!/bin/sh\n",
            "cat > \"$1/launch.toml\" <<'EOF'\n",
            "[[processes]]\n",
            "type = \"web\"\n",
            "command = \"start\"\n",
            "EOF\n",
        ),
    );
    fs::write(
        fx.path("group.toml"),
        "[[group]]\nid = \"A\"\nversion = \"v1\"\n",
    )
    .unwrap();
    fs::write(fx.path("plan.toml"), "").unwrap();

    fx.build_cmd().assert().success();

    let metadata =
        fs::read_to_string(fx.path("layers").join("config").join("metadata.toml")).unwrap();
    assert!(metadata.contains("buildpacks = [\"A\"]"));
    assert!(metadata.contains("type = \"web\""));
    assert!(metadata.contains("command = \"start\""));
}

#[test]
fn failing_build_exits_seven() {
    let fx = Fixture::new();
    fx.buildpack("A", "v1", "#!/bin/sh\nexit 0\n", "#!/bin/sh\nexit 1\n");
    fs::write(
        fx.path("group.toml"),
        "[[group]]\nid = \"A\"\nversion = \"v1\"\n",
    )
    .unwrap();
    fs::write(fx.path("plan.toml"), "").unwrap();

    fx.build_cmd()
        .assert()
        .code(7)
        .stderr(predicate::str::contains("build failed for A@v1"));
}
