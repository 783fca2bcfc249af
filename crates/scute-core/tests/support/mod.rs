#![allow(dead_code)]

use scute_core::DetectConfig;
use scute_schema::{escape_id, BuildpackRef, Group, Order};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// A throwaway application, platform, catalog, and layers directory, plus
/// helpers for stocking the catalog with script-backed buildpacks.
///
/// The detect scripts follow one convention, driven by files in the app
/// directory: `detect-status-<id>-<version>` (or the shared `detect-status`)
/// supplies the exit code, `detect-plan-<id>-<version>.toml` is copied to
/// the plan path, and the received `ENV_TYPE` is recorded to
/// `detect-env-type-<id>-<version>`.
pub struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        for dir in ["app", "platform/env", "buildpacks", "layers"] {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        Self { root }
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root.path().join("app")
    }

    pub fn platform_dir(&self) -> PathBuf {
        self.root.path().join("platform")
    }

    pub fn buildpacks_dir(&self) -> PathBuf {
        self.root.path().join("buildpacks")
    }

    pub fn layers_dir(&self) -> PathBuf {
        self.root.path().join("layers")
    }

    pub fn write_app_file(&self, name: &str, content: &str) {
        fs::write(self.app_dir().join(name), content).unwrap();
    }

    pub fn append_app_file(&self, name: &str, content: &str) {
        use std::io::Write as _;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.app_dir().join(name))
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    pub fn read_app_file(&self, name: &str) -> String {
        fs::read_to_string(self.app_dir().join(name)).unwrap()
    }

    pub fn app_file_exists(&self, name: &str) -> bool {
        self.app_dir().join(name).is_file()
    }

    pub fn detect_config(&self) -> DetectConfig {
        let path = std::env::var("PATH").unwrap_or_default();
        DetectConfig {
            app_dir: self.app_dir(),
            platform_dir: self.platform_dir(),
            full_env: vec![
                ("PATH".to_owned(), path.clone()),
                ("ENV_TYPE".to_owned(), "full".to_owned()),
            ],
            clear_env: vec![
                ("PATH".to_owned(), path),
                ("ENV_TYPE".to_owned(), "clear".to_owned()),
            ],
        }
    }

    pub fn buildpack(&self, id: &str, version: &str) {
        self.buildpack_opts(id, version, false);
    }

    pub fn buildpack_opts(&self, id: &str, version: &str, clear_env: bool) {
        let dir = self.buildpack_dir(id, version);
        let clear = if clear_env { "clear-env = true\n" } else { "" };
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("buildpack.toml"),
            format!(
                "[buildpack]\nid = \"{id}\"\nversion = \"{version}\"\nname = \"{id}\"\n{clear}"
            ),
        )
        .unwrap();
        write_script(&dir.join("bin").join("detect"), &detect_script(id, version));
        write_script(&dir.join("bin").join("build"), "#!/bin/sh\nexit 0\n");
    }

    /// A buildpack with the standard detect script and a custom build
    /// script. `build_body` runs with `$1` = layers dir, `$2` = platform
    /// dir, `$3` = plan path, and the app directory as the working
    /// directory.
    pub fn buildpack_with_build(&self, id: &str, version: &str, build_body: &str) {
        self.buildpack(id, version);
        let dir = self.buildpack_dir(id, version);
        write_script(
            &dir.join("bin").join("build"),
            &format!("#!/bin/sh\nset -e\n{build_body}"),
        );
    }

    pub fn meta_buildpack(&self, id: &str, version: &str, orders: &[&[(&str, &str, bool)]]) {
        let dir = self.buildpack_dir(id, version);
        fs::create_dir_all(&dir).unwrap();
        let mut content =
            format!("[buildpack]\nid = \"{id}\"\nversion = \"{version}\"\nname = \"{id}\"\n");
        for group in orders {
            content.push_str("\n[[order]]\n");
            for (gid, gver, optional) in *group {
                content.push_str(&format!(
                    "  [[order.group]]\n  id = \"{gid}\"\n  version = \"{gver}\"\n"
                ));
                if *optional {
                    content.push_str("  optional = true\n");
                }
            }
        }
        fs::write(dir.join("buildpack.toml"), content).unwrap();
    }

    fn buildpack_dir(&self, id: &str, version: &str) -> PathBuf {
        self.buildpacks_dir().join(escape_id(id)).join(version)
    }
}

pub fn order(groups: &[&[(&str, &str, bool)]]) -> Order {
    Order {
        order: groups.iter().map(|members| group(members)).collect(),
    }
}

pub fn group(members: &[(&str, &str, bool)]) -> Group {
    Group::new(
        members
            .iter()
            .map(|(id, version, optional)| {
                if *optional {
                    BuildpackRef::optional(*id, *version)
                } else {
                    BuildpackRef::new(*id, *version)
                }
            })
            .collect(),
    )
}

fn detect_script(id: &str, version: &str) -> String {
    format!(
        r#"#!/bin/sh
echo "detect out: {id}@{version}"
echo "detect err: {id}@{version}" >&2
printf "%s" "$ENV_TYPE" > "detect-env-type-{id}-{version}"
if [ -f "detect-plan-{id}-{version}.toml" ]; then
  cp "detect-plan-{id}-{version}.toml" "$2"
fi
if [ -f "detect-status-{id}-{version}" ]; then
  exit "$(cat "detect-status-{id}-{version}")"
fi
if [ -f "detect-status" ]; then
  exit "$(cat detect-status)"
fi
exit 0
"#
    )
}

fn write_script(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}
