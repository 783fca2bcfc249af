//! Environment accumulation across build steps.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Layer subdirectories that contribute to POSIX search-path variables.
pub const POSIX_BUILD_ENV: &[(&str, &[&str])] = &[
    ("bin", &["PATH"]),
    ("lib", &["LD_LIBRARY_PATH", "LIBRARY_PATH"]),
    (
        "include",
        &[
            "CPATH",
            "C_INCLUDE_PATH",
            "CPLUS_INCLUDE_PATH",
            "OBJC_INCLUDE_PATH",
        ],
    ),
    ("pkgconfig", &["PKG_CONFIG_PATH"]),
];

/// The mutable environment threaded through the build phase.
///
/// Seeded from a caller-supplied base environment; each buildpack's
/// `build = true` layers then prepend their well-known subdirectories to the
/// search-path variables and overlay the contents of their `env/` and
/// `env.build/` directories. The accumulator is an owned value, not process
/// state: nothing here touches the host environment.
#[derive(Debug, Clone, Default)]
pub struct BuildEnv {
    vars: BTreeMap<String, String>,
}

enum EnvOp<'a> {
    Override(&'a str),
    Append(&'a str),
    Prepend(&'a str),
    Default(&'a str),
}

impl BuildEnv {
    pub fn new(base: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: base.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Prepend the well-known subdirectories of a layer root to their
    /// search-path variables. Later layers end up earlier on each path.
    pub fn add_root_dir(&mut self, base: &Path) {
        for (subdir, vars) in POSIX_BUILD_ENV {
            let dir = base.join(subdir);
            if !dir.is_dir() {
                continue;
            }
            let dir = dir.to_string_lossy().into_owned();
            for var in *vars {
                self.prepend(var, &dir, ":");
            }
        }
    }

    /// Apply an `env/`-style directory of variable files.
    ///
    /// A file named `VAR` overrides the variable with its contents;
    /// `VAR.append`, `VAR.prepend`, `VAR.override`, and `VAR.default`
    /// modulate per their suffix, with `VAR.delim` supplying the joiner for
    /// append/prepend (empty when absent). A missing directory is a no-op.
    /// Files apply in name order, so behavior does not depend on directory
    /// iteration order.
    pub fn add_env_dir(&mut self, dir: &Path) -> io::Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }

        let mut files: BTreeMap<String, String> = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.insert(name, fs::read_to_string(entry.path())?);
        }

        for (name, content) in &files {
            let (var, op) = match name.rsplit_once('.') {
                Some((var, "append")) => (var, EnvOp::Append(content)),
                Some((var, "prepend")) => (var, EnvOp::Prepend(content)),
                Some((var, "override")) => (var, EnvOp::Override(content)),
                Some((var, "default")) => (var, EnvOp::Default(content)),
                Some((_, "delim")) => continue,
                _ => (name.as_str(), EnvOp::Override(content)),
            };
            let delim = files
                .get(&format!("{var}.delim"))
                .map(String::as_str)
                .unwrap_or("");

            match op {
                EnvOp::Override(value) => {
                    self.vars.insert(var.to_owned(), value.to_owned());
                }
                EnvOp::Default(value) => {
                    self.vars
                        .entry(var.to_owned())
                        .or_insert_with(|| value.to_owned());
                }
                EnvOp::Append(value) => self.append(var, value, delim),
                EnvOp::Prepend(value) => self.prepend(var, value, delim),
            }
        }
        Ok(())
    }

    fn append(&mut self, key: &str, value: &str, delim: &str) {
        match self.vars.get_mut(key) {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(delim);
                existing.push_str(value);
            }
            _ => {
                self.vars.insert(key.to_owned(), value.to_owned());
            }
        }
    }

    fn prepend(&mut self, key: &str, value: &str, delim: &str) {
        let merged = match self.vars.get(key) {
            Some(existing) if !existing.is_empty() => format!("{value}{delim}{existing}"),
            _ => value.to_owned(),
        };
        self.vars.insert(key.to_owned(), merged);
    }

    /// Iterate the accumulated variables as key/value pairs.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the environment as `KEY=VALUE` strings.
    pub fn list(&self) -> Vec<String> {
        self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}
