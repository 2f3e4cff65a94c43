//! Loading buildpacks from the buildpacks root.

use std::fs;
use std::path::{Component, Path};

use serde::Deserialize;
use tracing::debug;

use super::BuildpackError;
use super::types::{Buildpack, PackFile, PackFileKind, StageCommand};
use crate::consts::PACK_CONFIG_FILE;

/// Stage commands as written in `cmds.yml`. Unknown keys are ignored and a
/// key with no value counts as missing.
#[derive(Debug, Default, Deserialize)]
struct PackConfig {
  #[serde(default)]
  bootstrap: Option<String>,
  #[serde(default)]
  build: Option<String>,
  #[serde(default)]
  test: Option<String>,
  #[serde(default)]
  run: Option<String>,
}

fn parse_config(contents: &str) -> Result<PackConfig, serde_yaml::Error> {
  if contents.trim().is_empty() {
    return Ok(PackConfig::default());
  }
  serde_yaml::from_str::<Option<PackConfig>>(contents).map(Option::unwrap_or_default)
}

/// Resolve the buildpack `name` under `root`.
///
/// Lists the immediate entries of `<root>/<name>` and reads its stage commands.
/// Never writes to the buildpack directory. `name` must be a single plain
/// component; absolute paths, separators and `..` are rejected.
pub fn resolve(root: &Path, name: &str) -> Result<Buildpack, BuildpackError> {
  if !is_plain_name(name) {
    return Err(BuildpackError::InvalidName(name.to_string()));
  }
  let dir = root.join(name);
  let files = list_files(&dir)?;

  let config_path = dir.join(PACK_CONFIG_FILE);
  let contents = fs::read_to_string(&config_path).map_err(|e| BuildpackError::ReadConfig {
    path: config_path.clone(),
    source: e,
  })?;
  let config = parse_config(&contents).map_err(|e| BuildpackError::ParseConfig {
    path: config_path,
    source: e,
  })?;

  debug!(name, dir = %dir.display(), files = files.len(), "resolved buildpack");

  Ok(Buildpack {
    name: name.to_string(),
    dir,
    files,
    bootstrap: StageCommand::new(config.bootstrap.unwrap_or_default()),
    build: StageCommand::new(config.build.unwrap_or_default()),
    test: StageCommand::new(config.test.unwrap_or_default()),
    run: StageCommand::new(config.run.unwrap_or_default()),
  })
}

fn is_plain_name(name: &str) -> bool {
  let mut components = Path::new(name).components();
  matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
    && !name.contains(['/', '\\'])
}

fn list_files(dir: &Path) -> Result<Vec<PackFile>, BuildpackError> {
  let read_error = |e| BuildpackError::ReadDir {
    path: dir.to_path_buf(),
    source: e,
  };

  let mut files = Vec::new();
  for entry in fs::read_dir(dir).map_err(read_error)? {
    let entry = entry.map_err(read_error)?;
    let metadata = entry.metadata().map_err(read_error)?;
    let file_type = metadata.file_type();

    let kind = if file_type.is_symlink() {
      PackFileKind::Symlink
    } else if file_type.is_dir() {
      PackFileKind::Dir
    } else {
      PackFileKind::File
    };

    files.push(PackFile {
      name: entry.file_name().into(),
      kind,
      len: metadata.len(),
      mode: mode_of(&metadata),
    });
  }

  files.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(files)
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> Option<u32> {
  use std::os::unix::fs::PermissionsExt;
  Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> Option<u32> {
  None
}

/// Names of the buildpacks installed under `root`, sorted.
///
/// Only directories holding a `cmds.yml` count. A missing root yields an
/// empty list.
pub fn list_buildpacks(root: &Path) -> Result<Vec<String>, BuildpackError> {
  let entries = match fs::read_dir(root) {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => {
      return Err(BuildpackError::ReadDir {
        path: root.to_path_buf(),
        source: e,
      });
    }
  };

  let mut names = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|e| BuildpackError::ReadDir {
      path: root.to_path_buf(),
      source: e,
    })?;
    let path = entry.path();
    if path.is_dir() && path.join(PACK_CONFIG_FILE).is_file() {
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
  }

  names.sort();
  Ok(names)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::buildpack::Stage;
  use tempfile::TempDir;

  fn pack(root: &Path, name: &str, config: &str, extra: &[(&str, &str)]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(PACK_CONFIG_FILE), config).unwrap();
    for (file, content) in extra {
      fs::write(dir.join(file), content).unwrap();
    }
  }

  #[test]
  fn commands_match_config() {
    let root = TempDir::new().unwrap();
    pack(
      root.path(),
      "python",
      "bootstrap: pip install -r requirements.txt\nbuild: python setup.py build\ntest: pytest -q\nrun: python app.py\n",
      &[],
    );

    let bp = resolve(root.path(), "python").unwrap();

    assert_eq!(bp.name, "python");
    assert_eq!(bp.dir, root.path().join("python"));
    assert_eq!(bp.bootstrap.as_str(), "pip install -r requirements.txt");
    assert_eq!(bp.build.as_str(), "python setup.py build");
    assert_eq!(bp.test.as_str(), "pytest -q");
    assert_eq!(bp.run.as_str(), "python app.py");
    assert_eq!(bp.command(Stage::Test).as_str(), "pytest -q");
  }

  #[test]
  fn missing_keys_default_to_empty() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "echo", "bootstrap: echo hello\n", &[]);

    let bp = resolve(root.path(), "echo").unwrap();

    assert_eq!(bp.bootstrap.as_str(), "echo hello");
    assert!(bp.build.is_empty());
    assert!(bp.test.is_empty());
    assert!(bp.run.is_empty());
  }

  #[test]
  fn null_value_counts_as_missing() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "p", "bootstrap:\ntest: make check\n", &[]);

    let bp = resolve(root.path(), "p").unwrap();
    assert!(bp.bootstrap.is_empty());
    assert_eq!(bp.test.as_str(), "make check");
  }

  #[test]
  fn unknown_keys_are_ignored() {
    let root = TempDir::new().unwrap();
    pack(
      root.path(),
      "p",
      "bootstrap: ./setup\ndeploy: ./ship\nmeta:\n  owner: team\n  tags: [a, b]\n",
      &[],
    );

    let bp = resolve(root.path(), "p").unwrap();
    assert_eq!(bp.bootstrap.as_str(), "./setup");
  }

  #[test]
  fn empty_and_comment_only_configs_are_valid() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "empty", "", &[]);
    pack(root.path(), "comments", "# nothing configured yet\n", &[]);

    for name in ["empty", "comments"] {
      let bp = resolve(root.path(), name).unwrap();
      for stage in Stage::ALL {
        assert!(bp.command(stage).is_empty(), "{} {}", name, stage);
      }
    }
  }

  #[test]
  fn files_are_listed_including_config() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "p", "run: ./start\n", &[("start", "#!/bin/sh\n"), ("Makefile", "all:\n")]);
    fs::create_dir(root.path().join("p").join("templates")).unwrap();

    let bp = resolve(root.path(), "p").unwrap();
    let names: Vec<_> = bp.files.iter().map(|f| f.name.to_string_lossy().into_owned()).collect();

    assert_eq!(names, vec!["Makefile", "cmds.yml", "start", "templates"]);
    let templates = bp.files.iter().find(|f| f.name.as_os_str() == "templates").unwrap();
    assert_eq!(templates.kind, PackFileKind::Dir);
    let start = bp.files.iter().find(|f| f.name.as_os_str() == "start").unwrap();
    assert_eq!(start.kind, PackFileKind::File);
    assert_eq!(start.len, 10);
  }

  #[test]
  fn missing_directory_fails() {
    let root = TempDir::new().unwrap();
    let result = resolve(root.path(), "absent");
    assert!(matches!(result, Err(BuildpackError::ReadDir { .. })));
  }

  #[test]
  fn missing_config_fails() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("bare")).unwrap();
    let result = resolve(root.path(), "bare");
    assert!(matches!(result, Err(BuildpackError::ReadConfig { .. })));
  }

  #[test]
  fn malformed_config_fails() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "bad", "bootstrap: [unterminated\n", &[]);
    let result = resolve(root.path(), "bad");
    assert!(matches!(result, Err(BuildpackError::ParseConfig { .. })));
  }

  #[test]
  fn scalar_config_fails() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "scalar", "just a string\n", &[]);
    let result = resolve(root.path(), "scalar");
    assert!(matches!(result, Err(BuildpackError::ParseConfig { .. })));
  }

  #[test]
  fn names_outside_the_root_are_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("packs");
    fs::create_dir(&root).unwrap();
    // A valid pack one level up that `..` or an absolute path would reach.
    pack(temp.path(), "outside", "bootstrap: echo escaped\n", &[]);
    let outside = temp.path().join("outside");

    for name in [outside.to_str().unwrap(), "..", "../outside", "nested/pack", "", "."] {
      let result = resolve(&root, name);
      assert!(
        matches!(&result, Err(BuildpackError::InvalidName(n)) if n == name),
        "{name:?} gave {result:?}"
      );
    }
  }

  #[test]
  fn resolution_does_not_modify_directory() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "p", "test: make\n", &[("a", "1")]);
    let dir = root.path().join("p");
    let before: Vec<_> = fs::read_dir(&dir)
      .unwrap()
      .map(|e| {
        let e = e.unwrap();
        (e.file_name(), e.metadata().unwrap().modified().unwrap())
      })
      .collect();

    resolve(root.path(), "p").unwrap();

    let after: Vec<_> = fs::read_dir(&dir)
      .unwrap()
      .map(|e| {
        let e = e.unwrap();
        (e.file_name(), e.metadata().unwrap().modified().unwrap())
      })
      .collect();
    assert_eq!(before, after);
  }

  #[test]
  fn lists_only_directories_with_config() {
    let root = TempDir::new().unwrap();
    pack(root.path(), "ruby", "", &[]);
    pack(root.path(), "go", "", &[]);
    fs::create_dir(root.path().join("scratch")).unwrap();
    fs::write(root.path().join("README"), "not a pack").unwrap();

    assert_eq!(list_buildpacks(root.path()).unwrap(), vec!["go", "ruby"]);
  }

  #[test]
  fn listing_missing_root_is_empty() {
    let root = TempDir::new().unwrap();
    assert!(list_buildpacks(&root.path().join("missing")).unwrap().is_empty());
  }
}
