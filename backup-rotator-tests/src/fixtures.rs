//! Test fixtures and sample data
//!
//! Provides run dates with known retention outcomes, config templates and
//! stand-in transfer tools.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Build a date, panicking on invalid input
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A Wednesday: only `now - 7 days` is obsolete (2024-02-28)
pub fn plain_day() -> NaiveDate {
    date(2024, 3, 6)
}

/// A Tuesday where both the monthly (2024-10-08) and yearly (2023-11-07)
/// candidates are obsolete
pub fn thinning_day() -> NaiveDate {
    date(2024, 11, 5)
}

/// Minimal valid YAML configuration; `{data}` and `{backups}` are replaced
pub fn minimal_config_yaml() -> &'static str {
    r#"
source:
  - name: data
    include:
      - "{data}/*.txt"
destination:
  - store: filesystem
    name: local
    options:
      path: "{backups}"
"#
}

/// Same configuration as [`minimal_config_yaml`] in TOML
pub fn minimal_config_toml() -> &'static str {
    r#"
[[source]]
name = "data"
include = ["{data}/*.txt"]

[[destination]]
store = "filesystem"
name = "local"

[destination.options]
path = "{backups}"
"#
}

/// Fill in a config template
pub fn render_template(template: &str, data: &Path, backups: &Path) -> String {
    template
        .replace("{data}", &data.display().to_string())
        .replace("{backups}", &backups.display().to_string())
}

/// Write an executable shell script standing in for a transfer tool.
///
/// The script appends its arguments, one per line, to `<dir>/<name>.args`
/// and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join(name);
    let log = dir.join(format!("{}.args", name));
    let body = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" >> '{}'\nexit {}\n",
        log.display(),
        exit_code
    );
    fs::write(&script, body).expect("Failed to write fake tool");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake tool executable");
    script
}

/// Arguments recorded by [`fake_tool`], one entry per line
pub fn recorded_args(dir: &Path, name: &str) -> Vec<String> {
    fs::read_to_string(dir.join(format!("{}.args", name)))
        .map(|content| content.lines().map(String::from).collect())
        .unwrap_or_default()
}
