//! Pack metadata document loading.
//!
//! The packer stores a YAML document at `METADATA/config.yml` describing the
//! recorded runs, the software packages the traced processes touched, and the
//! remaining files that belong to no package. Two layouts exist in the wild:
//! older packs list input/output files per run, newer ones keep a top-level
//! `inputs_outputs` table that references runs by index. Both are brought to
//! the same canonical shape here.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::InspectError;
use crate::Result;
use crate::formats::open_pack;
use crate::stats::member_path;

/// Location of the metadata document inside a pack.
pub const CONFIG_MEMBER: &str = "METADATA/config.yml";

/// Oldest metadata format version understood, inclusive.
const MIN_VERSION: (u32, u32) = (0, 2);
/// First metadata format version no longer understood.
const MAX_VERSION: (u32, u32) = (2, 0);

/// Linux distribution a run was recorded on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    /// Distribution identifier, e.g. `debian`.
    pub name: String,
    /// Distribution release, e.g. `12`.
    pub version: String,
}

impl Distribution {
    /// Creates a distribution from its name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

/// How a recorded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Process exited with this status code.
    ExitCode(i32),
    /// Process was killed by this signal number.
    Signal(i32),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode(code) => write!(f, "exitcode: {code}"),
            Self::Signal(signal) => write!(f, "signal: {signal}"),
        }
    }
}

/// One recorded execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Optional run identifier.
    pub id: Option<String>,
    /// Machine architecture, e.g. `x86_64`.
    pub architecture: String,
    /// Distribution the run was recorded on.
    pub distribution: Distribution,
    /// Command line.
    pub argv: Vec<String>,
    /// Working directory of the process.
    pub working_dir: PathBuf,
    /// Logical names of the files the run reads.
    pub input_files: Vec<String>,
    /// Logical names of the files the run writes.
    pub output_files: Vec<String>,
    /// Exit status or terminating signal.
    pub termination: Termination,
}

/// A software package referenced by the traced processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name.
    pub name: String,
    /// Package version, if recorded.
    pub version: Option<String>,
    /// Installed size in bytes, if recorded.
    pub size: Option<u64>,
    /// Files of this package the processes accessed.
    pub files: Vec<PathBuf>,
    /// Whether the files were captured into the pack.
    pub packfiles: bool,
}

/// Parsed and canonicalized metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackConfig {
    /// Metadata format version string.
    pub version: String,
    /// Recorded runs, in recording order.
    pub runs: Vec<Run>,
    /// Packages touched by the runs.
    pub packages: Vec<Package>,
    /// Files that belong to no package. Always packed.
    pub other_files: Vec<PathBuf>,
}

impl PackConfig {
    /// Parses a metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::Config`] if the document is not valid YAML, has
    /// an unsupported format version, or a run records both (or neither of)
    /// an exit code and a signal.
    ///
    /// # Examples
    ///
    /// ```
    /// use packinfo_core::PackConfig;
    ///
    /// let config = PackConfig::from_yaml("version: '0.8'\nother_files: [/etc/hosts]\n")?;
    /// assert!(config.runs.is_empty());
    /// assert_eq!(config.other_files.len(), 1);
    /// # Ok::<(), packinfo_core::InspectError>(())
    /// ```
    pub fn from_yaml(document: &str) -> Result<Self> {
        let mut raw: RawConfig = serde_yaml::from_str(document)?;
        // A bare `version: 0.10` parses as the float 0.1.
        let source_text = matches!(raw.version, Some(serde_yaml::Value::Number(_)))
            .then(|| top_level_scalar(document, "version"))
            .flatten();
        if let Some(text) = source_text {
            raw.version = Some(serde_yaml::Value::String(text.to_string()));
        }
        raw.canonicalize()
    }
}

/// Loads the metadata document from the pack at `pack`.
///
/// # Errors
///
/// Returns [`InspectError::Config`] if the pack has no metadata document or it
/// cannot be parsed, and [`InspectError::Io`] if the pack cannot be read.
pub fn load_config(pack: &Path) -> Result<PackConfig> {
    let mut archive = open_pack(pack)?;
    let entries = archive
        .entries()
        .map_err(|e| InspectError::InvalidArchive(format!("failed to read pack entries: {e}")))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| InspectError::InvalidArchive(format!("failed to read pack entry: {e}")))?;
        let path = member_path(&entry)?;
        if path != Path::new(CONFIG_MEMBER) {
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        let document = String::from_utf8(bytes)
            .map_err(|_| InspectError::Config(format!("{CONFIG_MEMBER} is not valid UTF-8")))?;
        return PackConfig::from_yaml(&document);
    }

    Err(InspectError::Config(format!("pack has no {CONFIG_MEMBER}")))
}

#[derive(Deserialize)]
struct RawConfig {
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    runs: Vec<RawRun>,
    #[serde(default)]
    inputs_outputs: Vec<RawInputOutput>,
    #[serde(default)]
    packages: Vec<RawPackage>,
    #[serde(default)]
    other_files: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct RawRun {
    id: Option<String>,
    architecture: String,
    #[serde(default)]
    distribution: Vec<serde_yaml::Value>,
    argv: Vec<String>,
    workingdir: PathBuf,
    exitcode: Option<i32>,
    signal: Option<i32>,
    input_files: Option<NameList>,
    output_files: Option<NameList>,
}

/// Per-run file names: a plain list, or a name → path mapping kept in
/// document order.
#[derive(Deserialize)]
#[serde(untagged)]
enum NameList {
    Names(Vec<String>),
    Mapping(serde_yaml::Mapping),
}

impl NameList {
    fn into_names(self) -> Vec<String> {
        match self {
            Self::Names(names) => names,
            Self::Mapping(map) => map.keys().filter_map(scalar_to_string).collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawInputOutput {
    name: String,
    #[serde(default)]
    read_by_runs: Vec<usize>,
    #[serde(default)]
    written_by_runs: Vec<usize>,
}

#[derive(Deserialize)]
struct RawPackage {
    name: String,
    version: Option<serde_yaml::Value>,
    size: Option<u64>,
    #[serde(default)]
    files: Vec<PathBuf>,
    #[serde(default = "default_packfiles")]
    packfiles: bool,
}

const fn default_packfiles() -> bool {
    true
}

impl RawConfig {
    fn canonicalize(self) -> Result<PackConfig> {
        let version = self
            .version
            .as_ref()
            .and_then(scalar_to_string)
            .ok_or_else(|| InspectError::Config("missing format version".to_string()))?;
        check_version(&version)?;

        let mut runs = Vec::with_capacity(self.runs.len());
        for (index, raw) in self.runs.into_iter().enumerate() {
            let mut run = raw.into_run(index)?;
            for io in &self.inputs_outputs {
                if io.read_by_runs.contains(&index) && !run.input_files.contains(&io.name) {
                    run.input_files.push(io.name.clone());
                }
                if io.written_by_runs.contains(&index) && !run.output_files.contains(&io.name) {
                    run.output_files.push(io.name.clone());
                }
            }
            runs.push(run);
        }

        let packages = self
            .packages
            .into_iter()
            .map(|raw| Package {
                name: raw.name,
                version: raw.version.as_ref().and_then(scalar_to_string),
                size: raw.size,
                files: raw.files,
                packfiles: raw.packfiles,
            })
            .collect();

        Ok(PackConfig {
            version,
            runs,
            packages,
            other_files: self.other_files,
        })
    }
}

impl RawRun {
    fn into_run(self, index: usize) -> Result<Run> {
        let termination = match (self.exitcode, self.signal) {
            (Some(code), None) => Termination::ExitCode(code),
            (None, Some(signal)) => Termination::Signal(signal),
            (Some(_), Some(_)) => {
                return Err(InspectError::Config(format!(
                    "run {index} has both an exit code and a signal"
                )));
            }
            (None, None) => {
                return Err(InspectError::Config(format!(
                    "run {index} has neither an exit code nor a signal"
                )));
            }
        };

        let mut parts = self.distribution.iter().map(scalar_to_string);
        let distribution = Distribution {
            name: parts.next().flatten().unwrap_or_default(),
            version: parts.next().flatten().unwrap_or_default(),
        };

        Ok(Run {
            id: self.id,
            architecture: self.architecture,
            distribution,
            argv: self.argv,
            working_dir: self.workingdir,
            input_files: self.input_files.map(NameList::into_names).unwrap_or_default(),
            output_files: self.output_files.map(NameList::into_names).unwrap_or_default(),
            termination,
        })
    }
}

/// Renders a YAML scalar as text; unquoted versions like `0.8` parse as numbers.
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Source text of an unindented `key: value` line, without trailing comment.
fn top_level_scalar<'a>(document: &'a str, key: &str) -> Option<&'a str> {
    document.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        let value = rest.split(" #").next().unwrap_or(rest).trim();
        (!value.is_empty()).then_some(value)
    })
}

fn check_version(version: &str) -> Result<()> {
    let mut parts = version.trim().split('.').map(str::parse::<u32>);
    let parsed = match (parts.next(), parts.next()) {
        (Some(Ok(major)), Some(Ok(minor))) => Some((major, minor)),
        (Some(Ok(major)), None) => Some((major, 0)),
        _ => None,
    };

    match parsed {
        Some(v) if (MIN_VERSION..MAX_VERSION).contains(&v) => Ok(()),
        _ => Err(InspectError::Config(format!(
            "unknown metadata format version {version}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const OLD_LAYOUT: &str = r"
version: '0.6'
runs:
- architecture: x86_64
  distribution: [debian, '8.0']
  argv: [python, analyze.py, data.csv]
  workingdir: /home/user/experiment
  exitcode: 0
  input_files:
    data: /home/user/experiment/data.csv
    config: /home/user/experiment/config.ini
  output_files:
    plot: /home/user/experiment/plot.png
packages:
- name: python2.7
  version: 2.7.9-2
  size: 3825664
  packfiles: true
  files: [/usr/bin/python2.7, /usr/lib/python2.7/os.py]
- name: coreutils
  version: '8.23-4'
  packfiles: false
  files: [/bin/ls]
other_files:
- /etc/ld.so.cache
";

    const NEW_LAYOUT: &str = r"
version: 0.8
runs:
- id: run0
  architecture: x86_64
  distribution: [ubuntu, '22.04']
  argv: [./simulate]
  workingdir: /srv/sim
  signal: 9
- id: run1
  architecture: x86_64
  distribution: [ubuntu, '22.04']
  argv: [./plot, out.dat]
  workingdir: /srv/sim
  exitcode: 2
inputs_outputs:
- name: params
  path: /srv/sim/params.txt
  read_by_runs: [0]
- name: out
  path: /srv/sim/out.dat
  written_by_runs: [0]
  read_by_runs: [1]
";

    #[test]
    fn test_parse_old_layout() {
        let config = PackConfig::from_yaml(OLD_LAYOUT).unwrap();
        assert_eq!(config.version, "0.6");
        assert_eq!(config.runs.len(), 1);

        let run = &config.runs[0];
        assert_eq!(run.architecture, "x86_64");
        assert_eq!(run.distribution, Distribution::new("debian", "8.0"));
        assert_eq!(run.input_files, vec!["data", "config"]);
        assert_eq!(run.output_files, vec!["plot"]);
        assert_eq!(run.termination, Termination::ExitCode(0));
        assert_eq!(run.working_dir, PathBuf::from("/home/user/experiment"));

        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.packages[0].version.as_deref(), Some("2.7.9-2"));
        assert_eq!(config.packages[0].size, Some(3_825_664));
        assert!(!config.packages[1].packfiles);
        assert_eq!(config.other_files, vec![PathBuf::from("/etc/ld.so.cache")]);
    }

    #[test]
    fn test_mapping_names_keep_document_order() {
        let yaml = r"
version: '0.6'
runs:
- architecture: x86_64
  argv: [./merge]
  workingdir: /
  exitcode: 0
  input_files: {zeta: /z, alpha: /a, mid: /m}
  output_files:
    zz_out: /out/z
    aa_out: /out/a
";
        let config = PackConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.runs[0].input_files, ["zeta", "alpha", "mid"]);
        assert_eq!(config.runs[0].output_files, ["zz_out", "aa_out"]);
    }

    #[test]
    fn test_unquoted_version_keeps_source_text() {
        let config = PackConfig::from_yaml("version: 1.10\n").unwrap();
        assert_eq!(config.version, "1.10");

        let config = PackConfig::from_yaml("version: 0.10  # bumped\n").unwrap();
        assert_eq!(config.version, "0.10");

        let config = PackConfig::from_yaml("version: 1\n").unwrap();
        assert_eq!(config.version, "1");

        let err = PackConfig::from_yaml("version: 2.10\n").unwrap_err();
        assert!(err.to_string().contains("2.10"));
    }

    #[test]
    fn test_parse_new_layout() {
        let config = PackConfig::from_yaml(NEW_LAYOUT).unwrap();
        assert_eq!(config.version, "0.8");
        assert_eq!(config.runs[0].id.as_deref(), Some("run0"));
        assert_eq!(config.runs[0].input_files, vec!["params"]);
        assert_eq!(config.runs[0].output_files, vec!["out"]);
        assert_eq!(config.runs[0].termination, Termination::Signal(9));
        assert_eq!(config.runs[1].input_files, vec!["out"]);
        assert!(config.runs[1].output_files.is_empty());
        assert_eq!(config.runs[1].termination, Termination::ExitCode(2));
    }

    #[test]
    fn test_both_layouts_merge_without_duplicates() {
        let yaml = r"
version: '0.8'
runs:
- architecture: i686
  argv: [run]
  workingdir: /
  exitcode: 0
  input_files: [params]
inputs_outputs:
- name: params
  read_by_runs: [0]
- name: extra
  read_by_runs: [0]
";
        let config = PackConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.runs[0].input_files, vec!["params", "extra"]);
        assert_eq!(config.runs[0].distribution, Distribution::default());
    }

    #[test]
    fn test_packfiles_defaults_to_true() {
        let yaml = "version: '0.7'\npackages:\n- name: bash\n  files: [/bin/bash]\n";
        let config = PackConfig::from_yaml(yaml).unwrap();
        assert!(config.packages[0].packfiles);
        assert_eq!(config.packages[0].version, None);
    }

    #[test]
    fn test_empty_metadata() {
        let config = PackConfig::from_yaml("version: '0.8'\n").unwrap();
        assert!(config.runs.is_empty());
        assert!(config.packages.is_empty());
        assert!(config.other_files.is_empty());
    }

    #[test]
    fn test_reject_exitcode_and_signal() {
        let yaml = "version: '0.8'\nruns:\n- {architecture: x86_64, argv: [a], workingdir: /, exitcode: 0, signal: 9}\n";
        let err = PackConfig::from_yaml(yaml).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_reject_missing_termination() {
        let yaml = "version: '0.8'\nruns:\n- {architecture: x86_64, argv: [a], workingdir: /}\n";
        let err = PackConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn test_reject_missing_version() {
        let err = PackConfig::from_yaml("runs: []\n").unwrap_err();
        assert!(err.to_string().contains("missing format version"));
    }

    #[test]
    fn test_version_bounds() {
        assert!(check_version("0.2").is_ok());
        assert!(check_version("0.8").is_ok());
        assert!(check_version("1.0").is_ok());
        assert!(check_version("1.4.2").is_ok());
        assert!(check_version("0.1").is_err());
        assert!(check_version("2.0").is_err());
        assert!(check_version("latest").is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = PackConfig::from_yaml("version: [unterminated").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Distribution::new("debian", "12").to_string(), "debian 12");
        assert_eq!(Distribution::new("arch", "").to_string(), "arch");
        assert_eq!(Termination::ExitCode(3).to_string(), "exitcode: 3");
        assert_eq!(Termination::Signal(15).to_string(), "signal: 15");
    }
}
