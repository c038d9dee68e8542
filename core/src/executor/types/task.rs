use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A discovered input file together with the label derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub label: String,
}

impl InputFile {
    pub fn new(path: PathBuf) -> Self {
        let label = crate::discover::label(&path);
        Self { path, label }
    }
}

/// External program invoked once per input file.
///
/// The spawned command line is `program args... <input-path> <label>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "bash".to_string()
}

fn default_args() -> Vec<String> {
    vec!["./make_plots.sh".to_string()]
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// What happens to a child's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Child writes straight to the dispatcher's terminal.
    #[default]
    Inherit,
    /// Output is captured and the tail kept on the outcome.
    Capture,
}

/// One unit of dispatch work.
#[derive(Debug, Clone)]
pub struct BatchTask {
    /// Position in submission order.
    pub index: usize,
    pub input: InputFile,
    pub command: Arc<CommandSpec>,
}

impl BatchTask {
    pub fn new(index: usize, input: InputFile, command: Arc<CommandSpec>) -> Self {
        Self {
            index,
            input,
            command,
        }
    }

    pub fn label(&self) -> &str {
        &self.input.label
    }

    /// Arguments passed to the program: fixed args, then path and label.
    /// The path is passed through byte for byte.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv: Vec<OsString> = self.command.args.iter().map(OsString::from).collect();
        argv.push(self.input.path.as_os_str().to_os_string());
        argv.push(OsString::from(&self.input.label));
        argv
    }

    /// Printable command line, for logs. Lossy for non-UTF-8 paths.
    pub fn display_command(&self) -> String {
        std::iter::once(self.command.program.clone())
            .chain(self.argv().into_iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Pair every input with the shared command, preserving input order.
pub fn build_tasks(inputs: Vec<InputFile>, command: &CommandSpec) -> Vec<BatchTask> {
    let command = Arc::new(command.clone());
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| BatchTask::new(index, input, command.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn argv_appends_path_and_label() {
        let cmd = CommandSpec::default();
        let tasks = build_tasks(
            vec![InputFile::new(PathBuf::from("out/out_MIMOSA_2.root"))],
            &cmd,
        );

        assert_eq!(
            tasks[0].argv(),
            vec!["./make_plots.sh", "out/out_MIMOSA_2.root", "out_MIMOSA_2"]
        );
        assert_eq!(
            tasks[0].display_command(),
            "bash ./make_plots.sh out/out_MIMOSA_2.root out_MIMOSA_2"
        );
    }

    #[cfg(unix)]
    #[test]
    fn argv_passes_non_utf8_path_unchanged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = PathBuf::from(OsStr::from_bytes(b"out/out_MIMOSA_\xff.root"));
        let tasks = build_tasks(vec![InputFile::new(path.clone())], &CommandSpec::default());

        let argv = tasks[0].argv();
        assert_eq!(argv[1], path.into_os_string());
        assert_eq!(argv[2], OsString::from("out_MIMOSA_\u{FFFD}"));
        assert!(tasks[0].display_command().contains('\u{FFFD}'));
    }

    #[test]
    fn build_tasks_indexes_in_input_order() {
        let inputs = ["a.root", "b.root", "c.root"]
            .iter()
            .map(|p| InputFile::new(PathBuf::from(p)))
            .collect();
        let tasks = build_tasks(inputs, &CommandSpec::new("true", vec![]));

        let seen: Vec<(usize, &str)> = tasks.iter().map(|t| (t.index, t.label())).collect();
        assert_eq!(seen, vec![(0, "a"), (1, "b"), (2, "c")]);
    }
}
