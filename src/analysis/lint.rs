//! External linter invocation.
//!
//! The linter is chosen from the file extension. A missing linter is an
//! advisory for the model, not a failure.

use crate::agent::error::ToolError;
use crate::scanner::extension_of;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// One way of linting a file: `program args... <file>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinterCommand {
    /// Name reported back to the model.
    pub name: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Linters for one language family, tried in order.
#[derive(Debug, Clone, Copy)]
pub struct LinterChoice {
    pub candidates: &'static [LinterCommand],
    /// Shown when no candidate is installed.
    pub missing_advice: &'static str,
}

const GO_LINTERS: LinterChoice = LinterChoice {
    candidates: &[
        LinterCommand {
            name: "golangci-lint",
            program: "golangci-lint",
            args: &["run"],
        },
        LinterCommand {
            name: "go vet",
            program: "go",
            args: &["vet"],
        },
    ],
    missing_advice: "No Go linter installed\nSuggested: install golangci-lint",
};

const JS_LINTERS: LinterChoice = LinterChoice {
    candidates: &[LinterCommand {
        name: "eslint",
        program: "eslint",
        args: &[],
    }],
    missing_advice: "eslint is not installed\nSuggested: npm install -g eslint",
};

const PY_LINTERS: LinterChoice = LinterChoice {
    candidates: &[
        LinterCommand {
            name: "pylint",
            program: "pylint",
            args: &[],
        },
        LinterCommand {
            name: "flake8",
            program: "flake8",
            args: &[],
        },
    ],
    missing_advice: "No Python linter installed\nSuggested: pip install pylint",
};

/// Linter table keyed by extension (with leading dot).
pub fn linters_for(ext: &str) -> Option<LinterChoice> {
    match ext {
        ".go" => Some(GO_LINTERS),
        ".js" | ".ts" | ".jsx" | ".tsx" => Some(JS_LINTERS),
        ".py" => Some(PY_LINTERS),
        _ => None,
    }
}

/// Lint `file_path` (relative to `work_dir`) with the linter for its extension.
pub async fn run_linter(work_dir: &Path, file_path: &str) -> Result<String, ToolError> {
    lint_with_search_path(work_dir, file_path, None).await
}

/// [`run_linter`], resolving linter programs in `search_path` instead of
/// the inherited `PATH` when given.
async fn lint_with_search_path(
    work_dir: &Path,
    file_path: &str,
    search_path: Option<&OsStr>,
) -> Result<String, ToolError> {
    if file_path.is_empty() {
        return Err(ToolError::InvalidInput("file_path is required".to_string()));
    }

    // The path is passed as an argument; a leading '-' would be read as a linter option.
    if file_path.starts_with('-') {
        return Err(ToolError::InvalidInput(format!(
            "file_path must not start with '-', got: {}",
            file_path
        )));
    }

    let ext = extension_of(Path::new(file_path));
    let Some(choice) = linters_for(&ext) else {
        return Ok(format!(
            "[warning] Unsupported file type: {}\nSupported types: .go, .js, .ts, .jsx, .tsx, .py",
            if ext.is_empty() { "(none)" } else { ext.as_str() }
        ));
    };

    run_first_available(work_dir, file_path, &choice, search_path).await
}

/// Run the first installed candidate of `choice` against `file_path`.
pub async fn run_first_available(
    work_dir: &Path,
    file_path: &str,
    choice: &LinterChoice,
    search_path: Option<&OsStr>,
) -> Result<String, ToolError> {
    for linter in choice.candidates {
        debug!("Trying linter {} on {}", linter.name, file_path);

        let mut command = Command::new(linter.program);
        command.args(linter.args).arg(file_path).current_dir(work_dir);
        if let Some(path) = search_path {
            command.env("PATH", path);
        }

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Linter {} not installed", linter.name);
                continue;
            }
            Err(e) => {
                return Err(ToolError::CommandFailed(format!(
                    "failed to run {}: {}",
                    linter.name, e
                )))
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        // Linters exit non-zero when they find issues.
        if !output.status.success() && text.trim().is_empty() {
            return Err(ToolError::CommandFailed(format!(
                "{} exited with {} and produced no output",
                linter.name, output.status
            )));
        }

        if text.trim().is_empty() {
            return Ok(format!("{} passed with no issues", linter.name));
        }

        return Ok(format!("Results from {}:\n{}", linter.name, text));
    }

    Ok(format!("[warning] {}", choice.missing_advice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MISSING: LinterChoice = LinterChoice {
        candidates: &[
            LinterCommand {
                name: "first",
                program: "aicr-test-missing-linter-a",
                args: &[],
            },
            LinterCommand {
                name: "second",
                program: "aicr-test-missing-linter-b",
                args: &[],
            },
        ],
        missing_advice: "No linter installed",
    };

    #[test]
    fn test_linter_table() {
        assert_eq!(linters_for(".go").unwrap().candidates[0].name, "golangci-lint");
        assert_eq!(linters_for(".go").unwrap().candidates[1].name, "go vet");
        assert_eq!(linters_for(".tsx").unwrap().candidates[0].name, "eslint");
        assert_eq!(linters_for(".py").unwrap().candidates[1].name, "flake8");
        assert!(linters_for(".rb").is_none());
    }

    #[tokio::test]
    async fn test_missing_linters_are_advisory() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_first_available(temp_dir.path(), "main.go", &MISSING, None)
            .await
            .unwrap();
        assert_eq!(result, "[warning] No linter installed");
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_advisory() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_linter(temp_dir.path(), "README.md").await.unwrap();
        assert!(result.starts_with("[warning] Unsupported file type: .md"));
    }

    #[tokio::test]
    async fn test_empty_path_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let err = run_linter(temp_dir.path(), "").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_option_like_path_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let hook = "--init-hook=import os;os.system('touch pwned');#.py";

        let err = run_linter(temp_dir.path(), hook).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
        assert!(!temp_dir.path().join("pwned").exists());

        let err = run_linter(temp_dir.path(), "-o.js").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_option_like_path_never_reaches_linter() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let fake = bin.join("pylint");
        std::fs::write(&fake, "#!/bin/sh\necho \"argv1=$1\"\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ok = lint_with_search_path(temp_dir.path(), "app.py", Some(bin.as_os_str()))
            .await
            .unwrap();
        assert_eq!(ok, "Results from pylint:\nargv1=app.py\n");

        let result =
            lint_with_search_path(temp_dir.path(), "--init-hook=x.py", Some(bin.as_os_str())).await;
        tokio_test::assert_err!(result);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_go_file_without_go_linters_is_advisory() {
        let temp_dir = TempDir::new().unwrap();
        let empty_path = temp_dir.path().join("empty-bin");
        std::fs::create_dir(&empty_path).unwrap();

        let result = lint_with_search_path(temp_dir.path(), "x.go", Some(empty_path.as_os_str()))
            .await
            .unwrap();
        assert_eq!(
            result,
            "[warning] No Go linter installed\nSuggested: install golangci-lint"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_issues_with_nonzero_exit_are_success() {
        const FINDS_ISSUES: LinterChoice = LinterChoice {
            candidates: &[LinterCommand {
                name: "sh-lint",
                program: "sh",
                args: &["-c", "echo \"unused variable in $0\"; exit 1"],
            }],
            missing_advice: "",
        };

        let temp_dir = TempDir::new().unwrap();
        let result = run_first_available(temp_dir.path(), "app.py", &FINDS_ISSUES, None)
            .await
            .unwrap();
        assert_eq!(result, "Results from sh-lint:\nunused variable in app.py\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_nonzero_exit_is_failure() {
        const CRASHES: LinterChoice = LinterChoice {
            candidates: &[LinterCommand {
                name: "sh-crash",
                program: "sh",
                args: &["-c", "exit 3"],
            }],
            missing_advice: "",
        };

        let temp_dir = TempDir::new().unwrap();
        let err = run_first_available(temp_dir.path(), "app.py", &CRASHES, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clean_run_passes() {
        const CLEAN: LinterChoice = LinterChoice {
            candidates: &[
                LinterCommand {
                    name: "absent",
                    program: "aicr-test-missing-linter-c",
                    args: &[],
                },
                LinterCommand {
                    name: "true",
                    program: "true",
                    args: &[],
                },
            ],
            missing_advice: "",
        };

        let temp_dir = TempDir::new().unwrap();
        let result = run_first_available(temp_dir.path(), "app.py", &CLEAN, None)
            .await
            .unwrap();
        assert_eq!(result, "true passed with no issues");
    }
}
