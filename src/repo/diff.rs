//! Git diff extraction.
//!
//! Shells out to the `git` binary in the working tree being reviewed.
//! The tree is only read, never modified.

use crate::agent::error::ToolError;
use crate::scanner::truncate_chars;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Diff target used when the model does not name one.
pub const DEFAULT_TARGET: &str = "HEAD";

/// Run `git diff <target>` in `work_dir`, truncating output after `max_chars`.
pub async fn get_git_diff(
    work_dir: &Path,
    target: &str,
    max_chars: usize,
) -> Result<String, ToolError> {
    let target = if target.trim().is_empty() {
        DEFAULT_TARGET
    } else {
        target.trim()
    };

    // Options like --output would let the model write files.
    if target.starts_with('-') {
        return Err(ToolError::InvalidInput(format!(
            "diff target must be a revision, got: {}",
            target
        )));
    }

    debug!("Running git diff {} in {}", target, work_dir.display());

    let output = Command::new("git")
        .arg("diff")
        .arg(target)
        .current_dir(work_dir)
        .output()
        .await
        .map_err(|e| ToolError::CommandFailed(format!("failed to run git diff: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::CommandFailed(format!(
            "git diff {} exited with {}: {}",
            target,
            output.status,
            stderr.trim()
        )));
    }

    let diff = String::from_utf8_lossy(&output.stdout);
    if diff.is_empty() {
        return Ok("No changes".to_string());
    }

    Ok(match truncate_chars(&diff, max_chars) {
        Some(head) => format!("{}\n... (diff truncated at {} characters)", head, max_chars),
        None => diff.into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(["-c", "user.name=Reviewer", "-c", "user.email=reviewer@example.com"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn committed_repo() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        git(temp_dir.path(), &["init", "-q"]);
        fs::write(temp_dir.path().join("main.go"), "package main\n").unwrap();
        git(temp_dir.path(), &["add", "."]);
        git(temp_dir.path(), &["commit", "-q", "-m", "init"]);
        temp_dir
    }

    #[tokio::test]
    async fn test_clean_tree_reports_no_changes() {
        let repo = committed_repo();
        let result = get_git_diff(repo.path(), "HEAD", 20_000).await.unwrap();
        assert_eq!(result, "No changes");
    }

    #[tokio::test]
    async fn test_modified_file_shows_diff() {
        let repo = committed_repo();
        fs::write(repo.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

        let result = get_git_diff(repo.path(), "", 20_000).await.unwrap();
        assert!(result.contains("diff --git a/main.go b/main.go"));
        assert!(result.contains("+func main() {}"));
    }

    #[tokio::test]
    async fn test_long_diff_is_truncated() {
        let repo = committed_repo();
        fs::write(repo.path().join("main.go"), "x\n".repeat(500)).unwrap();

        let result = get_git_diff(repo.path(), "HEAD", 100).await.unwrap();
        assert!(result.ends_with("... (diff truncated at 100 characters)"));
    }

    #[tokio::test]
    async fn test_option_like_target_is_rejected() {
        let repo = committed_repo();
        let err = get_git_diff(repo.path(), "--output=/tmp/x", 20_000)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_revision_is_command_failure() {
        let repo = committed_repo();
        let err = get_git_diff(repo.path(), "no-such-branch", 20_000)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed(_)));
    }
}
