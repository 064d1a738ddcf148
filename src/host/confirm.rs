// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::host::traits::Confirm;

/// Terminal confirmation: prints the prompt on stderr and reads y/N from stdin
pub struct PromptConfirm {
    assume_yes: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

/// Only an explicit yes counts as agreement
fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            debug!(prompt = %prompt, "Confirmation assumed");
            return true;
        }

        let mut stderr = tokio::io::stderr();
        if let Err(e) = stderr.write_all(format!("{} [y/N] ", prompt).as_bytes()).await {
            warn!(error = %e, "Failed to write confirmation prompt");
            return false;
        }
        let _ = stderr.flush().await;

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(_) => parse_answer(&line),
            Err(e) => {
                warn!(error = %e, "Failed to read confirmation answer");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer("YES"));
        assert!(parse_answer("  yes  "));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("n"));
        assert!(!parse_answer("yep"));
    }

    #[tokio::test]
    async fn test_assume_yes_skips_prompt() {
        let confirm = PromptConfirm::new(true);
        assert!(confirm.confirm("Are you sure you want to delete a.jpg?").await);
    }
}
