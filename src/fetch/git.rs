//! Git backend: clone, highest-tag checkout, submodule resolution.

use super::{locator_with_credentials, strip_metadata, FetchError, SourceFetcher};
use crate::config::BundleConfig;
use crate::exec::CommandRunner;
use crate::workspace::Workspace;
use tracing::debug;

/// TLS verification off and interactive credential prompts disabled; a
/// clone must either succeed with what it was given or fail, never hang
/// waiting for a terminal.
const GIT_ENV: &[(&str, &str)] = &[("GIT_SSL_NO_VERIFY", "true"), ("GIT_ASKPASS", "false")];

pub struct GitFetcher;

impl SourceFetcher for GitFetcher {
    fn backend(&self) -> &'static str {
        "git"
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &["git"]
    }

    fn fetch(
        &self,
        runner: &CommandRunner,
        workspace: &Workspace,
        config: &BundleConfig,
    ) -> Result<Option<String>, FetchError> {
        // Git accepts no separate credential channel here, so credentials
        // ride inside the locator.
        let locator = locator_with_credentials(
            &config.source_url,
            config.source_login.as_deref(),
            config.source_password.as_deref(),
        )?;

        runner.run(
            workspace.root(),
            "git",
            &["clone", &locator, "download"],
            GIT_ENV,
            None,
        )?;

        let download = workspace.download_dir();

        let listing = runner.run(&download, "git", &["tag", "-l"], GIT_ENV, None)?;
        let last_tag = highest_tag(&listing.stdout);

        if let Some(tag) = &last_tag {
            debug!(tag = %tag, "switching to highest tag");
            runner.run(
                &download,
                "git",
                &["checkout", "-q", &format!("tags/{tag}")],
                GIT_ENV,
                None,
            )?;
        }

        // No-op when the project declares none.
        runner.run(&download, "git", &["submodule", "init"], GIT_ENV, None)?;
        runner.run(&download, "git", &["submodule", "update"], GIT_ENV, None)?;

        strip_metadata(&download, |name| name.starts_with(".git"))?;

        Ok(last_tag)
    }
}

/// Picks the highest tag from a `git tag -l` listing by comparing up to
/// eight dot-separated segments numerically, so `2.10.0` ranks above
/// `2.9.0`. Non-numeric segments count as zero.
pub(crate) fn highest_tag(listing: &str) -> Option<String> {
    let mut tags: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if tags.is_empty() {
        return None;
    }
    tags.sort_by_key(|tag| numeric_key(tag));
    tags.last().map(|tag| tag.to_string())
}

fn numeric_key(tag: &str) -> [u64; 8] {
    let mut key = [0u64; 8];
    for (slot, segment) in key.iter_mut().zip(tag.split('.')) {
        let digits: String = segment
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        *slot = digits.parse().unwrap_or(0);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_sort_beats_lexical_order() {
        let listing = "1.9.0\n1.10.0\n1.2.0\n";
        assert_eq!(highest_tag(listing).as_deref(), Some("1.10.0"));
    }

    #[test]
    fn test_segments_compare_independently() {
        let listing = "2.9.9\n2.10.0\n2.9.10\n";
        assert_eq!(highest_tag(listing).as_deref(), Some("2.10.0"));
    }

    #[test]
    fn test_deep_version_chains_up_to_eight_segments() {
        let listing = "1.0.0.0.0.0.0.2\n1.0.0.0.0.0.0.10\n1.0.0.0.0.0.0.9\n";
        assert_eq!(highest_tag(listing).as_deref(), Some("1.0.0.0.0.0.0.10"));
    }

    #[test]
    fn test_empty_listing_yields_no_tag() {
        assert_eq!(highest_tag(""), None);
        assert_eq!(highest_tag("\n  \n"), None);
    }

    #[test]
    fn test_whitespace_is_trimmed_from_tags() {
        assert_eq!(highest_tag("  1.0.0  \n"), Some("1.0.0".to_string()));
    }

    #[test]
    fn test_non_numeric_segments_count_as_zero() {
        // "beta" parses as 0, so 0.1 ranks above it.
        let listing = "beta\n0.1\n";
        assert_eq!(highest_tag(listing).as_deref(), Some("0.1"));
    }
}
