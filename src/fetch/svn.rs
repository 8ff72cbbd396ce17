//! Subversion backend.
//!
//! The password travels over the subprocess's piped stdin, never as a
//! visible argument, and the auth cache is disabled whenever a credential
//! is supplied so nothing secret lands on disk.

use super::{strip_metadata, FetchError, SourceFetcher};
use crate::config::BundleConfig;
use crate::exec::CommandRunner;
use crate::workspace::Workspace;

pub struct SvnFetcher;

impl SourceFetcher for SvnFetcher {
    fn backend(&self) -> &'static str {
        "subversion"
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &["svn"]
    }

    fn fetch(
        &self,
        runner: &CommandRunner,
        workspace: &Workspace,
        config: &BundleConfig,
    ) -> Result<Option<String>, FetchError> {
        let username_flag = config
            .source_login
            .as_ref()
            .map(|login| format!("--username={login}"));

        let mut args: Vec<&str> = vec!["co", config.source_url.as_str(), "download"];
        if config.has_credentials() {
            args.push("--no-auth-cache");
        }
        if let Some(flag) = &username_flag {
            args.push(flag);
        }
        if config.source_password.is_some() {
            // Prompt on stdin instead of reading an argument.
            args.push("--force-interactive");
        }

        runner.run(
            workspace.root(),
            "svn",
            &args,
            &[],
            config.source_password.as_deref(),
        )?;

        strip_metadata(&workspace.download_dir(), |name| name == ".svn")?;

        // This backend has no tagging concept surfaced here.
        Ok(None)
    }
}
