//! Recursive HTTP mirror backend.

use super::{FetchError, SourceFetcher};
use crate::config::BundleConfig;
use crate::exec::CommandRunner;
use crate::workspace::Workspace;

pub struct HttpMirrorFetcher;

impl SourceFetcher for HttpMirrorFetcher {
    fn backend(&self) -> &'static str {
        "http-mirror"
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &["wget"]
    }

    fn fetch(
        &self,
        runner: &CommandRunner,
        workspace: &Workspace,
        config: &BundleConfig,
    ) -> Result<Option<String>, FetchError> {
        let download = workspace.download_dir();
        std::fs::create_dir_all(&download)?;

        let user_flag = config
            .source_login
            .as_ref()
            .map(|login| format!("--user={login}"));

        let mut args: Vec<&str> = vec!["-nH", "-r", config.source_url.as_str()];
        if let Some(flag) = &user_flag {
            // A visible argument is acceptable for this backend; the
            // password is not granted the same treatment.
            args.push(flag);
        }
        if config.source_password.is_some() {
            args.push("--ask-password");
        }

        runner.run(
            &download,
            "wget",
            &args,
            &[],
            config.source_password.as_deref(),
        )?;

        Ok(None)
    }
}
