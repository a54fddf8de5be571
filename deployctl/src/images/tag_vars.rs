//! Per-run cache of tag template variables

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::errors::DeployError;
use crate::images::git::SourceControl;
use crate::template;

/// Variables available to tag templates
///
/// A variable is only populated when the template being rendered references it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagVars {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_rev_count: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_rev_short: Option<String>,
}

/// Lazily computes each tag variable at most once per run
pub struct TagVarsCache {
    source: Arc<dyn SourceControl>,
    branch: OnceCell<String>,
    rev_count: OnceCell<String>,
    rev_short: OnceCell<String>,
}

impl TagVarsCache {
    pub fn new(source: Arc<dyn SourceControl>) -> Self {
        Self {
            source,
            branch: OnceCell::new(),
            rev_count: OnceCell::new(),
            rev_short: OnceCell::new(),
        }
    }

    /// Collect the variables referenced by `tag_template`
    pub async fn vars_for(&self, tag_template: &str) -> Result<TagVars, DeployError> {
        let mut vars = TagVars::default();

        if tag_template.contains("git_branch") {
            let value = self
                .branch
                .get_or_try_init(|| async {
                    debug!("Resolving git branch");
                    self.source.branch().await
                })
                .await?;
            vars.git_branch = Some(value.clone());
        }
        if tag_template.contains("git_rev_count") {
            let value = self
                .rev_count
                .get_or_try_init(|| async {
                    debug!("Resolving git revision count");
                    self.source.rev_count().await
                })
                .await?;
            vars.git_rev_count = Some(value.clone());
        }
        if tag_template.contains("git_rev_short") {
            let value = self
                .rev_short
                .get_or_try_init(|| async {
                    debug!("Resolving git short revision");
                    self.source.rev_short().await
                })
                .await?;
            vars.git_rev_short = Some(value.clone());
        }

        Ok(vars)
    }

    /// Render a tag template, fetching only the variables it uses
    pub async fn render_tag(&self, tag_template: &str) -> Result<String, DeployError> {
        let vars = self.vars_for(tag_template).await?;
        template::render(tag_template, &vars)
    }
}
