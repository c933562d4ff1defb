//! URL templates for the links appended to result comments.
//!
//! Templates may use `{ci_host}`, `{artifact_host}`, `{build_id}`, `{branch}`
//! and `{case_id}`. The artifact host is `<build_id>.<artifact_domain>`.

use serde::{Deserialize, Serialize};

use crate::core::config::SyncConfig;
use crate::core::models::{BuildContext, CaseId};

/// Link templates, overridable from the `[links]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkTemplates {
    pub build: String,
    pub recording: String,
    pub steps: String,
}

impl Default for LinkTemplates {
    fn default() -> Self {
        Self {
            build: "{ci_host}/build/view/{build_id}".to_string(),
            recording: "http://{artifact_host}/tests/_output/records.html".to_string(),
            steps: "http://{artifact_host}/tests/_output/report.html".to_string(),
        }
    }
}

/// Templates bound to one build, ready to render per case.
#[derive(Debug, Clone)]
pub struct CommentLinks {
    templates: LinkTemplates,
    ci_host: String,
    artifact_host: String,
    build_id: String,
    branch: String,
}

impl CommentLinks {
    pub fn new(config: &SyncConfig, build: &BuildContext) -> Self {
        Self {
            templates: config.links.clone(),
            ci_host: config.ci_host.clone(),
            artifact_host: format!("{}.{}", build.build_id, config.artifact_domain),
            build_id: build.build_id.clone(),
            branch: build.branch.clone(),
        }
    }

    pub fn artifact_host(&self) -> &str {
        &self.artifact_host
    }

    /// Labelled URLs for `case_id`, in the order they appear in a comment.
    pub fn render(&self, case_id: &CaseId) -> [(&'static str, String); 3] {
        [
            ("Build", self.fill(&self.templates.build, case_id)),
            ("Recorded result", self.fill(&self.templates.recording, case_id)),
            ("Step detail", self.fill(&self.templates.steps, case_id)),
        ]
    }

    fn fill(&self, template: &str, case_id: &CaseId) -> String {
        template
            .replace("{ci_host}", &self.ci_host)
            .replace("{artifact_host}", &self.artifact_host)
            .replace("{build_id}", &self.build_id)
            .replace("{branch}", &self.branch)
            .replace("{case_id}", case_id.as_str())
    }
}
