use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::adapter::Stage;

pub const FILTER_FILE: &str = "filter_ai_context.txt";
pub const NORMALIZE_FILE: &str = "prep_ai_context.txt";
pub const BRAINSTORM_FILE: &str = "brainstorm_ai_context.txt";
pub const INTEGRATE_FILE: &str = "integration_ai_context.txt";
pub const VERIFY_FILE: &str = "checker_ai_context.txt";

pub const TEMPLATE_FILES: [&str; 5] = [
    FILTER_FILE,
    NORMALIZE_FILE,
    BRAINSTORM_FILE,
    INTEGRATE_FILE,
    VERIFY_FILE,
];

/// Instruction templates for the five stages. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub filter: String,
    pub normalize: String,
    pub brainstorm: String,
    pub integrate: String,
    pub verify: String,
}

impl PromptSet {
    pub async fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            filter: read_template(dir, FILTER_FILE).await?,
            normalize: read_template(dir, NORMALIZE_FILE).await?,
            brainstorm: read_template(dir, BRAINSTORM_FILE).await?,
            integrate: read_template(dir, INTEGRATE_FILE).await?,
            verify: read_template(dir, VERIFY_FILE).await?,
        })
    }

    pub fn template(&self, stage: Stage) -> &str {
        match stage {
            Stage::Filter => &self.filter,
            Stage::Normalize => &self.normalize,
            Stage::Brainstorm => &self.brainstorm,
            Stage::Integrate => &self.integrate,
            Stage::Verify => &self.verify,
        }
    }

    /// Which template files exist under `dir`, in stage order.
    pub fn check_files(dir: &Path) -> Vec<(PathBuf, bool)> {
        TEMPLATE_FILES
            .iter()
            .map(|name| {
                let path = dir.join(name);
                let exists = path.is_file();
                (path, exists)
            })
            .collect()
    }
}

async fn read_template(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read prompt template '{}'", path.display()))
}

/// System text for stages that must see the restriction list.
pub fn restriction_preamble(stage: Stage, restrictions: &str) -> String {
    format!(
        "You are the {} of a series of LLMs that will take in a recipe, and adapt it to follow different dietary restrictions. The restrictions you want to follow are {}. ",
        stage.ordinal(),
        restrictions
    )
}
