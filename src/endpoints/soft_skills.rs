//! Soft skills expected for a job group.

use serde::Deserialize;

use crate::client::EmploiStoreClient;
use crate::error::Result;
use crate::models::Record;

pub const SOFT_SKILLS_SCOPE: &str = "api_matchviasoftskillsv1";

const JOB_SKILLS_PATH: &str = "matchviasoftskills/v1/professions/job_skills";

#[derive(Deserialize)]
struct JobSkills {
    #[serde(default)]
    skills: Option<Record>,
}

/// Soft skills for a job group (ROME code), most significant first.
///
/// The endpoint only accepts POST. Skills are returned in the order the
/// server lists them.
#[tracing::instrument(skip(client))]
pub async fn soft_skills(client: &EmploiStoreClient, rome: &str) -> Result<Vec<Record>> {
    let Some(value) = client
        .post_json(SOFT_SKILLS_SCOPE, JOB_SKILLS_PATH, &[("code", rome)])
        .await?
    else {
        return Ok(Vec::new());
    };

    let response: JobSkills = serde_json::from_value(value)?;
    let skills = response.skills.unwrap_or_default();
    skills
        .into_iter()
        .map(|(_, skill)| serde_json::from_value(skill).map_err(Into::into))
        .collect()
}
