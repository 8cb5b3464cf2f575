//! Return-to-employment ranking of trainings.

use serde::Serialize;

use crate::client::EmploiStoreClient;
use crate::error::{EmploiStoreError, Result};
use crate::models::Record;

pub const TRAINING_SCOPE: &str = "api_retouralemploisuiteformationv1";

const RANK_PATH: &str = "retouralemploisuiteformation/v1/rank";

#[derive(Serialize)]
struct RankParams<'a> {
    formacode: &'a str,
    codeinseeville: &'a str,
}

/// Rank of the employment rate after a training.
///
/// # Arguments
///
/// * `formacode` - ID of the training domain (Formacode)
/// * `city_id` - INSEE code of the city where the training takes place
///
/// # Errors
///
/// Returns [`EmploiStoreError::NotFound`] if the API has no ranking for
/// this training and city.
#[tracing::instrument(skip(client))]
pub async fn employment_rate_rank(
    client: &EmploiStoreClient,
    formacode: &str,
    city_id: &str,
) -> Result<Record> {
    let params = RankParams {
        formacode,
        codeinseeville: city_id,
    };
    let ranks: Vec<Record> = match client.get_json(TRAINING_SCOPE, RANK_PATH, &params).await? {
        Some(value) => serde_json::from_value(value)?,
        None => Vec::new(),
    };

    ranks
        .into_iter()
        .next()
        .ok_or_else(|| EmploiStoreError::NotFound {
            entity_type: "Training rank",
            id: format!("{formacode} in {city_id}"),
        })
}
