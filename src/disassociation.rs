//! # Disassociation Orchestrator
//!
//! The decision engine behind the workflow action: given a source record and
//! a selection criterion, computes the exact set of target associations to
//! sever and drives the token lifecycle manager and the HubSpot client to
//! perform the deletions.
//!
//! Criterion selection narrows which records to act on; once a record is
//! selected, every association edge between the two records is removed,
//! whatever its label. This models "disassociate the record entirely"
//! rather than "remove one label".

use std::collections::BTreeSet;
use std::sync::Arc;

use metrics::{counter, histogram};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::hubspot::HubSpotClient;
use crate::token_refresh::TokenRefreshService;

/// How target records are selected for disassociation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
    /// Delete targets whose named property exactly equals the expected value.
    Property { name: String, expected: String },
    /// Delete targets linked by the selected association type.
    AssociationLabel { type_id: i64 },
}

/// One disassociation invocation. Never persisted.
#[derive(Debug, Clone)]
pub struct DisassociationRequest {
    pub hub_id: String,
    pub from_object_type: String,
    pub from_object_id: u64,
    pub to_object_type: String,
    pub criterion: SelectionCriterion,
}

/// Counts reported back to the workflow engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisassociationOutcome {
    /// Associated records found on the source
    pub targets: usize,
    /// Targets whose association edges were deleted
    pub deleted: usize,
    /// Targets left untouched (not selected, or detail fetch failed)
    pub skipped: usize,
}

/// Orchestrates the list → filter → detail → delete pipeline.
pub struct DisassociationService {
    tokens: Arc<TokenRefreshService>,
    client: HubSpotClient,
}

impl DisassociationService {
    pub fn new(tokens: Arc<TokenRefreshService>, client: HubSpotClient) -> Self {
        Self { tokens, client }
    }

    /// Execute one disassociation request.
    ///
    /// Validation happens before any network call. Per-target failures are
    /// logged and tolerated; the batch runs to completion and reports
    /// success with counts.
    #[instrument(skip(self, request), fields(hub_id = %request.hub_id))]
    pub async fn disassociate(
        &self,
        request: &DisassociationRequest,
    ) -> Result<DisassociationOutcome, AppError> {
        validate(request)?;

        let started = std::time::Instant::now();
        counter!("disassociation_requests_total").increment(1);

        let access_token = self
            .tokens
            .ensure_valid_access_token(&request.hub_id)
            .await?;

        let edges = self
            .client
            .list_associated_records(
                &access_token,
                &request.from_object_type,
                request.from_object_id,
                &request.to_object_type,
            )
            .await?;

        if edges.is_empty() {
            info!(
                from_object_type = %request.from_object_type,
                from_object_id = request.from_object_id,
                to_object_type = %request.to_object_type,
                "No associated records found; nothing to disassociate"
            );
            return Ok(DisassociationOutcome::default());
        }

        // Candidate type ids are the union across all edges; deletion always
        // passes the full set so a selected record is severed entirely.
        let candidate_type_ids: Vec<i64> = edges
            .iter()
            .flat_map(|edge| edge.association_types.iter().map(|t| t.type_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut outcome = DisassociationOutcome {
            targets: edges.len(),
            ..DisassociationOutcome::default()
        };

        // One target at a time: sequential fan-out keeps us under provider
        // rate limits and keeps log ordering traceable.
        for edge in &edges {
            let selected = match &request.criterion {
                SelectionCriterion::AssociationLabel { type_id } => edge
                    .association_types
                    .iter()
                    .any(|association_type| association_type.type_id == *type_id),
                SelectionCriterion::Property { name, expected } => {
                    match self
                        .client
                        .record_property(
                            &access_token,
                            &request.to_object_type,
                            edge.to_object_id,
                            name,
                        )
                        .await
                    {
                        Ok(value) => value.as_deref() == Some(expected.as_str()),
                        Err(err) => {
                            warn!(
                                to_object_id = edge.to_object_id,
                                property = %name,
                                error = %err,
                                "Failed to fetch record detail; skipping target"
                            );
                            false
                        }
                    }
                }
            };

            if !selected {
                outcome.skipped += 1;
                continue;
            }

            let removed = self
                .client
                .delete_association(
                    &access_token,
                    &request.from_object_type,
                    request.from_object_id,
                    &request.to_object_type,
                    edge.to_object_id,
                    &candidate_type_ids,
                )
                .await;

            info!(
                to_object_id = edge.to_object_id,
                removed_edges = removed,
                "Disassociated target record"
            );
            outcome.deleted += 1;
        }

        counter!("disassociation_deleted_total").increment(outcome.deleted as u64);
        counter!("disassociation_skipped_total").increment(outcome.skipped as u64);
        histogram!("disassociation_duration_ms")
            .record(started.elapsed().as_secs_f64() * 1_000.0);

        info!(
            targets = outcome.targets,
            deleted = outcome.deleted,
            skipped = outcome.skipped,
            "Disassociation completed"
        );

        Ok(outcome)
    }
}

fn validate(request: &DisassociationRequest) -> Result<(), AppError> {
    if request.hub_id.is_empty() {
        return Err(AppError::validation("portal id is required"));
    }
    if request.from_object_type.is_empty() {
        return Err(AppError::validation("source object type is required"));
    }
    if request.to_object_type.is_empty() {
        return Err(AppError::validation("objectInput is required"));
    }

    match &request.criterion {
        SelectionCriterion::Property { name, .. } if name.is_empty() => Err(AppError::validation(
            "optionsInput must name the property to match",
        )),
        SelectionCriterion::AssociationLabel { type_id } if *type_id <= 0 => Err(
            AppError::validation("optionsInput must be a valid association type id"),
        ),
        _ => Ok(()),
    }
}
