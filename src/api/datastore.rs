//! Datastore API endpoints.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::auth::Actor;
use crate::errors::AppError;
use crate::models::{Datastore, RevisionInfo};
use crate::AppState;

/// GET /api/datastore - Get the full datastore.
pub async fn get_datastore(State(state): State<AppState>, _actor: Actor) -> ApiResult<Datastore> {
    let build = async {
        let meta = state.repo.get_meta().await?;
        let staff = state.repo.list_staff().await?;
        Ok::<_, AppError>(Datastore {
            schema_version: meta.schema_version,
            generated_at: meta.generated_at,
            revision_id: meta.revision_id,
            staff,
            requirements: state.schedule.requirements().await,
            schedule: state.schedule.schedule().await.to_vec(),
        })
    };

    match build.await {
        Ok(datastore) => {
            let revision_id = datastore.revision_id;
            success(datastore, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>, _actor: Actor) -> ApiResult<RevisionInfo> {
    let revision_info =
        state
            .repo
            .get_revision_info()
            .await
            .map_err(|e| crate::errors::AppErrorWithRevision {
                error: e,
                revision_id: 0,
            })?;

    success(revision_info.clone(), revision_info.revision_id)
}
