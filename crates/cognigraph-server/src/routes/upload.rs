//! POST /upload — ingest a document and return the extracted graph.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::error::ApiError;
use crate::ingestion;
use crate::routes::session_id;
use crate::state::AppState;
use cognigraph_core::Error;
use cognigraph_graph::GraphData;

pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<GraphData>, ApiError> {
    let sid = session_id(&headers)?;

    // Take the first field that carries a file.
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("failed to read upload: {}", e)))?;
        file = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        file.ok_or_else(|| Error::InvalidRequest("request contained no file upload".into()))?;

    let graph = ingestion::ingest_upload(&state, &sid, &filename, bytes).await?;
    Ok(Json(graph))
}
