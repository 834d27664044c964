use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    dto::analytics_dto::{AnalyticsOverview, AnalyticsQuery},
    error::Result,
    AppState,
};

pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsOverview>> {
    let overview = state.analytics_service.overview(&query).await?;
    Ok(Json(overview))
}
