use actix_web::{HttpResponse, Result, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bc = state.chain()?;
    let last = bc.last_block();

    Ok(HttpResponse::Ok().json(StatsResponse {
        height: bc.len(),
        pending: bc.pending().len(),
        last_difficulty: last.difficulty,
        next_difficulty: bc.next_difficulty(),
        last_block_time_ms: last.block_time.as_millis(),
        total_mining_time_ms: bc.total_mining_time().as_millis(),
        avg_block_time_ms: bc.average_block_time().as_millis(),
        settings: bc.settings(),
    }))
}
