use actix_web::{HttpResponse, Result, get, web};

use super::models::{AppState, BalanceResponse};

/// Linear recomputation over every mined transaction.
#[get("/balance/{address}/")]
pub async fn get_balance(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse> {
    let address = path.into_inner().0;
    let balance = state.chain()?.balance(&address);
    Ok(HttpResponse::Ok().json(BalanceResponse { address, balance }))
}
