use actix_web::{HttpResponse, Result, get, post, web};
use log::{debug, info};

use super::models::{
    AppState, ChainResponse, MineRequest, MineResponse, SettingsRequest, ValidateResponse,
};
use crate::blockchain::DIFF_MAX;
use crate::error::EngineError;
use crate::transaction::SelectionPolicy;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bc = state.chain()?;
    Ok(HttpResponse::Ok().json(ChainResponse {
        length: bc.len(),
        chain: &bc.chain,
    }))
}

/// Whole chain as text.
#[get("/chain/print/")]
pub async fn print_chain(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bc = state.chain()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(bc.to_string()))
}

fn parse_index(raw: &str) -> Result<u64, EngineError> {
    raw.trim()
        .parse()
        .map_err(|_| EngineError::InvalidInput(format!("Invalid Block No. '{raw}'")))
}

#[get("/block/{index}/")]
pub async fn get_block(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse> {
    let index = parse_index(&path.into_inner().0)?;
    let bc = state.chain()?;
    let block = bc.get_block(index)?;
    Ok(HttpResponse::Ok().json(block))
}

#[get("/block/{index}/print/")]
pub async fn print_block(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse> {
    let index = parse_index(&path.into_inner().0)?;
    let bc = state.chain()?;
    let text = bc.render_block(index)?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text))
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bc = state.chain()?;
    let invalid_at = bc.first_invalid_block();
    Ok(HttpResponse::Ok().json(ValidateResponse {
        valid: invalid_at.is_none(),
        length: bc.len(),
        invalid_at,
    }))
}

/// Mine a new block from the pending pool:
/// - Select up to `max_txs_per_block` txs with the requested policy
/// - Append the reward (base reward + fees) for `miner_address`
/// - Mine PoW and append the block
///
/// The search runs on the blocking pool and keeps the chain locked; other
/// requests get 503 until it finishes.
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    req: web::Json<MineRequest>,
) -> Result<HttpResponse> {
    let MineRequest {
        miner_address,
        policy,
    } = req.into_inner();
    let miner_address = miner_address.trim().to_string();
    if miner_address.is_empty() {
        return Err(EngineError::InvalidInput("miner_address required".into()).into());
    }
    let policy: SelectionPolicy = policy.as_deref().unwrap_or_default().parse()?;
    debug!("POST /mine/ - policy={policy} miner={miner_address}");

    let resp = web::block(move || -> Result<MineResponse, EngineError> {
        let mut bc = state.chain()?;
        let block = bc.mine_next_block(policy, &miner_address).clone();
        Ok(MineResponse {
            mined_index: block.index,
            hash: block.hash,
            nonce: block.nonce,
            difficulty: block.difficulty,
            block_time_ms: block.block_time.as_millis(),
            transactions: block.transactions.len(),
            pending: bc.pending().len(),
        })
    })
    .await??;

    info!(
        "MINER - sealed block #{} (hash={}, nonce={}, difficulty={})",
        resp.mined_index, resp.hash, resp.nonce, resp.difficulty
    );
    Ok(HttpResponse::Ok().json(resp))
}

/// Current mining settings.
#[get("/settings/")]
pub async fn get_settings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let settings = state.chain()?.settings();
    Ok(HttpResponse::Ok().json(settings))
}

/// Toggle threading / dynamic difficulty or change the fixed difficulty
/// (affects future blocks only).
#[post("/settings/")]
pub async fn set_settings(
    state: web::Data<AppState>,
    body: web::Json<SettingsRequest>,
) -> Result<HttpResponse> {
    if body.fixed_difficulty.is_some_and(|d| d > DIFF_MAX) {
        return Err(EngineError::InvalidInput(format!(
            "difficulty too high for dev mode (max {DIFF_MAX})"
        ))
        .into());
    }
    let mut bc = state.chain()?;
    let mut settings = bc.settings();
    if let Some(threaded) = body.threaded {
        settings.threaded = threaded;
    }
    if let Some(dynamic) = body.dynamic_difficulty {
        settings.dynamic_difficulty = dynamic;
    }
    if let Some(difficulty) = body.fixed_difficulty {
        settings.fixed_difficulty = difficulty;
    }
    bc.set_settings(settings);
    info!("SETTINGS - {settings:?}");
    Ok(HttpResponse::Ok().json(settings))
}
