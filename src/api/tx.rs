use actix_web::{HttpResponse, Result, get, post, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{
    AppState, MempoolEntry, MempoolResponse, NewTxRequest, NewTxResponse, VerifySignatureRequest,
    VerifySignatureResponse,
};
use crate::error::EngineError;
use crate::transaction::Transaction;
use crate::wallet::verify_signature_hex;

/// Parse a user-typed quantity. Unparsable text is an input error; sign and
/// finiteness are checked when the transaction is built.
fn parse_quantity(field: &str, raw: &str) -> Result<f64, EngineError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| EngineError::InvalidInput(format!("{field} '{raw}' is not a number")))
}

/// Sign a new transaction with the sender's key and queue it for mining.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> Result<HttpResponse> {
    let t0 = Instant::now();
    let req = body.into_inner();

    let amount = parse_quantity("amount", &req.amount)?;
    let fee = parse_quantity("fee", &req.fee)?;

    let tx = Transaction::new_signed(&req.sender, &req.private_key, &req.recipient, amount, fee)
        .inspect_err(|e| warn!("POST /tx/ - rejected: {e}"))?;
    debug!("POST /tx/ - built tx hash={}", tx.hash);

    {
        let mut bc = state.chain()?;
        bc.submit_transaction(tx.clone());
        debug!("POST /tx/ - pool size now {}", bc.pending().len());
    }

    info!(
        "POST /tx/ - hash={} OK ({} ms)",
        tx.hash,
        t0.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(NewTxResponse {
        hash: tx.hash.clone(),
        transaction: tx,
    }))
}

/// Verify a DER signature over a hex digest with the signer's public key.
#[post("/tx/verify/")]
pub async fn verify_signature(body: web::Json<VerifySignatureRequest>) -> Result<HttpResponse> {
    let valid = verify_signature_hex(&body.public_key, &body.signature, &body.digest)?;
    debug!("POST /tx/verify/ - digest={} valid={valid}", body.digest);
    Ok(HttpResponse::Ok().json(VerifySignatureResponse { valid }))
}

/// List current mempool: hashes plus a signature check per entry.
#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bc = state.chain()?;
    let entries = bc
        .pending()
        .iter()
        .map(|t| MempoolEntry {
            hash: t.hash.clone(),
            signature_valid: t.has_valid_signature(),
        })
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(MempoolResponse {
        size: entries.len(),
        transactions: entries,
    }))
}

/// Pending transactions as text.
#[get("/mempool/print/")]
pub async fn print_mempool(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bc = state.chain()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(bc.render_pending()))
}
