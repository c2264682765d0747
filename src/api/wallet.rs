use actix_web::{HttpResponse, post, web};

use super::models::{NewWalletResponse, ValidateKeysRequest, ValidateKeysResponse};
use crate::wallet::{generate_keypair_hex, verify_keys};

#[post("/wallet/new/")]
pub async fn create_wallet() -> HttpResponse {
    let (sk, pk, addr) = generate_keypair_hex();
    HttpResponse::Ok().json(NewWalletResponse {
        private_key: sk,
        public_key: pk,
        address: addr,
    })
}

/// Does the private key belong to the public key?
#[post("/wallet/validate/")]
pub async fn validate_keys(body: web::Json<ValidateKeysRequest>) -> HttpResponse {
    HttpResponse::Ok().json(ValidateKeysResponse {
        valid: verify_keys(&body.private_key, &body.public_key),
    })
}
