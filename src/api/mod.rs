mod balance;
mod chain;
mod health;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::print_chain)
            .service(chain::get_block)
            .service(chain::print_block)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(chain::get_settings)
            .service(chain::set_settings)
            .service(tx::post_transaction)
            .service(tx::verify_signature)
            .service(tx::get_mempool)
            .service(tx::print_mempool)
            .service(balance::get_balance)
            .service(stats::get_stats)
            .service(wallet::create_wallet)
            .service(wallet::validate_keys),
    );
}
