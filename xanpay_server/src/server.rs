use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use custodial_tools::{WalletApi, WalletConfig};
use offramp_tools::{OffRampApi, OffRampConfig};
use xanpay_engine::{MerchantApi, SettlementApi, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        AddProductRoute,
        CreateAccountRoute,
        CreateInvoiceRoute,
        DepositWebhookRoute,
        InvoiceRoute,
        LoginRoute,
        ProductsRoute,
        SigninRoute,
        TransactionsRoute,
        UpdateBankDetailsRoute,
        UpdateProductRoute,
        WithdrawCryptoRoute,
        WithdrawFiatRoute,
    },
    withdrawal::WithdrawalApi,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let offramp = new_offramp_api(config.offramp_config.clone())?;
    let wallet = new_wallet_api(config.wallet_config.clone())?;
    let srv = create_server_instance(config, db, offramp, wallet)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn new_offramp_api(config: OffRampConfig) -> Result<OffRampApi, ServerError> {
    OffRampApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn new_wallet_api(config: WalletConfig) -> Result<WalletApi, ServerError> {
    WalletApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    offramp: OffRampApi,
    wallet: WalletApi,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let merchants_api = MerchantApi::new(db.clone());
        let settlement_api = SettlementApi::new(db.clone());
        let withdrawal_api = WithdrawalApi::new(
            db.clone(),
            offramp.clone(),
            wallet.clone(),
            config.fiat_currency.clone(),
            config.network.clone(),
        );
        let jwt_signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("xpg::access_log"))
            .app_data(web::Data::new(merchants_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(withdrawal_api))
            .app_data(web::Data::new(wallet.clone()))
            .app_data(web::Data::new(jwt_signer));
        // Signed deposit notifications from the wallet provider
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                "X-Webhook-Signature",
                config.webhook.hmac_secret.clone(),
                config.webhook.hmac_checks,
            ))
            .service(DepositWebhookRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(CreateAccountRoute::<SqliteDatabase, WalletApi>::new())
            .service(SigninRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase, WalletApi>::new())
            .service(AddProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(CreateInvoiceRoute::<SqliteDatabase>::new())
            .service(InvoiceRoute::<SqliteDatabase>::new())
            .service(UpdateBankDetailsRoute::<SqliteDatabase>::new())
            .service(TransactionsRoute::<SqliteDatabase>::new())
            .service(WithdrawCryptoRoute::<SqliteDatabase, OffRampApi, WalletApi>::new())
            .service(WithdrawFiatRoute::<SqliteDatabase, OffRampApi, WalletApi>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
