//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the backend and provider traits so that endpoint tests can swap in
//! mocks; the concrete types are fixed once, in [`crate::server`].

use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use custodial_tools::CustodialWallet;
use log::*;
use offramp_tools::OffRamp;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use xanpay_engine::{
    db_types::{BankDetails, NewInvoice, NewMerchant, NewProduct, ProductUpdate},
    traits::PaymentsDatabase,
    DepositOutcome,
    IncomingDeposit,
    MerchantApi,
    SettlementApi,
};
use xpg_common::MicroUsdc;

use crate::{
    auth::{hash_password, verify_password, JwtClaims, TokenIssuer},
    data_objects::{
        AuthResponse,
        BusinessProfile,
        CreateAccountRequest,
        CreateInvoiceRequest,
        DepositWebhookPayload,
        InvoiceCreatedResponse,
        JsonResponse,
        NewProductRequest,
        PublicInvoice,
        SigninRequest,
        UpdateProductRequest,
        WithdrawCryptoRequest,
        WithdrawFiatRequest,
    },
    errors::{AuthError, ServerError},
    withdrawal::WithdrawalApi,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Onboarding  ----------------------------------------------------
route!(create_account => Post "/createAccount" impl PaymentsDatabase, CustodialWallet);
/// Onboards a new merchant.
///
/// A custodial deposit address is allocated from the wallet provider first; only if that
/// succeeds is the merchant record created, so a merchant row never exists without an address to
/// receive on. Returns a bearer token plus the new business profile.
pub async fn create_account<B: PaymentsDatabase, W: CustodialWallet>(
    api: web::Data<MerchantApi<B>>,
    wallet: web::Data<W>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<CreateAccountRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.business_name.trim().is_empty() {
        return Err(ServerError::ValidationError("businessName must not be empty".to_string()));
    }
    if !req.email.contains('@') {
        return Err(ServerError::ValidationError("email is not valid".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ServerError::ValidationError("password must be at least 8 characters".to_string()));
    }
    let subject_id: String = thread_rng().sample_iter(&Alphanumeric).take(24).map(char::from).collect();
    let address = wallet.create_address(&format!("merchant:{}", req.email)).await.map_err(|e| {
        warn!("💻️ Could not allocate a deposit address for {}. {e}", req.email);
        ServerError::ProviderError
    })?;
    let merchant = api
        .register_merchant(NewMerchant {
            subject_id: subject_id.clone(),
            email: req.email,
            password_hash: hash_password(&req.password),
            business_name: req.business_name,
            business_image: req.business_image,
            deposit_address: address.address,
            provider_address_id: address.id,
        })
        .await?;
    let token = signer.issue_token(&subject_id)?;
    let business = BusinessProfile::from_merchant(&merchant, MicroUsdc::from_units(0));
    Ok(HttpResponse::Ok().json(AuthResponse { token, business }))
}

route!(signin => Post "/signin" impl PaymentsDatabase);
/// Email + password check. Succeeds with a fresh bearer token; the live balance is fetched via
/// `/login`, not here.
pub async fn signin<B: PaymentsDatabase>(
    api: web::Data<MerchantApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<SigninRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let merchant = api
        .merchant_by_email(req.email.trim())
        .await?
        .ok_or(ServerError::AuthenticationError(AuthError::InvalidCredentials))?;
    if !verify_password(&req.password, &merchant.password_hash) {
        debug!("💻️ Password mismatch for {}", merchant.email);
        return Err(AuthError::InvalidCredentials.into());
    }
    let token = signer.issue_token(&merchant.subject_id)?;
    let business = BusinessProfile::from_merchant(&merchant, MicroUsdc::from_units(0));
    Ok(HttpResponse::Ok().json(AuthResponse { token, business }))
}

route!(login => Post "/login" impl PaymentsDatabase, CustodialWallet);
/// Returns the merchant profile together with the live custodial balance from the wallet
/// provider. The local ledger is a record, not the source of truth for spendable balance.
pub async fn login<B: PaymentsDatabase, W: CustodialWallet>(
    claims: JwtClaims,
    api: web::Data<MerchantApi<B>>,
    wallet: web::Data<W>,
) -> Result<HttpResponse, ServerError> {
    let merchant = merchant_for(&claims, api.as_ref()).await?;
    let balance = wallet.fetch_balance(&merchant.provider_address_id).await.map_err(|e| {
        warn!("💻️ Could not fetch balance for merchant #{}. {e}", merchant.id);
        ServerError::ProviderError
    })?;
    Ok(HttpResponse::Ok().json(BusinessProfile::from_merchant(&merchant, balance)))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(add_product => Post "/addProduct" impl PaymentsDatabase);
pub async fn add_product<B: PaymentsDatabase>(
    claims: JwtClaims,
    api: web::Data<MerchantApi<B>>,
    body: web::Json<NewProductRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.name.trim().is_empty() {
        return Err(ServerError::ValidationError("name must not be empty".to_string()));
    }
    let price = positive_amount(req.price)?;
    if req.quantity < 0 {
        return Err(ServerError::ValidationError("quantity must not be negative".to_string()));
    }
    let merchant = merchant_for(&claims, api.as_ref()).await?;
    let product = api
        .add_product(NewProduct {
            merchant_id: merchant.id,
            name: req.name,
            image: req.image,
            price,
            currency: req.currency,
            quantity: req.quantity,
        })
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Put "/updateProduct/{id}" impl PaymentsDatabase);
pub async fn update_product<B: PaymentsDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<MerchantApi<B>>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let req = body.into_inner();
    let price = req.price.map(positive_amount).transpose()?;
    if matches!(req.quantity, Some(q) if q < 0) {
        return Err(ServerError::ValidationError("quantity must not be negative".to_string()));
    }
    let update =
        ProductUpdate { name: req.name, image: req.image, price, currency: req.currency, quantity: req.quantity };
    let merchant = merchant_for(&claims, api.as_ref()).await?;
    let product = api.update_product(merchant.id, product_id, update).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(products => Get "/products" impl PaymentsDatabase);
pub async fn products<B: PaymentsDatabase>(
    claims: JwtClaims,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let merchant = merchant_for(&claims, api.as_ref()).await?;
    let products = api.products_for_merchant(merchant.id).await?;
    Ok(HttpResponse::Ok().json(products))
}

//----------------------------------------------   Invoices  ----------------------------------------------------
route!(create_invoice => Post "/createInvoice" impl PaymentsDatabase);
pub async fn create_invoice<B: PaymentsDatabase>(
    claims: JwtClaims,
    merchants: web::Data<MerchantApi<B>>,
    api: web::Data<SettlementApi<B>>,
    body: web::Json<CreateInvoiceRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.quantity <= 0 {
        return Err(ServerError::ValidationError("quantity must be positive".to_string()));
    }
    let merchant = merchant_for(&claims, merchants.as_ref()).await?;
    let invoice = api
        .create_invoice(NewInvoice { merchant_id: merchant.id, product_id: req.product_id, quantity: req.quantity })
        .await?;
    Ok(HttpResponse::Ok().json(InvoiceCreatedResponse { invoice_code: invoice.code, valid_until: invoice.valid_until }))
}

route!(invoice => Get "/invoice/{code}" impl PaymentsDatabase);
/// Public, unauthenticated invoice lookup for buyers. Scans across merchants, so it exposes only
/// display fields and the deposit address to pay to. Only open invoices are visible: a paid or
/// expired one is indistinguishable from a code that never existed.
pub async fn invoice<B: PaymentsDatabase>(
    path: web::Path<String>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let code = path.into_inner().trim().to_uppercase();
    let invoice =
        api.invoice_by_code(&code).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Invoice {code}")))?;
    if invoice.paid || invoice.is_expired_at(Utc::now()) {
        debug!("💻️ Invoice {code} is no longer payable");
        return Err(ServerError::NoRecordFound(format!("Invoice {code}")));
    }
    let merchant = api
        .merchant_by_id(invoice.merchant_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Invoice {code}")))?;
    let product = api
        .product(invoice.merchant_id, invoice.product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product for invoice {code}")))?;
    let view = PublicInvoice::assemble(&invoice, &product, &merchant)
        .ok_or_else(|| ServerError::BackendError(format!("Invoice {code} total overflows the representable amount")))?;
    Ok(HttpResponse::Ok().json(view))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(deposit_webhook => Post "/deposit" impl PaymentsDatabase);
/// Deposit notifications from the wallet provider.
///
/// Delivery is at-least-once and unordered, so this handler acknowledges with 200 for every
/// payload it has durably evaluated, including settlement failures; a retry would fail the same
/// checks. Only a backend error returns 5xx, making the provider redeliver.
pub async fn deposit_webhook<B: PaymentsDatabase>(
    api: web::Data<SettlementApi<B>>,
    body: web::Json<DepositWebhookPayload>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    if payload.event != "deposit.success" {
        trace!("💻️ Ignoring {} webhook", payload.event);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("ignored")));
    }
    let event = payload.data;
    let Ok(amount) = event.amount.parse::<MicroUsdc>() else {
        warn!("💻️ Deposit webhook for {} carries an unparseable amount: {}", event.recipient_address, event.amount);
        return Ok(HttpResponse::Ok().json(JsonResponse::failure("unparseable amount")));
    };
    let deposit = IncomingDeposit {
        deposit_address: event.recipient_address,
        amount,
        currency: event.currency,
        note: event.note,
        tx_hash: event.hash,
    };
    let outcome = api.apply_deposit(deposit).await?;
    let message = match outcome {
        DepositOutcome::Settled(result) => format!("invoice {} settled", result.invoice_code),
        DepositOutcome::Credited(_) => "deposit credited".to_string(),
        DepositOutcome::SettlementFailed(e) => format!("settlement failed: {e}"),
        DepositOutcome::Unattributable => "unattributable deposit".to_string(),
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Account  ----------------------------------------------------
route!(update_bank_details => Post "/updateBankDetails" impl PaymentsDatabase);
pub async fn update_bank_details<B: PaymentsDatabase>(
    claims: JwtClaims,
    api: web::Data<MerchantApi<B>>,
    body: web::Json<BankDetails>,
) -> Result<HttpResponse, ServerError> {
    let details = body.into_inner();
    if details.institution.trim().is_empty() ||
        details.account_number.trim().is_empty() ||
        details.account_name.trim().is_empty()
    {
        return Err(ServerError::ValidationError("All bank detail fields are required".to_string()));
    }
    let merchant = merchant_for(&claims, api.as_ref()).await?;
    api.update_bank_details(merchant.id, details).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Bank details updated")))
}

route!(transactions => Get "/transactions" impl PaymentsDatabase);
pub async fn transactions<B: PaymentsDatabase>(
    claims: JwtClaims,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let merchant = merchant_for(&claims, api.as_ref()).await?;
    let history = api.history_for_merchant(merchant.id).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------
route!(withdraw_crypto => Post "/withdrawCrypto" impl PaymentsDatabase, OffRamp, CustodialWallet);
pub async fn withdraw_crypto<B: PaymentsDatabase, O: OffRamp, W: CustodialWallet>(
    claims: JwtClaims,
    api: web::Data<WithdrawalApi<B, O, W>>,
    body: web::Json<WithdrawCryptoRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.address.trim().is_empty() {
        return Err(ServerError::ValidationError("address must not be empty".to_string()));
    }
    let amount = positive_amount(req.amount)?;
    let result = api.withdraw_crypto(&claims.sub, req.address.trim(), amount).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(withdraw_fiat => Post "/withdrawFiat" impl PaymentsDatabase, OffRamp, CustodialWallet);
pub async fn withdraw_fiat<B: PaymentsDatabase, O: OffRamp, W: CustodialWallet>(
    claims: JwtClaims,
    api: web::Data<WithdrawalApi<B, O, W>>,
    body: web::Json<WithdrawFiatRequest>,
) -> Result<HttpResponse, ServerError> {
    let amount = positive_amount(body.into_inner().amount)?;
    let result = api.withdraw_fiat(&claims.sub, amount).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Helpers  ----------------------------------------------------

async fn merchant_for<B: PaymentsDatabase>(
    claims: &JwtClaims,
    api: &MerchantApi<B>,
) -> Result<xanpay_engine::db_types::Merchant, ServerError> {
    api.merchant_by_subject(&claims.sub)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No merchant for subject {}", claims.sub)))
}

fn positive_amount(value: f64) -> Result<MicroUsdc, ServerError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ServerError::ValidationError("amount must be positive".to_string()));
    }
    Ok(MicroUsdc::from_units_f64(value))
}
