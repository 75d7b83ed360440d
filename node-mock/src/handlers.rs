//! Axum HTTP handlers for the LCD, Tendermint RPC and faucet endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::{MockChain, MockTx, Surface};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockChain>;

type Params = Query<HashMap<String, String>>;

/// Custom error type for handlers
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, message).into_response()
    }
}

fn ensure_up(chain: &MockChain, surface: Surface) -> Result<(), ApiError> {
    if chain.is_down(surface) {
        log::debug!("{:?} surface is switched off", surface);
        return Err(ApiError::Unavailable(format!("{:?} queries disabled", surface)));
    }
    Ok(())
}

/// Split `transfer.sender='cosmos1...'`, optionally wrapped in double quotes.
fn parse_condition(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.trim().trim_matches('"').split_once('=')?;
    Some((
        key.trim().to_string(),
        value.trim().trim_matches('\'').to_string(),
    ))
}

fn limit_param(params: &HashMap<String, String>, key: &str) -> usize {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(100)
}

fn indexed(tx: MockTx) -> IndexedTx {
    let (fee_amount, fee_denom) = split_coin(&tx.fee);
    IndexedTx {
        events: tx.events(),
        txhash: tx.hash,
        height: tx.height.to_string(),
        code: tx.code,
        timestamp: tx.timestamp,
        tx: TxJson {
            body: BodyJson { memo: tx.memo },
            auth_info: AuthInfoJson {
                fee: FeeJson {
                    amount: vec![CoinJson {
                        denom: fee_denom,
                        amount: fee_amount,
                    }],
                    gas_limit: "200000".to_string(),
                },
            },
        },
    }
}

fn split_coin(composite: &str) -> (String, String) {
    let digits = composite
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(composite.len());
    let (amount, denom) = composite.split_at(digits);
    let denom = if denom.is_empty() { "stake" } else { denom };
    (amount.to_string(), denom.to_string())
}

fn encoded(event: Event) -> Event {
    Event {
        kind: event.kind,
        attributes: event
            .attributes
            .into_iter()
            .map(|a| Attribute {
                key: STANDARD.encode(a.key),
                value: STANDARD.encode(a.value),
            })
            .collect(),
    }
}

// ============================================================================
// LCD
// ============================================================================

/// GET /cosmos/auth/v1beta1/accounts/{address}
pub async fn get_account(
    State(chain): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let (number, sequence) = chain
        .account(&address)
        .ok_or_else(|| ApiError::NotFound(format!("account {} not found", address)))?;

    Ok(Json(AccountResponse {
        account: BaseAccount {
            type_url: "/cosmos.auth.v1beta1.BaseAccount".to_string(),
            address,
            account_number: number.to_string(),
            sequence: sequence.to_string(),
        },
    }))
}

/// GET /cosmos/bank/v1beta1/balances/{address}
pub async fn get_balances(
    State(chain): State<AppState>,
    Path(address): Path<String>,
) -> Json<BalancesResponse> {
    let balances = chain
        .balances(&address)
        .into_iter()
        .map(|(denom, amount)| CoinJson {
            denom,
            amount: amount.to_string(),
        })
        .collect();
    Json(BalancesResponse { balances })
}

/// GET /cosmos/tx/v1beta1/txs?events=...|query=...
pub async fn get_txs_by_event(
    State(chain): State<AppState>,
    Query(params): Params,
) -> Result<Json<TxsResponse>, ApiError> {
    ensure_up(&chain, Surface::Indexed)?;

    let condition = params
        .get("events")
        .or_else(|| params.get("query"))
        .and_then(|raw| parse_condition(raw))
        .ok_or_else(|| ApiError::BadRequest("events or query parameter required".to_string()))?;

    let limit = limit_param(&params, "pagination.limit");
    let tx_responses = chain
        .txs_matching(&condition.0, &condition.1, limit)
        .into_iter()
        .map(indexed)
        .collect();
    Ok(Json(TxsResponse { tx_responses }))
}

/// GET /txs?transfer.recipient={address} (pre-0.46 REST)
pub async fn get_legacy_txs(
    State(chain): State<AppState>,
    Query(params): Params,
) -> Result<Json<LegacyTxsResponse>, ApiError> {
    ensure_up(&chain, Surface::Indexed)?;

    let (key, address) = ["transfer.recipient", "transfer.sender", "message.sender"]
        .iter()
        .find_map(|k| params.get(*k).map(|a| (*k, a.clone())))
        .ok_or_else(|| ApiError::BadRequest("event key required".to_string()))?;

    let txs = chain
        .txs_matching(key, &address, limit_param(&params, "limit"))
        .into_iter()
        .map(indexed)
        .collect();
    Ok(Json(LegacyTxsResponse { txs }))
}

/// POST /cosmos/tx/v1beta1/txs
pub async fn broadcast_tx(
    State(chain): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, ApiError> {
    let bytes = STANDARD
        .decode(&req.tx_bytes)
        .map_err(|e| ApiError::BadRequest(format!("tx_bytes is not base64: {}", e)))?;

    let (code, txhash, height, raw_log) = chain.broadcast(&req.tx_bytes, &bytes);
    log::info!("📡 Broadcast ({}) -> code {} hash {}", req.mode, code, txhash);

    Ok(Json(BroadcastResponse {
        tx_response: BroadcastTxResponse {
            code,
            txhash,
            height: height.to_string(),
            raw_log,
        },
    }))
}

// ============================================================================
// Tendermint RPC
// ============================================================================

/// GET /tx_search?query="..."&per_page=N
pub async fn tx_search(
    State(chain): State<AppState>,
    Query(params): Params,
) -> Result<Json<RpcEnvelope<TxSearchResult>>, ApiError> {
    ensure_up(&chain, Surface::Search)?;

    let (key, address) = params
        .get("query")
        .and_then(|raw| parse_condition(raw))
        .ok_or_else(|| ApiError::BadRequest("query parameter required".to_string()))?;

    let txs: Vec<SearchTx> = chain
        .txs_matching(&key, &address, limit_param(&params, "per_page"))
        .into_iter()
        .map(|tx| SearchTx {
            tx_result: TxResult {
                code: tx.code,
                events: tx.events().into_iter().map(encoded).collect(),
            },
            hash: tx.hash,
            height: tx.height.to_string(),
        })
        .collect();

    Ok(Json(RpcEnvelope::new(TxSearchResult {
        total_count: txs.len().to_string(),
        txs,
    })))
}

/// GET /block[?height=N]
pub async fn get_block(
    State(chain): State<AppState>,
    Query(params): Params,
) -> Result<Json<RpcEnvelope<BlockResult>>, ApiError> {
    ensure_up(&chain, Surface::Blocks)?;

    let height = match params.get("height") {
        Some(h) => h
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid height {}", h)))?,
        None => chain.height(),
    };

    let (time, txs) = chain
        .block(height)
        .ok_or_else(|| ApiError::NotFound(format!("height {} is not available", height)))?;

    Ok(Json(RpcEnvelope::new(BlockResult {
        block: Block {
            header: BlockHeader {
                height: height.to_string(),
                time,
            },
            data: BlockData { txs },
        },
    })))
}

// ============================================================================
// Faucet and identity module
// ============================================================================

/// POST /faucet
pub async fn request_faucet(
    State(chain): State<AppState>,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<FaucetResponse>, ApiError> {
    if req.address.trim().is_empty() {
        return Err(ApiError::BadRequest("address required".to_string()));
    }
    let amount = match req.amount.as_deref() {
        Some(a) => a
            .parse::<u128>()
            .map_err(|_| ApiError::BadRequest(format!("invalid amount {}", a)))?,
        None => 1_000_000,
    };

    log::info!("🚰 Faucet {} -> {}", amount, req.address);
    let txhash = chain.faucet(&req.address, amount);
    Ok(Json(FaucetResponse {
        txhash,
        message: "Tokens sent successfully".to_string(),
    }))
}

/// GET /vietchain/identity/identity
pub async fn list_identities(State(chain): State<AppState>) -> Json<IdentityListResponse> {
    Json(IdentityListResponse {
        identity: chain.identities(),
    })
}

/// GET /vietchain/identity/identity/{creator}
pub async fn get_identity(
    State(chain): State<AppState>,
    Path(creator): Path<String>,
) -> Result<Json<IdentityResponse>, ApiError> {
    chain
        .identities()
        .into_iter()
        .find(|i| i.creator == creator)
        .map(|identity| Json(IdentityResponse { identity }))
        .ok_or_else(|| ApiError::NotFound(format!("no identity for {}", creator)))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
