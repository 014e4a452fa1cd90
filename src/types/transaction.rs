//! Signed transaction submission requests

use crate::{CustodyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MPC withdrawal endpoint
pub const WITHDRAW_PATH: &str = "api/mpc/billing/withdraw";
/// MPC Web3 transaction endpoint
pub const WEB3_TRANSACTION_PATH: &str = "api/mpc/web3/trans/create";

/// Withdrawal (outbound transfer) request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Caller-chosen unique request ID
    pub request_id: String,
    pub sub_wallet_id: u64,
    /// Coin symbol, e.g. `USDTERC20`
    pub symbol: String,
    pub amount: String,
    pub address_to: String,
    /// Source address to transfer from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Address memo for coins that need one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// UTXO outputs for BTC-like coins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<String>,
    /// Attach a transaction signature
    #[serde(skip)]
    pub need_transaction_sign: bool,
}

impl WithdrawRequest {
    pub fn new(
        request_id: impl Into<String>,
        sub_wallet_id: u64,
        symbol: impl Into<String>,
        amount: impl Into<String>,
        address_to: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            sub_wallet_id,
            symbol: symbol.into(),
            amount: amount.into(),
            address_to: address_to.into(),
            ..Default::default()
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    pub fn with_outputs(mut self, outputs: impl Into<String>) -> Self {
        self.outputs = Some(outputs.into());
        self
    }

    pub fn with_transaction_sign(mut self, need_transaction_sign: bool) -> Self {
        self.need_transaction_sign = need_transaction_sign;
        self
    }

    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        require("request_id", &self.request_id)?;
        if self.sub_wallet_id == 0 {
            return Err(CustodyError::validation("sub_wallet_id", "is required"));
        }
        require("symbol", &self.symbol)?;
        require("amount", &self.amount)?;
        require("address_to", &self.address_to)
    }

    /// Request parameters as sent on the wire (before `sign` is attached)
    pub fn to_params(&self) -> Result<Map<String, Value>> {
        to_params(self)
    }
}

/// Web3 contract interaction request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Web3TransactionRequest {
    pub request_id: String,
    pub sub_wallet_id: u64,
    /// Main chain coin symbol, e.g. `ETH`
    pub main_chain_symbol: String,
    /// Contract address being called
    pub interactive_contract: String,
    pub amount: String,
    /// Gas price in Gwei
    pub gas_price: String,
    pub gas_limit: String,
    /// Hex-encoded call data
    pub input_data: String,
    /// `0` for authorization, `1` for anything else
    pub trans_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dapp_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dapp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dapp_img: Option<String>,
    #[serde(skip)]
    pub need_transaction_sign: bool,
}

impl Web3TransactionRequest {
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the Dapp metadata shown in the custody console
    pub fn with_dapp(
        mut self,
        name: impl Into<String>,
        url: impl Into<String>,
        img: impl Into<String>,
    ) -> Self {
        self.dapp_name = Some(name.into());
        self.dapp_url = Some(url.into());
        self.dapp_img = Some(img.into());
        self
    }

    pub fn with_transaction_sign(mut self, need_transaction_sign: bool) -> Self {
        self.need_transaction_sign = need_transaction_sign;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("request_id", &self.request_id)?;
        if self.sub_wallet_id == 0 {
            return Err(CustodyError::validation("sub_wallet_id", "is required"));
        }
        require("main_chain_symbol", &self.main_chain_symbol)?;
        require("interactive_contract", &self.interactive_contract)?;
        require("amount", &self.amount)?;
        require("gas_price", &self.gas_price)?;
        require("gas_limit", &self.gas_limit)?;
        require("input_data", &self.input_data)?;
        require("trans_type", &self.trans_type)
    }

    pub fn to_params(&self) -> Result<Map<String, Value>> {
        to_params(self)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CustodyError::validation(field, "is required"));
    }
    Ok(())
}

fn to_params<T: Serialize>(request: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(request)? {
        Value::Object(mut map) => {
            // Optional fields set to "" are omitted like unset ones
            map.retain(|_, value| value.as_str() != Some(""));
            Ok(map)
        }
        _ => Err(CustodyError::validation("request", "must serialize to an object")),
    }
}
