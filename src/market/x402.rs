//! x402 — USDC payment for skill endpoints that answer HTTP 402.
//!
//! A 402 response lists the payment requirements the endpoint accepts. The
//! client signs an EIP-3009 `TransferWithAuthorization` for the first `exact`
//! requirement and resubmits the request with the signed payload, base64
//! encoded, in the `X-PAYMENT` header.

use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use tracing::info;

use super::MarketError;
use crate::identity::Wallet;

/// Request header carrying the signed payment payload.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

const X402_VERSION: u32 = 1;

/// `validAfter` is backdated to tolerate clock skew with the facilitator.
const CLOCK_SKEW_SECS: u64 = 60;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const TRANSFER_WITH_AUTHORIZATION_TYPE: &[u8] = b"TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)";

/// Body of a 402 response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    #[serde(default)]
    pub x402_version: u32,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One accepted way to pay for a resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Atomic token units (USDC has 6 decimals).
    pub max_amount_required: String,
    #[serde(default)]
    pub resource: String,
    pub pay_to: String,
    /// Token contract address.
    pub asset: String,
    #[serde(default = "default_timeout")]
    pub max_timeout_seconds: u64,
    /// EIP-712 domain name/version of the token contract.
    #[serde(default)]
    pub extra: Option<TokenDomain>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenDomain {
    pub name: String,
    pub version: String,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// -- Payment payload (header contents) ---------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: ExactPayload,
}

#[derive(Debug, Serialize)]
pub struct ExactPayload {
    pub signature: String,
    pub authorization: Authorization,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
}

// -- EIP-712 ------------------------------------------------------------------

struct Eip712Domain<'a> {
    name: &'a str,
    version: &'a str,
    chain_id: u64,
    verifying_contract: [u8; 20],
}

impl Eip712Domain<'_> {
    fn separator(&self) -> [u8; 32] {
        keccak(
            &[
                keccak(DOMAIN_TYPE),
                keccak(self.name.as_bytes()),
                keccak(self.version.as_bytes()),
                uint_word(u128::from(self.chain_id)),
                address_word(&self.verifying_contract),
            ]
            .concat(),
        )
    }
}

struct TransferWithAuthorization {
    from: [u8; 20],
    to: [u8; 20],
    value: u128,
    valid_after: u64,
    valid_before: u64,
    nonce: [u8; 32],
}

impl TransferWithAuthorization {
    fn struct_hash(&self) -> [u8; 32] {
        keccak(
            &[
                keccak(TRANSFER_WITH_AUTHORIZATION_TYPE),
                address_word(&self.from),
                address_word(&self.to),
                uint_word(self.value),
                uint_word(u128::from(self.valid_after)),
                uint_word(u128::from(self.valid_before)),
                self.nonce,
            ]
            .concat(),
        )
    }

    /// keccak256("\x19\x01" || domainSeparator || structHash)
    fn signing_hash(&self, domain: &Eip712Domain<'_>) -> [u8; 32] {
        keccak(&[&b"\x19\x01"[..], &domain.separator()[..], &self.struct_hash()[..]].concat())
    }

    fn to_authorization(&self) -> Authorization {
        Authorization {
            from: format!("0x{}", hex::encode(self.from)),
            to: format!("0x{}", hex::encode(self.to)),
            value: self.value.to_string(),
            valid_after: self.valid_after.to_string(),
            valid_before: self.valid_before.to_string(),
            nonce: format!("0x{}", hex::encode(self.nonce)),
        }
    }
}

fn keccak(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

fn parse_address(address: &str) -> Result<[u8; 20], MarketError> {
    let bytes = hex::decode(address.trim_start_matches("0x"))
        .map_err(|_| MarketError::Payment(format!("invalid address '{}'", address)))?;
    bytes
        .try_into()
        .map_err(|_| MarketError::Payment(format!("invalid address '{}'", address)))
}

/// Chain id and default USDC EIP-712 domain for supported networks.
fn network_params(network: &str) -> Option<(u64, &'static str, &'static str)> {
    match network {
        "base" => Some((8453, "USD Coin", "2")),
        "base-sepolia" => Some((84532, "USDC", "2")),
        _ => None,
    }
}

// -- Public API -------------------------------------------------------------

/// Pick a payment requirement and produce the `X-PAYMENT` header value.
pub fn payment_header(wallet: &Wallet, required: &PaymentRequired) -> Result<String, MarketError> {
    let requirements = select_requirements(required)?;

    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    let mut nonce = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    info!(
        amount = %requirements.max_amount_required,
        pay_to = %requirements.pay_to,
        network = %requirements.network,
        "Signing x402 payment authorization"
    );

    let payload = sign_payment(wallet, requirements, now, nonce)?;
    let json = serde_json::to_vec(&payload).map_err(|e| MarketError::Payment(e.to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

fn select_requirements(required: &PaymentRequired) -> Result<&PaymentRequirements, MarketError> {
    required
        .accepts
        .iter()
        .find(|r| r.scheme == "exact")
        .ok_or_else(|| {
            MarketError::Payment(
                required
                    .error
                    .clone()
                    .unwrap_or_else(|| "no supported payment scheme offered".into()),
            )
        })
}

/// Sign an `exact` scheme payment for the given requirements.
pub fn sign_payment(
    wallet: &Wallet,
    requirements: &PaymentRequirements,
    now: u64,
    nonce: [u8; 32],
) -> Result<PaymentPayload, MarketError> {
    let (chain_id, default_name, default_version) = network_params(&requirements.network)
        .ok_or_else(|| {
            MarketError::Payment(format!("unsupported network '{}'", requirements.network))
        })?;

    let (name, version) = match &requirements.extra {
        Some(domain) => (domain.name.as_str(), domain.version.as_str()),
        None => (default_name, default_version),
    };

    let domain = Eip712Domain {
        name,
        version,
        chain_id,
        verifying_contract: parse_address(&requirements.asset)?,
    };

    let value = requirements.max_amount_required.parse::<u128>().map_err(|_| {
        MarketError::Payment(format!(
            "invalid amount '{}'",
            requirements.max_amount_required
        ))
    })?;

    let transfer = TransferWithAuthorization {
        from: wallet.address_bytes(),
        to: parse_address(&requirements.pay_to)?,
        value,
        valid_after: now.saturating_sub(CLOCK_SKEW_SECS),
        valid_before: now.saturating_add(requirements.max_timeout_seconds),
        nonce,
    };

    let signature = wallet
        .sign_hash(&transfer.signing_hash(&domain))
        .map_err(|e| MarketError::Payment(e.to_string()))?;

    Ok(PaymentPayload {
        x402_version: X402_VERSION,
        scheme: requirements.scheme.clone(),
        network: requirements.network.clone(),
        payload: ExactPayload {
            signature: format!("0x{}", hex::encode(signature)),
            authorization: transfer.to_authorization(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::wallet::address_of;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const USDC_BASE: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
    const PAY_TO: &str = "0x1111111111111111111111111111111111111111";

    fn requirements(network: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: network.into(),
            max_amount_required: "10000".into(),
            resource: "https://skills.example/run".into(),
            pay_to: PAY_TO.into(),
            asset: USDC_BASE.into(),
            max_timeout_seconds: 300,
            extra: None,
        }
    }

    #[test]
    fn signed_authorization_recovers_to_payer() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        let nonce = [7u8; 32];
        let payload = sign_payment(&wallet, &requirements("base"), 1_700_000_000, nonce).unwrap();

        let auth = &payload.payload.authorization;
        assert_eq!(auth.from, wallet.address.to_lowercase());
        assert_eq!(auth.to, PAY_TO);
        assert_eq!(auth.value, "10000");
        assert_eq!(auth.valid_after, "1699999940");
        assert_eq!(auth.valid_before, "1700000300");

        let transfer = TransferWithAuthorization {
            from: wallet.address_bytes(),
            to: parse_address(PAY_TO).unwrap(),
            value: 10_000,
            valid_after: 1_699_999_940,
            valid_before: 1_700_000_300,
            nonce,
        };
        let domain = Eip712Domain {
            name: "USD Coin",
            version: "2",
            chain_id: 8453,
            verifying_contract: parse_address(USDC_BASE).unwrap(),
        };
        let hash = transfer.signing_hash(&domain);

        let sig = hex::decode(payload.payload.signature.trim_start_matches("0x")).unwrap();
        assert_eq!(sig.len(), 65);
        let signature = Signature::from_slice(&sig[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(sig[64] - 27).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(&hash, &signature, recovery_id).unwrap();
        assert_eq!(address_of(&recovered), wallet.address);
    }

    #[test]
    fn header_is_base64_json() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        let required = PaymentRequired {
            x402_version: 1,
            accepts: vec![requirements("base-sepolia")],
            error: None,
        };

        let header = payment_header(&wallet, &required).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(header)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(json["x402Version"], 1);
        assert_eq!(json["scheme"], "exact");
        assert_eq!(json["network"], "base-sepolia");
        assert!(json["payload"]["authorization"]["nonce"].is_string());
    }

    #[test]
    fn rejects_unsupported_offers() {
        let wallet = Wallet::from_private_key(KEY).unwrap();

        let err = sign_payment(&wallet, &requirements("solana"), 0, [0u8; 32]).unwrap_err();
        assert!(err.to_string().contains("unsupported network"));

        let mut upto = requirements("base");
        upto.scheme = "upto".into();
        let required = PaymentRequired {
            x402_version: 1,
            accepts: vec![upto],
            error: Some("insufficient funds".into()),
        };
        let err = payment_header(&wallet, &required).unwrap_err();
        assert_eq!(err.to_string(), "payment failed: insufficient funds");
    }

    #[test]
    fn parses_requirements_from_402_body() {
        let body = serde_json::json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base",
                "maxAmountRequired": "2500",
                "resource": "https://skills.example/run",
                "payTo": PAY_TO,
                "asset": USDC_BASE,
                "maxTimeoutSeconds": 120,
                "extra": { "name": "USD Coin", "version": "2" }
            }]
        });
        let required: PaymentRequired = serde_json::from_value(body).unwrap();
        let chosen = select_requirements(&required).unwrap();
        assert_eq!(chosen.max_amount_required, "2500");
        assert_eq!(chosen.extra.as_ref().unwrap().name, "USD Coin");
    }
}
