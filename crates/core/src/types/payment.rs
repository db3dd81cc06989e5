//! Payment types mirroring the payment service's wire format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, PaymentId};
use super::status::PaymentStatus;

/// Request body for payment creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub firstname: String,
    pub email: String,
    pub amount: Decimal,
}

/// A payment transaction created by the payment service, ready for gateway
/// hand-off.
///
/// Every field is kept as the exact string the service returned: the
/// `secureHash` was computed server-side over these values joined in gateway
/// order, so reformatting any of them (including `amount`) would invalidate
/// the hash. Single-use - submit to the gateway exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub payment_id: PaymentId,
    pub txn_id: String,
    pub amount: String,
    #[serde(rename = "payuUrl")]
    pub gateway_url: String,
    pub key: String,
    pub product_info: String,
    pub firstname: String,
    pub email: String,
    #[serde(rename = "hash")]
    pub secure_hash: String,
    pub surl: String,
    pub furl: String,
}

/// Body of the payment-init record the order service requires before any
/// gateway redirect happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitRecord {
    pub order_id: OrderId,
    pub order_number: String,
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    /// Echoes the intent's amount string verbatim.
    pub amount: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_payment_create_response() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{
                "paymentId": "7",
                "txnId": "TXN-1",
                "amount": "998",
                "payuUrl": "https://test.payu.in/_payment",
                "key": "gtKFFx",
                "productInfo": "Cart Order",
                "firstname": "Asha",
                "email": "asha@example.com",
                "hash": "deadbeef",
                "surl": "http://localhost:8086/api/payment/success",
                "furl": "http://localhost:8086/api/payment/failure"
            }"#,
        )
        .unwrap();

        assert_eq!(intent.payment_id, PaymentId::new("7"));
        assert_eq!(intent.gateway_url, "https://test.payu.in/_payment");
        assert_eq!(intent.secure_hash, "deadbeef");
        // amount is a passthrough string, not a parsed number
        assert_eq!(intent.amount, "998");
    }

    #[test]
    fn init_record_serializes_initiated_status() {
        let record = PaymentInitRecord {
            order_id: OrderId::new(101),
            order_number: "ORD-100".into(),
            payment_id: PaymentId::new("7"),
            status: PaymentStatus::Initiated,
            amount: "998".into(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["orderId"], 101);
        assert_eq!(json["status"], "INITIATED");
        assert_eq!(json["amount"], "998");
    }
}
