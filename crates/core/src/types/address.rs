//! Postal address types used by order creation.

use serde::{Deserialize, Serialize};

/// Which side of the checkout an address belongs to.
///
/// The order service stores both addresses on the order and distinguishes
/// them only by this tag, so the client stamps it rather than trusting
/// whatever the form carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Shipping,
    Billing,
}

/// A shipping or billing address in the order service's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub address_type: AddressType,
    /// The order service expects this flag; the client always sends `true`.
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_type_uses_screaming_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&AddressType::Shipping).unwrap(),
            "\"SHIPPING\""
        );
        assert_eq!(
            serde_json::to_string(&AddressType::Billing).unwrap(),
            "\"BILLING\""
        );
    }

    #[test]
    fn optional_second_line_is_omitted_when_absent() {
        let address = Address {
            first_name: "Asha".into(),
            last_name: "Verma".into(),
            email: "asha@example.com".into(),
            phone: "+91 98765 43210".into(),
            address_line1: "14 MG Road".into(),
            address_line2: None,
            city: "Bengaluru".into(),
            state: "KA".into(),
            postal_code: "560001".into(),
            country: "IN".into(),
            address_type: AddressType::Shipping,
            is_default: true,
        };

        let json = serde_json::to_value(&address).unwrap();
        assert!(json.get("addressLine2").is_none());
        assert_eq!(json["addressLine1"], "14 MG Road");
        assert_eq!(json["isDefault"], true);
    }
}
