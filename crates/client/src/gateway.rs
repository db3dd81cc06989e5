//! The one-shot gateway redirect form.
//!
//! The payment gateway is entered by browser navigation: a form POST to the
//! gateway URL carrying the fields the payment service signed. Submitting it
//! is terminal by design - control leaves the client and no engine code runs
//! afterwards. The engine therefore produces the form as data (plus a
//! rendered auto-submitting page) and hands it to the embedding shell; it
//! never "follows" the redirect itself.

use askama::Template;

use marigold_core::{Order, PaymentIntent};

/// A ready-to-submit gateway form.
///
/// Field values are the exact strings returned by the payment service; the
/// `hash` field was computed server-side over them, so any reformatting here
/// would be rejected by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRedirect {
    action: String,
    fields: Vec<(&'static str, String)>,
}

#[derive(Template)]
#[template(path = "gateway_redirect.html")]
struct RedirectPage<'a> {
    action: &'a str,
    fields: &'a [(&'static str, String)],
}

impl GatewayRedirect {
    /// Build the form for an order/intent pair.
    ///
    /// `udf1`/`udf2` carry the order and payment IDs so the gateway's
    /// success/failure callbacks can correlate the transaction back to both
    /// records.
    #[must_use]
    pub fn new(order: &Order, intent: &PaymentIntent) -> Self {
        Self {
            action: intent.gateway_url.clone(),
            fields: vec![
                ("key", intent.key.clone()),
                ("txnid", intent.txn_id.clone()),
                ("amount", intent.amount.clone()),
                ("productinfo", intent.product_info.clone()),
                ("firstname", intent.firstname.clone()),
                ("email", intent.email.clone()),
                ("hash", intent.secure_hash.clone()),
                ("surl", intent.surl.clone()),
                ("furl", intent.furl.clone()),
                ("udf1", order.id.to_string()),
                ("udf2", intent.payment_id.to_string()),
            ],
        }
    }

    /// The gateway URL the form posts to.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The hidden fields in gateway submission order.
    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Look up a single field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Render the auto-submitting HTML page for this form.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn to_html(&self) -> Result<String, askama::Error> {
        RedirectPage {
            action: &self.action,
            fields: &self.fields,
        }
        .render()
    }
}

#[cfg(test)]
mod tests {
    use marigold_core::{OrderId, PaymentId};

    use super::*;

    fn order() -> Order {
        serde_json::from_str(r#"{"id": 101, "orderNumber": "ORD-100", "totalAmount": "998"}"#)
            .unwrap()
    }

    fn intent() -> PaymentIntent {
        PaymentIntent {
            payment_id: PaymentId::new("PAY-1"),
            txn_id: "TXN-1".into(),
            amount: "998".into(),
            gateway_url: "https://test.payu.in/_payment".into(),
            key: "gtKFFx".into(),
            product_info: "Cart Order".into(),
            firstname: "Asha".into(),
            email: "asha@example.com".into(),
            secure_hash: "H".into(),
            surl: "http://localhost:8086/api/payment/success".into(),
            furl: "http://localhost:8086/api/payment/failure".into(),
        }
    }

    #[test]
    fn carries_all_gateway_fields_in_order() {
        let form = GatewayRedirect::new(&order(), &intent());

        assert_eq!(form.action(), "https://test.payu.in/_payment");
        let names: Vec<&str> = form.fields().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "key",
                "txnid",
                "amount",
                "productinfo",
                "firstname",
                "email",
                "hash",
                "surl",
                "furl",
                "udf1",
                "udf2"
            ]
        );

        assert_eq!(form.field("amount"), Some("998"));
        assert_eq!(form.field("udf1"), Some("101"));
        assert_eq!(form.field("udf2"), Some("PAY-1"));
        assert_eq!(form.field("hash"), Some("H"));
        assert_eq!(order().id, OrderId::new(101));
    }

    #[test]
    fn renders_hidden_inputs() {
        let html = GatewayRedirect::new(&order(), &intent()).to_html().unwrap();

        assert!(html.contains(r#"action="https://test.payu.in/_payment""#));
        assert!(html.contains(r#"name="txnid" value="TXN-1""#));
        assert!(html.contains(r#"name="udf2" value="PAY-1""#));
        assert!(html.contains("document.forms[0].submit()"));
    }

    #[test]
    fn escapes_field_values() {
        let mut intent = intent();
        intent.firstname = r#"Asha" /><script>"#.into();
        let html = GatewayRedirect::new(&order(), &intent).to_html().unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&quot;") || html.contains("&#34;"));
    }
}
