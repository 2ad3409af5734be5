//! Invoice content contract.
//!
//! The storefront's invoice generator writes a plain-text file with a fixed
//! name. The checks are exact substring matches; the expected strings are
//! environment-coupled (customer name, order total) and therefore configurable.

use crate::result::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// File name the storefront gives every downloaded invoice
pub const DEFAULT_INVOICE_FILE: &str = "invoice.txt";

/// Expected invoice file name and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceExpectations {
    /// Downloaded file name
    pub file_name: String,
    /// Greeting with the customer's display name
    pub greeting: String,
    /// Total-amount statement
    pub total: String,
    /// Closing thank-you statement
    pub thanks: String,
}

impl Default for InvoiceExpectations {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_INVOICE_FILE.to_string(),
            greeting: "Hi First Name Last Name".to_string(),
            total: "Your total purchase amount is 500".to_string(),
            thanks: "Thank you".to_string(),
        }
    }
}

impl InvoiceExpectations {
    /// Expect a greeting for the given customer name
    #[must_use]
    pub fn with_customer(mut self, display_name: &str) -> Self {
        self.greeting = format!("Hi {display_name}");
        self
    }

    /// Expect the given total amount
    #[must_use]
    pub fn with_total(mut self, amount: u64) -> Self {
        self.total = format!("Your total purchase amount is {amount}");
        self
    }

    /// Expected substrings in checking order
    #[must_use]
    pub fn expected_substrings(&self) -> [&str; 3] {
        [
            self.greeting.as_str(),
            self.total.as_str(),
            self.thanks.as_str(),
        ]
    }

    /// Check invoice text; the first missing substring is reported.
    pub fn verify(&self, content: &str) -> FlowResult<()> {
        for expected in self.expected_substrings() {
            if !content.contains(expected) {
                return Err(FlowError::mismatch(
                    format!("{} content", self.file_name),
                    format!("text containing {expected:?}"),
                    content.trim(),
                ));
            }
        }
        Ok(())
    }
}
