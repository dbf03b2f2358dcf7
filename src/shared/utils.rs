//! Utility functions and helpers

use rust_decimal::Decimal;

/// Format amount for display, trimming trailing zeros
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Generate unique request ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
