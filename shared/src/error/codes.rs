//! Unified error codes for the pay server
//!
//! This module defines all error codes used across the server and its
//! clients. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Customer directory errors
//! - 4xxx: Order errors
//! - 5xxx: Payment gateway errors
//! - 6xxx: Inventory errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Customer ====================
    /// Customer not found in the user directory
    CustomerNotFound = 1001,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order already exists
    OrderAlreadyExists = 4002,
    /// Order has no line items
    OrderEmpty = 4003,

    // ==================== 5xxx: Payment Gateway ====================
    /// Payment gateway request failed
    GatewayError = 5001,
    /// Gateway response did not contain a session token
    GatewayTokenMissing = 5002,
    /// Gateway rejected the transaction request
    GatewayRejected = 5003,
    /// Invalid monetary amount
    InvalidAmount = 5004,

    // ==================== 6xxx: Inventory ====================
    /// Ingredient not found in the inventory ledger
    IngredientNotFound = 6001,
    /// Menu item not found
    MenuItemNotFound = 6002,
    /// Consumable item not found
    ConsumableNotFound = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Network error
    NetworkError = 9101,
    /// Operation timed out
    TimeoutError = 9102,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the stable machine-readable kind for this error code
    ///
    /// This string is part of the API contract and never changes for a
    /// given code.
    pub const fn kind(&self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::Unknown => "unknown",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidFormat => "invalid_format",
            ErrorCode::RequiredField => "required_field",
            ErrorCode::ValueOutOfRange => "value_out_of_range",

            ErrorCode::CustomerNotFound => "customer_not_found",

            ErrorCode::OrderNotFound => "order_not_found",
            ErrorCode::OrderAlreadyExists => "order_already_exists",
            ErrorCode::OrderEmpty => "order_empty",

            ErrorCode::GatewayError => "gateway_error",
            ErrorCode::GatewayTokenMissing => "gateway_token_missing",
            ErrorCode::GatewayRejected => "gateway_rejected",
            ErrorCode::InvalidAmount => "invalid_amount",

            ErrorCode::IngredientNotFound => "ingredient_not_found",
            ErrorCode::MenuItemNotFound => "menu_item_not_found",
            ErrorCode::ConsumableNotFound => "consumable_not_found",

            ErrorCode::InternalError => "internal_error",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::ConfigError => "config_error",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::TimeoutError => "timeout_error",
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Customer
            ErrorCode::CustomerNotFound => "Customer not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyExists => "Order already exists",
            ErrorCode::OrderEmpty => "Order has no line items",

            // Payment gateway
            ErrorCode::GatewayError => "Payment gateway request failed",
            ErrorCode::GatewayTokenMissing => "Gateway response did not contain a session token",
            ErrorCode::GatewayRejected => "Payment gateway rejected the request",
            ErrorCode::InvalidAmount => "Invalid monetary amount",

            // Inventory
            ErrorCode::IngredientNotFound => "Ingredient not found in inventory",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::ConsumableNotFound => "Consumable item not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Customer
            1001 => Ok(ErrorCode::CustomerNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyExists),
            4003 => Ok(ErrorCode::OrderEmpty),

            // Payment gateway
            5001 => Ok(ErrorCode::GatewayError),
            5002 => Ok(ErrorCode::GatewayTokenMissing),
            5003 => Ok(ErrorCode::GatewayRejected),
            5004 => Ok(ErrorCode::InvalidAmount),

            // Inventory
            6001 => Ok(ErrorCode::IngredientNotFound),
            6002 => Ok(ErrorCode::MenuItemNotFound),
            6003 => Ok(ErrorCode::ConsumableNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9101 => Ok(ErrorCode::NetworkError),
            9102 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
