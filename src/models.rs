//! Domain enumerations shared across services and handlers.
//!
//! The database stores these as plain strings; parsing through the enums is
//! what enforces membership validation at the API boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Order lifecycle. Any member status may be assigned directly; only
/// membership is validated, not transition order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Diterima,
    Dicuci,
    Dikeringkan,
    Disetrika,
    Selesai,
    Diambil,
    Dibatalkan,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    BelumBayar,
    SudahBayar,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Tunai,
    Transfer,
    Qris,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Kiloan,
    Satuan,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Kasir,
}

pub fn parse_order_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw)
        .map_err(|_| ServiceError::ValidationError("Status tidak valid".to_string()))
}

pub fn parse_payment_status(raw: &str) -> Result<PaymentStatus, ServiceError> {
    PaymentStatus::from_str(raw)
        .map_err(|_| ServiceError::ValidationError("Status pembayaran tidak valid".to_string()))
}

pub fn parse_payment_method(raw: &str) -> Result<PaymentMethod, ServiceError> {
    PaymentMethod::from_str(raw)
        .map_err(|_| ServiceError::ValidationError("Metode pembayaran tidak valid".to_string()))
}

pub fn parse_service_type(raw: &str) -> Result<ServiceType, ServiceError> {
    ServiceType::from_str(raw)
        .map_err(|_| ServiceError::ValidationError("Tipe layanan tidak valid".to_string()))
}

pub fn parse_role(raw: &str) -> Result<Role, ServiceError> {
    Role::from_str(raw).map_err(|_| ServiceError::ValidationError("Role tidak valid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in OrderStatus::iter() {
            let raw = status.to_string();
            assert_eq!(parse_order_status(&raw).unwrap(), status);
        }
    }

    #[test]
    fn order_status_uses_screaming_snake_case() {
        assert_eq!(OrderStatus::Diterima.to_string(), "DITERIMA");
        assert_eq!(OrderStatus::Dibatalkan.to_string(), "DIBATALKAN");
        assert_eq!(PaymentStatus::BelumBayar.to_string(), "BELUM_BAYAR");
        assert_eq!(PaymentStatus::SudahBayar.to_string(), "SUDAH_BAYAR");
    }

    #[rstest::rstest]
    #[case("SEDANG_DICUCI")]
    #[case("diterima")]
    #[case("")]
    fn unknown_status_is_rejected(#[case] raw: &str) {
        assert!(parse_order_status(raw).is_err());
    }

    #[test]
    fn unknown_method_and_role_are_rejected() {
        assert!(parse_payment_method("KARTU").is_err());
        assert!(parse_role("ADMIN").is_err());
    }
}
