pub mod cbr_rates;
pub mod gateways;
