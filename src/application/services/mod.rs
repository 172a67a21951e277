pub mod booking_settlement;
pub mod group_buy_settlement;
pub mod payment_engine;
pub mod shipping_quotes;
