pub mod booking;
pub mod group_buy;
pub mod ledger;
pub mod order;
pub mod payment;
pub mod shipping;
