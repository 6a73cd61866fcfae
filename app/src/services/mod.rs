// voyage_app/src/services/mod.rs

pub mod payment_mock;
pub mod push_mock;

pub use payment_mock::MockPaymentGateway;
pub use push_mock::MockPushTransport;
