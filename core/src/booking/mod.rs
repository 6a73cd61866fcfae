// voyage/src/booking/mod.rs

//! Booking lifecycle: the status graph, pricing and the checkout workflow.

pub mod checkout;
pub mod pricing;
pub mod status;

pub use checkout::{CheckoutReceipt, CheckoutService, PaymentGateway, PaymentRequest};
pub use pricing::{BookingQuote, DiscountPolicy, FlatDiscount, NoDiscount, PercentageDiscount, TaxPolicy};
pub use status::BookingStatus;
