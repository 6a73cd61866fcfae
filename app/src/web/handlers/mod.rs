// voyage_app/src/web/handlers/mod.rs

pub mod activity_handlers;
pub mod admin_handlers;
pub mod auth_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod notification_handlers;
pub mod package_handlers;
pub mod webhook_handlers;
