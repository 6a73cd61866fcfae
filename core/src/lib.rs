// src/lib.rs

//! Voyage: the booking core of a travel-package marketplace.
//!
//! - A document-store boundary with an in-memory backend and a change feed
//!   that drives live subscriptions.
//! - Repositories for catalog, carts, bookings, payments, users, activity
//!   lists and notifications.
//! - The booking status graph, pricing and the checkout workflow.
//! - Scheduled notifications with deferred, tag-cancellable dispatch.
//! - An authentication boundary and push/local messaging surfaces.
//!
//! Multi-step flows run on the small async step engine in [`workflow`].

pub mod auth;
pub mod booking;
pub mod clock;
pub mod error;
pub mod messaging;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod services;
pub mod settings;
pub mod store;
pub mod view;
pub mod workflow;

pub use crate::booking::{BookingStatus, CheckoutReceipt, CheckoutService, PaymentGateway, PaymentRequest};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{AuthFailure, FieldErrors, StoreError, VoyageError, VoyageResult, WorkflowError};
pub use crate::scheduler::{NotificationScheduler, ScheduleRequest};
pub use crate::services::Voyage;
pub use crate::settings::VoyageSettings;
pub use crate::store::{DocumentStore, MemoryStore, ObservedStore, Query, Subscription};
pub use crate::view::{LiveQuery, LoadState};
pub use crate::workflow::{ContextData, Pipeline, PipelineControl, PipelineResult};
