// voyage/src/settings.rs

use crate::booking::pricing::{DiscountPolicy, NoDiscount, TaxPolicy};
use chrono::Duration;
use std::sync::Arc;

/// Tunables of the booking core. The app fills these from its environment.
#[derive(Debug, Clone)]
pub struct VoyageSettings {
  pub tax: TaxPolicy,
  pub discount: Arc<dyn DiscountPolicy>,
  /// How long a cart item stays eligible for checkout.
  pub cart_item_ttl: Duration,
  /// Maximum entries kept per recently-viewed / wishlist list.
  pub activity_list_cap: usize,
}

impl Default for VoyageSettings {
  fn default() -> Self {
    Self {
      tax: TaxPolicy::default(),
      discount: Arc::new(NoDiscount),
      cart_item_ttl: Duration::days(7),
      activity_list_cap: 20,
    }
  }
}
