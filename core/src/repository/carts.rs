// voyage/src/repository/carts.rs

//! Carts and cart items.
//!
//! A user has at most one valid cart. Items carry a snapshot of the price
//! and departure dates taken when they were added, and expire after the
//! configured TTL. Cart totals only count items that have not expired.

use super::packages::PackageRepository;
use super::{load, load_all, load_required, save};
use crate::booking::pricing::cart_totals;
use crate::clock::Clock;
use crate::error::{FieldErrors, VoyageError, VoyageResult};
use crate::model::{Cart, CartItem, NewCartItem};
use crate::settings::VoyageSettings;
use crate::store::collections::{CARTS, CART_ITEMS, DEPARTURES, PACKAGES};
use crate::store::{patch, watch, Direction, DocumentStore, Query, Subscription};
use futures_util::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct CartRepository {
  store: Arc<dyn DocumentStore>,
  clock: Arc<dyn Clock>,
  packages: PackageRepository,
  settings: VoyageSettings,
}

impl CartRepository {
  pub fn new(
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    packages: PackageRepository,
    settings: VoyageSettings,
  ) -> Self {
    Self {
      store,
      clock,
      packages,
      settings,
    }
  }

  /// The user's valid cart, if any.
  pub async fn active_cart(&self, user_id: &str) -> VoyageResult<Option<Cart>> {
    let query = Query::all()
      .where_eq("userId", user_id)
      .where_eq("isValid", true)
      .order_by("createdAt", Direction::Descending)
      .limit(1);
    Ok(load_all(self.store.as_ref(), CARTS, &query).await?.into_iter().next())
  }

  #[instrument(name = "CartRepository::get_or_create_cart", skip(self), err(Display))]
  pub async fn get_or_create_cart(&self, user_id: &str) -> VoyageResult<Cart> {
    if let Some(cart) = self.active_cart(user_id).await? {
      return Ok(cart);
    }
    let mut cart = Cart::empty(user_id, self.clock.now());
    cart.id = save(self.store.as_ref(), CARTS, "", &cart).await?;
    info!(cart_id = %cart.id, "cart created");
    Ok(cart)
  }

  pub async fn get_cart(&self, cart_id: &str) -> VoyageResult<Option<Cart>> {
    load(self.store.as_ref(), CARTS, cart_id).await
  }

  /// Prices `new_item` from the package and departure, stores it and
  /// appends it to the user's cart (created on demand).
  #[instrument(
    name = "CartRepository::add_item_to_cart",
    skip(self, new_item),
    fields(package_id = %new_item.package_id, departure_id = %new_item.departure_id),
    err(Display)
  )]
  pub async fn add_item_to_cart(&self, user_id: &str, new_item: NewCartItem) -> VoyageResult<CartItem> {
    let mut errors = FieldErrors::new();
    if new_item.traveler_count == 0 {
      errors.add("travelerCount", "At least one traveler is required.");
    }
    if new_item.package_id.trim().is_empty() {
      errors.add("packageId", "Choose a package.");
    }
    if new_item.departure_id.trim().is_empty() {
      errors.add("departureId", "Choose a departure date.");
    }
    errors.into_result()?;

    let package = self
      .packages
      .get_package(&new_item.package_id)
      .await?
      .ok_or_else(|| VoyageError::missing(PACKAGES, &new_item.package_id))?;
    if !package.is_available() {
      return Err(VoyageError::invalid("packageId", "This package is sold out."));
    }
    let Some(base_price) = package.price_for(&new_item.traveler_type) else {
      return Err(VoyageError::invalid(
        "travelerType",
        format!("No price for traveler type '{}'.", new_item.traveler_type),
      ));
    };
    let departure = self
      .packages
      .get_departure(&new_item.departure_id)
      .await?
      .ok_or_else(|| VoyageError::missing(DEPARTURES, &new_item.departure_id))?;
    if departure.package_id != package.id {
      return Err(VoyageError::invalid("departureId", "Departure belongs to another package."));
    }
    if new_item.traveler_count > departure.seats_left() {
      return Err(VoyageError::CapacityExceeded {
        available: departure.seats_left(),
        departure_id: departure.id,
        requested: new_item.traveler_count,
      });
    }

    let mut cart = self.get_or_create_cart(user_id).await?;
    let now = self.clock.now();
    let mut item = CartItem {
      id: String::new(),
      cart_id: cart.id.clone(),
      user_id: user_id.to_string(),
      package_id: package.id,
      departure_id: departure.id,
      departure_date: departure.start_date,
      end_date: departure.end_date,
      traveler_type: new_item.traveler_type,
      base_price_cents: base_price,
      total_price_cents: 0,
      traveler_count: 0,
      duration_days: package.duration_days,
      added_at: now,
      expires_at: now + self.settings.cart_item_ttl,
    };
    item.set_traveler_count(new_item.traveler_count);
    item.id = save(self.store.as_ref(), CART_ITEMS, "", &item).await?;

    cart.item_ids.push(item.id.clone());
    self.recalculate(&mut cart).await?;
    debug!(cart_id = %cart.id, item_id = %item.id, total = cart.total_cents, "item added to cart");
    Ok(item)
  }

  #[instrument(name = "CartRepository::update_traveler_count", skip(self), err(Display))]
  pub async fn update_traveler_count(&self, user_id: &str, item_id: &str, traveler_count: u32) -> VoyageResult<CartItem> {
    if traveler_count == 0 {
      return Err(VoyageError::invalid("travelerCount", "At least one traveler is required."));
    }
    let mut cart = self.cart_holding(user_id, item_id).await?;
    let mut item: CartItem = load_required(self.store.as_ref(), CART_ITEMS, item_id).await?;
    item.set_traveler_count(traveler_count);
    self
      .store
      .update(
        CART_ITEMS,
        item_id,
        patch([
          ("travelerCount", json!(item.traveler_count)),
          ("totalPriceCents", json!(item.total_price_cents)),
        ]),
      )
      .await?;
    self.recalculate(&mut cart).await?;
    Ok(item)
  }

  #[instrument(name = "CartRepository::remove_item_from_cart", skip(self), err(Display))]
  pub async fn remove_item_from_cart(&self, user_id: &str, item_id: &str) -> VoyageResult<Cart> {
    let mut cart = self.cart_holding(user_id, item_id).await?;
    self.store.delete(CART_ITEMS, item_id).await?;
    cart.item_ids.retain(|id| id != item_id);
    self.recalculate(&mut cart).await?;
    Ok(cart)
  }

  /// Deletes every item and zeroes the totals. The cart itself stays valid.
  #[instrument(name = "CartRepository::clear_cart", skip(self), err(Display))]
  pub async fn clear_cart(&self, user_id: &str) -> VoyageResult<Option<Cart>> {
    let Some(mut cart) = self.active_cart(user_id).await? else {
      return Ok(None);
    };
    for item_id in cart.item_ids.drain(..) {
      self.store.delete(CART_ITEMS, &item_id).await?;
    }
    cart.total_cents = 0;
    cart.final_cents = 0;
    cart.updated_at = self.clock.now();
    save(self.store.as_ref(), CARTS, &cart.id, &cart).await?;
    Ok(Some(cart))
  }

  /// Reads the listed items concurrently. Missing or unreadable items are
  /// dropped, so the result may be shorter than `item_ids`.
  pub async fn get_cart_items_for_cart(&self, item_ids: &[String]) -> Vec<CartItem> {
    let reads = join_all(
      item_ids
        .iter()
        .map(|id| load::<CartItem>(self.store.as_ref(), CART_ITEMS, id)),
    )
    .await;
    item_ids
      .iter()
      .zip(reads)
      .filter_map(|(id, read)| match read {
        Ok(item) => item,
        Err(e) => {
          warn!(item_id = %id, error = %e, "dropping unreadable cart item");
          None
        }
      })
      .collect()
  }

  /// Items of `cart` that can still be checked out at `now`.
  pub async fn live_items(&self, cart: &Cart) -> Vec<CartItem> {
    let now = self.clock.now();
    self
      .get_cart_items_for_cart(&cart.item_ids)
      .await
      .into_iter()
      .filter(|item| !item.is_expired(now))
      .collect()
  }

  #[instrument(name = "CartRepository::invalidate_cart", skip(self), err(Display))]
  pub async fn invalidate_cart(&self, cart_id: &str) -> VoyageResult<()> {
    let fields = patch([
      ("isValid", json!(false)),
      ("updatedAt", json!(self.clock.now().timestamp_millis())),
    ]);
    if self.store.update(CARTS, cart_id, fields).await? {
      info!(cart_id, "cart invalidated");
      Ok(())
    } else {
      Err(VoyageError::missing(CARTS, cart_id))
    }
  }

  /// Live view of the user's active cart.
  pub fn watch_cart(&self, user_id: &str) -> Subscription<Option<Cart>> {
    let repo = self.clone();
    let user_id = user_id.to_string();
    watch(self.store.clone(), vec![CARTS.to_string()], move || {
      let repo = repo.clone();
      let user_id = user_id.clone();
      async move { repo.active_cart(&user_id).await }
    })
  }

  async fn cart_holding(&self, user_id: &str, item_id: &str) -> VoyageResult<Cart> {
    let cart = self
      .active_cart(user_id)
      .await?
      .ok_or_else(|| VoyageError::invalid("cart", "There is no active cart."))?;
    if !cart.item_ids.iter().any(|id| id == item_id) {
      return Err(VoyageError::missing(CART_ITEMS, item_id));
    }
    Ok(cart)
  }

  /// Recomputes totals over live items and writes the cart back.
  async fn recalculate(&self, cart: &mut Cart) -> VoyageResult<()> {
    let items = self.live_items(cart).await;
    let (total, final_amount) = cart_totals(&items, self.settings.discount.as_ref());
    cart.total_cents = total;
    cart.final_cents = final_amount;
    cart.updated_at = self.clock.now();
    save(self.store.as_ref(), CARTS, &cart.id, cart).await?;
    Ok(())
  }
}
