// voyage/src/booking/pricing.rs

//! Booking amounts: subtotal from the cart item, a pluggable discount rule and tax.

use crate::model::{CartItem, Cents};
use serde::Serialize;
use std::fmt::Debug;

/// A pluggable discount rule. Implementations return the discount for a
/// subtotal; callers clamp it to `0..=subtotal`.
pub trait DiscountPolicy: Debug + Send + Sync {
  fn discount_for(&self, subtotal: Cents) -> Cents;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiscount;

impl DiscountPolicy for NoDiscount {
  fn discount_for(&self, _subtotal: Cents) -> Cents {
    0
  }
}

/// Percentage off, in basis points (1000 = 10%). Rounded down.
#[derive(Debug, Clone, Copy)]
pub struct PercentageDiscount {
  pub basis_points: u32,
}

impl DiscountPolicy for PercentageDiscount {
  fn discount_for(&self, subtotal: Cents) -> Cents {
    subtotal * Cents::from(self.basis_points) / 10_000
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FlatDiscount {
  pub cents: Cents,
}

impl DiscountPolicy for FlatDiscount {
  fn discount_for(&self, _subtotal: Cents) -> Cents {
    self.cents
  }
}

/// Tax applied to the discounted subtotal, in basis points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxPolicy {
  pub rate_basis_points: u32,
}

impl TaxPolicy {
  pub fn new(rate_basis_points: u32) -> Self {
    Self { rate_basis_points }
  }

  /// Round-half-up of `taxable * rate / 10_000`. Non-positive bases pay no tax.
  pub fn tax_for(&self, taxable: Cents) -> Cents {
    if taxable <= 0 {
      return 0;
    }
    (taxable * Cents::from(self.rate_basis_points) + 5_000) / 10_000
  }
}

/// Computed amounts for one booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuote {
  pub subtotal_cents: Cents,
  pub discount_cents: Cents,
  pub tax_cents: Cents,
  pub total_cents: Cents,
}

impl BookingQuote {
  pub fn compute(subtotal: Cents, discount: &dyn DiscountPolicy, tax: TaxPolicy) -> Self {
    let subtotal = subtotal.max(0);
    Self::with_discount(subtotal, discount.discount_for(subtotal), tax)
  }

  /// Quote with an already decided discount, clamped to `0..=subtotal`.
  pub fn with_discount(subtotal: Cents, discount: Cents, tax: TaxPolicy) -> Self {
    let subtotal_cents = subtotal.max(0);
    let discount_cents = discount.clamp(0, subtotal_cents);
    let tax_cents = tax.tax_for(subtotal_cents - discount_cents);
    Self {
      subtotal_cents,
      discount_cents,
      tax_cents,
      total_cents: subtotal_cents - discount_cents + tax_cents,
    }
  }
}

/// One quote per item, in order. The discount policy is applied once to the
/// sum of the subtotals, exactly as [`cart_totals`] does, and then split across
/// the items in proportion to their subtotals. Rounding leftovers go to the
/// last item, spilling backwards when an item is already fully discounted.
pub fn quote_items(items: &[CartItem], discount: &dyn DiscountPolicy, tax: TaxPolicy) -> Vec<BookingQuote> {
  let subtotals: Vec<Cents> = items.iter().map(|item| item.expected_total().max(0)).collect();
  let total: Cents = subtotals.iter().sum();
  let cart_discount = discount.discount_for(total).clamp(0, total);

  let mut shares: Vec<Cents> = subtotals
    .iter()
    .map(|subtotal| {
      if total == 0 {
        0
      } else {
        // i128 keeps `discount * subtotal` from overflowing on large carts.
        (i128::from(cart_discount) * i128::from(*subtotal) / i128::from(total)) as Cents
      }
    })
    .collect();
  let mut leftover = cart_discount - shares.iter().sum::<Cents>();
  for (share, subtotal) in shares.iter_mut().zip(&subtotals).rev() {
    if leftover == 0 {
      break;
    }
    let extra = leftover.min(subtotal - *share);
    *share += extra;
    leftover -= extra;
  }

  subtotals
    .into_iter()
    .zip(shares)
    .map(|(subtotal, share)| BookingQuote::with_discount(subtotal, share, tax))
    .collect()
}

/// Cart totals before and after discount over the given (already filtered) items.
pub fn cart_totals<'a>(items: impl IntoIterator<Item = &'a CartItem>, discount: &dyn DiscountPolicy) -> (Cents, Cents) {
  let total: Cents = items.into_iter().map(|item| item.total_price_cents).sum();
  let final_amount = total - discount.discount_for(total).clamp(0, total.max(0));
  (total, final_amount.clamp(0, total.max(0)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn item(base: Cents, travelers: u32) -> CartItem {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let mut item = CartItem {
      id: "i".into(),
      cart_id: "c".into(),
      user_id: "u".into(),
      package_id: "p".into(),
      departure_id: "d".into(),
      departure_date: at,
      end_date: at,
      traveler_type: "adult".into(),
      base_price_cents: base,
      total_price_cents: 0,
      traveler_count: 0,
      duration_days: 5,
      added_at: at,
      expires_at: at,
    };
    item.set_traveler_count(travelers);
    item
  }

  #[test]
  fn two_items_total_before_discount() {
    let items = [item(89_900, 2), item(115_000, 1)];
    let (total, final_amount) = cart_totals(&items, &NoDiscount);
    assert_eq!(total, 294_800);
    assert_eq!(final_amount, 294_800);
  }

  #[test]
  fn final_amount_never_exceeds_total() {
    let items = [item(10_000, 1)];
    let (total, final_amount) = cart_totals(&items, &FlatDiscount { cents: -500 });
    assert_eq!(final_amount, total);
    let (_, final_amount) = cart_totals(&items, &FlatDiscount { cents: 50_000 });
    assert_eq!(final_amount, 0);
  }

  #[test]
  fn quote_balances_with_discount_and_tax() {
    let quote = BookingQuote::compute(179_800, &PercentageDiscount { basis_points: 1_000 }, TaxPolicy::new(825));
    assert_eq!(quote.subtotal_cents, 179_800);
    assert_eq!(quote.discount_cents, 17_980);
    // 161_820 * 8.25% = 13_350.15
    assert_eq!(quote.tax_cents, 13_350);
    assert_eq!(
      quote.total_cents,
      quote.subtotal_cents - quote.discount_cents + quote.tax_cents
    );
  }

  #[test]
  fn tax_rounds_half_up() {
    let tax = TaxPolicy::new(500);
    assert_eq!(tax.tax_for(10), 1); // 0.5 -> 1
    assert_eq!(tax.tax_for(9), 0); // 0.45 -> 0
    assert_eq!(tax.tax_for(0), 0);
  }

  #[test]
  fn flat_discount_is_granted_once_across_items() {
    let items = [item(89_900, 2), item(115_000, 1)];
    let quotes = quote_items(&items, &FlatDiscount { cents: 5_000 }, TaxPolicy::default());
    let (_, final_amount) = cart_totals(&items, &FlatDiscount { cents: 5_000 });

    assert_eq!(quotes.iter().map(|q| q.discount_cents).sum::<Cents>(), 5_000);
    assert_eq!(quotes.iter().map(|q| q.total_cents).sum::<Cents>(), final_amount);
    // 5_000 * 179_800 / 294_800 = 3_049.5..., the last item takes the rest.
    assert_eq!(quotes[0].discount_cents, 3_049);
    assert_eq!(quotes[1].discount_cents, 1_951);
  }

  #[test]
  fn split_discount_never_exceeds_an_item_subtotal() {
    let items = [item(3, 1), item(3, 1), item(1, 1)];
    let quotes = quote_items(&items, &FlatDiscount { cents: 6 }, TaxPolicy::default());
    assert_eq!(quotes.iter().map(|q| q.discount_cents).sum::<Cents>(), 6);
    for quote in &quotes {
      assert!(quote.discount_cents <= quote.subtotal_cents);
      assert_eq!(quote.total_cents, quote.subtotal_cents - quote.discount_cents + quote.tax_cents);
    }
  }

  #[test]
  fn percentage_split_keeps_each_booking_balanced_with_tax() {
    let items = [item(89_900, 2), item(115_000, 1)];
    let quotes = quote_items(&items, &PercentageDiscount { basis_points: 1_000 }, TaxPolicy::new(825));
    assert_eq!(quotes.iter().map(|q| q.discount_cents).sum::<Cents>(), 29_480);
    for quote in &quotes {
      assert_eq!(quote.total_cents, quote.subtotal_cents - quote.discount_cents + quote.tax_cents);
    }
  }
}
