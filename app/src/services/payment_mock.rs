// voyage_app/src/services/payment_mock.rs

//! A stand-in payment processor. Transactions are opened immediately; the
//! outcome is reported later through the payment webhook.

use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;
use voyage::{PaymentGateway, PaymentRequest, VoyageError, VoyageResult};

#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
  account_id: String,
}

impl MockPaymentGateway {
  pub fn new(account_id: impl Into<String>) -> Self {
    Self {
      account_id: account_id.into(),
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(
    name = "MockPaymentGateway::initiate",
    skip(self, request),
    fields(payment_id = %request.payment_id, amount = request.amount_cents, account = %self.account_id)
  )]
  async fn initiate(&self, request: &PaymentRequest) -> VoyageResult<String> {
    if request.amount_cents <= 0 {
      return Err(VoyageError::Payment("Amount must be greater than zero".to_string()));
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Amounts ending in ...1.23 are declined, to exercise the rollback path.
    if request.amount_cents % 1_000 == 123 {
      info!("Mock payment declined by test condition");
      return Err(VoyageError::Payment("Mock payment declined due to test condition".to_string()));
    }
    let transaction_id = format!("mock_txn_{}", Uuid::new_v4().simple());
    info!(%transaction_id, "Mock payment transaction opened");
    Ok(transaction_id)
  }

  async fn void(&self, transaction_id: &str) -> VoyageResult<()> {
    info!(transaction_id, account = %self.account_id, "Mock payment transaction voided");
    Ok(())
  }
}
