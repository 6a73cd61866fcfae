// voyage_app/src/services/push_mock.rs

//! A stand-in push transport that logs what it would deliver.

use async_trait::async_trait;
use tracing::{info, warn};
use voyage::messaging::{PushMessage, PushTransport};
use voyage::{VoyageError, VoyageResult};

#[derive(Debug, Clone, Default)]
pub struct MockPushTransport;

#[async_trait]
impl PushTransport for MockPushTransport {
  async fn send_to_token(&self, token: &str, message: &PushMessage) -> VoyageResult<()> {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    if message.title.to_lowercase().contains("fail_test") {
      warn!(title = %message.title, "Simulated push failure");
      return Err(VoyageError::Delivery("Simulated push send failure".to_string()));
    }
    let preview: String = message.message.chars().take(50).collect();
    info!(token, title = %message.title, kind = ?message.kind, %preview, "Mock push delivered");
    Ok(())
  }
}
