use std::sync::Arc;

use postbox_core::{LlmModerator, MessageService, MessageStore, PersistenceGateway};
use tracing::info;

use crate::config::Settings;

/// Wire the message service from settings.
///
/// Missing or unreachable dependencies select the degraded modes instead of
/// failing startup.
pub async fn build_message_service(settings: &Settings) -> MessageService {
    let gateway = PersistenceGateway::connect(settings.storage_config()).await;
    let moderator = LlmModerator::from_config(&settings.moderation_config());

    info!(
        "Message service ready: storage={} degraded={} moderation_enabled={} policy={:?}",
        gateway.backend(),
        gateway.is_degraded(),
        moderator.is_enabled(),
        settings.moderation_policy
    );

    MessageService::new(Arc::new(gateway), Arc::new(moderator), settings.moderation_policy)
}
