//! Well-known notification channel name constants.
//!
//! These must match the channel values stored in the `notifications.channel`
//! column and referenced by the action dispatcher and the digest scheduler.

/// In-app notification stored for the portal's notification bell.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Notification queued for periodic digest email delivery.
pub const CHANNEL_DIGEST: &str = "digest";
