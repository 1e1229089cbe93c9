use crate::domain::{BookingId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    PlayerJoined,
    PlayerLeft,
    InviteReceived,
    InviteDeclined,
    BookingFull,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::BookingCompleted => "booking_completed",
            NotificationKind::PlayerJoined => "player_joined",
            NotificationKind::PlayerLeft => "player_left",
            NotificationKind::InviteReceived => "invite_received",
            NotificationKind::InviteDeclined => "invite_declined",
            NotificationKind::BookingFull => "booking_full",
        }
    }
}

/// 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// 受信者
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub booking_id: BookingId,
    /// 種類ごとの付加情報（理由、操作したユーザーの名前など）
    pub metadata: serde_json::Value,
}

/// 通知サービスポート
///
/// 通知の配信メカニズムを抽象化する。
/// 実装はメール、プッシュ通知などが考えられる。
/// 呼び出し側は結果を待つが、失敗しても予約操作は取り消さない。
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}
