use crate::domain::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// ユーザープロフィール（表示用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub full_name: String,
    pub profile_image: Option<String>,
}

/// ユーザーディレクトリポート
///
/// 表示名と画像の解決にのみ使う。取得できなくても予約操作は失敗させない。
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>>;
}
