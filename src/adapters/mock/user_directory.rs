use crate::domain::UserId;
use crate::ports::user_directory::{Result, UserDirectory as UserDirectoryTrait, UserProfile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// UserDirectoryのモック実装
pub struct UserDirectory {
    users: Mutex<HashMap<UserId, UserProfile>>,
    unavailable: AtomicBool,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// テスト用にユーザーを登録
    pub fn add_user(&self, user_id: UserId, full_name: &str) {
        self.users.lock().unwrap().insert(
            user_id,
            UserProfile {
                user_id,
                full_name: full_name.to_string(),
                profile_image: None,
            },
        );
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectoryTrait for UserDirectory {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("user directory unavailable".into());
        }
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}
