use crate::domain::{CourtId, UserId, VenueId};
use crate::ports::court_directory::{Court, CourtDirectory as CourtDirectoryTrait, Result, Venue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// CourtDirectoryのモック実装
///
/// テストからコートと施設を登録できる。
/// `set_unavailable(true)` で全ての呼び出しをエラーにできる。
pub struct CourtDirectory {
    courts: Mutex<HashMap<CourtId, Court>>,
    venues: Mutex<HashMap<VenueId, Venue>>,
    unavailable: AtomicBool,
}

impl CourtDirectory {
    pub fn new() -> Self {
        Self {
            courts: Mutex::new(HashMap::new()),
            venues: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// テスト用にコートを登録
    pub fn add_court(&self, court: Court) {
        self.courts.lock().unwrap().insert(court.court_id, court);
    }

    /// テスト用に施設を登録
    pub fn add_venue(&self, venue: Venue) {
        self.venues.lock().unwrap().insert(venue.venue_id, venue);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("court directory unavailable".into());
        }
        Ok(())
    }
}

impl Default for CourtDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CourtDirectoryTrait for CourtDirectory {
    async fn get_court_by_id(&self, court_id: CourtId) -> Result<Option<Court>> {
        self.check_available()?;
        Ok(self.courts.lock().unwrap().get(&court_id).cloned())
    }

    async fn get_venue_by_id(&self, venue_id: VenueId) -> Result<Option<Venue>> {
        self.check_available()?;
        Ok(self.venues.lock().unwrap().get(&venue_id).cloned())
    }

    async fn list_venues_by_owner(&self, owner_id: UserId) -> Result<Vec<Venue>> {
        self.check_available()?;
        Ok(self
            .venues
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
