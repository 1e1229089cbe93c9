use crate::domain::{Booking, BookingId, CourtId, UserId, VenueId, schedule};
use crate::ports::booking_repository::{
    BookingFilter, BookingRepository as BookingRepositoryTrait, InsertOutcome, PublicMatchQuery,
    Result, UpdateOutcome, chronological,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

/// BookingRepositoryのインメモリ実装
///
/// すべての操作を1つのMutexの中で行うため、重複チェックと保存、
/// バージョン比較と置き換えはそれぞれアトミックになる。
pub struct BookingRepository {
    bookings: Mutex<HashMap<BookingId, Booking>>,
    /// 次のN回の更新を強制的にバージョン競合にする（テスト用）
    injected_conflicts: Mutex<u32>,
}

impl BookingRepository {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            injected_conflicts: Mutex::new(0),
        }
    }

    /// 次の `count` 回の更新を他の書き込みに負けたものとして扱う
    pub fn inject_version_conflicts(&self, count: u32) {
        *self.injected_conflicts.lock().unwrap() = count;
    }

    /// 保存されている予約の数
    pub fn len(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sorted(mut bookings: Vec<Booking>) -> Vec<Booking> {
        bookings.sort_by(chronological);
        bookings
    }
}

impl Default for BookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepositoryTrait for BookingRepository {
    async fn insert_if_slot_free(&self, booking: &Booking) -> Result<InsertOutcome> {
        let mut bookings = self.bookings.lock().unwrap();

        let slot = booking.slot();
        let taken: Vec<(BookingId, _)> = bookings
            .values()
            .filter(|b| b.occupies(booking.court_id, booking.date))
            .map(|b| (b.booking_id, b.slot()))
            .collect();

        if let Some(conflicting_booking_id) =
            schedule::find_conflict(&slot, taken.iter().map(|(id, s)| (*id, s)))
        {
            return Ok(InsertOutcome::SlotTaken {
                conflicting_booking_id,
            });
        }

        bookings.insert(booking.booking_id, booking.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        Ok(self.bookings.lock().unwrap().get(&booking_id).cloned())
    }

    async fn update(&self, booking: &Booking, expected_version: u32) -> Result<UpdateOutcome> {
        {
            let mut injected = self.injected_conflicts.lock().unwrap();
            if *injected > 0 {
                *injected -= 1;
                return Ok(UpdateOutcome::VersionConflict);
            }
        }

        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&booking.booking_id) {
            Some(stored) if stored.version == expected_version => {
                *stored = booking.clone();
                Ok(UpdateOutcome::Updated)
            }
            Some(_) => Ok(UpdateOutcome::VersionConflict),
            None => Err(format!("unknown booking {}", booking.booking_id).into()),
        }
    }

    async fn find_by_court_and_date(
        &self,
        court_id: CourtId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(Self::sorted(
            bookings
                .values()
                .filter(|b| b.occupies(court_id, date))
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_user(&self, user_id: UserId, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(Self::sorted(
            bookings
                .values()
                .filter(|b| b.involves(user_id) && filter.matches(b))
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_venues(
        &self,
        venue_ids: &[VenueId],
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(Self::sorted(
            bookings
                .values()
                .filter(|b| venue_ids.contains(&b.venue_id) && filter.matches(b))
                .cloned()
                .collect(),
        ))
    }

    async fn find_public_matches(
        &self,
        query: &PublicMatchQuery,
        today: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(Self::sorted(
            bookings
                .values()
                .filter(|b| query.matches_base(b, today))
                .cloned()
                .collect(),
        ))
    }
}
