use crate::domain::{
    Booking, BookingId, BookingStatus, BookingType, CourtId, GroupType, UserId, VenueId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// `insert_if_slot_free` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// 同じコート・同じ日のキャンセルされていない予約と重なっていた
    SlotTaken { conflicting_booking_id: BookingId },
}

/// `update` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// 保存済みのバージョンが期待値と一致しなかった（他の更新が先にコミットした）
    VersionConflict,
}

/// ユーザー・オーナー向け一覧の絞り込み条件
///
/// すべて任意。指定された条件のANDで絞り込む。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub court_id: Option<CourtId>,
    pub venue_id: Option<VenueId>,
    pub booking_type: Option<BookingType>,
    pub group_type: Option<GroupType>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|s| booking.status == s)
            && self.date.is_none_or(|d| booking.date == d)
            && self.date_from.is_none_or(|d| booking.date >= d)
            && self.date_to.is_none_or(|d| booking.date <= d)
            && self.court_id.is_none_or(|c| booking.court_id == c)
            && self.venue_id.is_none_or(|v| booking.venue_id == v)
            && self.booking_type.is_none_or(|t| booking.booking_type == t)
            && self.group_type.is_none_or(|g| booking.group_type == g)
    }
}

/// 公開マッチの並び替えキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSortKey {
    /// 参加中の人数
    Players,
    Date,
    /// 開始時刻
    Time,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// 公開マッチ検索の条件
///
/// `min_players` / `max_players` は参加中の人数、`available_slots` は空き枠の下限。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMatchQuery {
    pub date: Option<NaiveDate>,
    pub court_id: Option<CourtId>,
    pub venue_id: Option<VenueId>,
    pub booking_type: Option<BookingType>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub available_slots: Option<u32>,
    pub sort_by: Option<MatchSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl PublicMatchQuery {
    /// ストア側で絞り込める条件（公開・受付中・日付・コート・施設・種別）
    ///
    /// 日付の指定がなければ `today` 以降に限る。
    pub fn matches_base(&self, booking: &Booking, today: NaiveDate) -> bool {
        booking.group_type == GroupType::Public
            && booking.status.allows_roster_changes()
            && match self.date {
                Some(date) => booking.date == date,
                None => booking.date >= today,
            }
            && self.court_id.is_none_or(|c| booking.court_id == c)
            && self.venue_id.is_none_or(|v| booking.venue_id == v)
            && self.booking_type.is_none_or(|t| booking.booking_type == t)
    }

    /// 人数・空き枠による後段の絞り込み
    pub fn matches_roster(&self, booking: &Booking) -> bool {
        let active = booking.active_player_count();
        self.min_players.is_none_or(|min| active >= min)
            && self.max_players.is_none_or(|max| active <= max)
            && self
                .available_slots
                .is_none_or(|slots| booking.available_slots() >= slots)
    }

    /// 後段の絞り込みと並び替えを適用する
    ///
    /// 並び替えキーの指定がなければ日付・開始時刻の昇順。
    pub fn apply(&self, bookings: Vec<Booking>) -> Vec<Booking> {
        let mut matched: Vec<Booking> = bookings
            .into_iter()
            .filter(|b| self.matches_roster(b))
            .collect();

        let order = self.sort_order.unwrap_or_default();
        matched.sort_by(|a, b| {
            let ordering = match self.sort_by {
                Some(key) => compare_by(key, a, b),
                None => chronological(a, b),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        matched
    }
}

fn compare_by(key: MatchSortKey, a: &Booking, b: &Booking) -> Ordering {
    match key {
        MatchSortKey::Players => a.active_player_count().cmp(&b.active_player_count()),
        MatchSortKey::Date => a.date.cmp(&b.date),
        MatchSortKey::Time => a.start_time.cmp(&b.start_time),
        MatchSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// 日付→開始時刻の順
pub fn chronological(a: &Booking, b: &Booking) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.start_time.cmp(&b.start_time))
}

/// 予約ストアポート
///
/// 予約集約の永続化とクエリ。参加者と招待は集約に埋め込まれている。
/// 更新はすべてバージョン付きで、同じ予約への同時更新は1つだけが成功する。
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 新しい予約を保存する
    ///
    /// 同じコート・同じ日のキャンセルされていない予約と重なる場合は保存せず
    /// `SlotTaken` を返す。重複チェックと保存は同じコート・日付の他の作成と
    /// アトミックに行われる。
    async fn insert_if_slot_free(&self, booking: &Booking) -> Result<InsertOutcome>;

    /// IDで予約を取得する
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// 保存済みのバージョンが `expected_version` の場合のみ予約を置き換える
    ///
    /// 新しいバージョンは `booking.version` に入れて渡す。
    async fn update(&self, booking: &Booking, expected_version: u32) -> Result<UpdateOutcome>;

    /// コート・日付のキャンセルされていない予約。開始時刻順
    async fn find_by_court_and_date(
        &self,
        court_id: CourtId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>>;

    /// ユーザーが作成した、または参加中の予約。日付・開始時刻順
    async fn find_by_user(&self, user_id: UserId, filter: &BookingFilter) -> Result<Vec<Booking>>;

    /// 指定した施設の予約。日付・開始時刻順
    async fn find_by_venues(
        &self,
        venue_ids: &[VenueId],
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>>;

    /// 公開マッチの候補（`PublicMatchQuery::matches_base` を満たすもの）
    ///
    /// 人数による絞り込みと並び替えは呼び出し側が `PublicMatchQuery::apply` で行う。
    async fn find_public_matches(
        &self,
        query: &PublicMatchQuery,
        today: NaiveDate,
    ) -> Result<Vec<Booking>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourtRates, CourtTerms, PeakHours, commands::CreateBooking};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn booking(date: &str, start: &str, end: &str, max_players: u32) -> Booking {
        let court = CourtTerms {
            court_id: CourtId::new(),
            venue_id: VenueId::new(),
            rates: CourtRates {
                hourly_rate: Decimal::new(1000, 0),
                peak_hour_rate: Decimal::new(1500, 0),
            },
            capacity: 10,
        };
        let cmd = CreateBooking {
            created_by: UserId::new(),
            court_id: court.court_id,
            date: date.parse().unwrap(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            booking_type: BookingType::Solo,
            group_type: None,
            max_players: Some(max_players),
            requested_at: Utc.with_ymd_and_hms(2025, 5, 30, 9, 0, 0).unwrap(),
        };
        crate::domain::create_booking(&cmd, &court, &[], &PeakHours::default())
            .unwrap()
            .0
    }

    #[test]
    fn test_filter_matches_date_range_and_status() {
        let b = booking("2025-06-05", "10:00", "11:00", 10);

        let filter = BookingFilter {
            date_from: Some("2025-06-01".parse().unwrap()),
            date_to: Some("2025-06-05".parse().unwrap()),
            status: Some(BookingStatus::Pending),
            ..Default::default()
        };
        assert!(filter.matches(&b));

        let filter = BookingFilter {
            date_to: Some("2025-06-04".parse().unwrap()),
            ..Default::default()
        };
        assert!(!filter.matches(&b));
        assert!(BookingFilter::default().matches(&b));
    }

    #[test]
    fn test_matches_base_excludes_past_unless_date_given() {
        let today: NaiveDate = "2025-06-02".parse().unwrap();
        let past = booking("2025-06-01", "10:00", "11:00", 10);

        assert!(!PublicMatchQuery::default().matches_base(&past, today));

        let query = PublicMatchQuery {
            date: Some("2025-06-01".parse().unwrap()),
            ..Default::default()
        };
        assert!(query.matches_base(&past, today));
    }

    #[test]
    fn test_apply_filters_available_slots_and_sorts_by_time_desc() {
        let early = booking("2025-06-01", "09:00", "10:00", 10);
        let late = booking("2025-06-01", "20:00", "21:00", 10);
        let full = booking("2025-06-01", "12:00", "13:00", 1);

        let query = PublicMatchQuery {
            available_slots: Some(1),
            sort_by: Some(MatchSortKey::Time),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        let result = query.apply(vec![early.clone(), full, late.clone()]);

        let ids: Vec<_> = result.iter().map(|b| b.booking_id).collect();
        assert_eq!(ids, vec![late.booking_id, early.booking_id]);
    }
}
