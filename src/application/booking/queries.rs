use crate::domain::{Booking, CourtId, TimeSlot, UserId, VenueId, schedule};
use crate::ports::{BookingFilter, MatchSortKey, PublicMatchQuery, SortOrder};
use chrono::NaiveDate;
use serde::Serialize;

use super::booking_service::ServiceDependencies;
use super::errors::{BookingApplicationError, Result};

/// ユーザーが作成した、または参加中の予約
///
/// 日付・開始時刻順。
pub async fn find_bookings_by_user_id(
    deps: &ServiceDependencies,
    user_id: UserId,
    filter: &BookingFilter,
) -> Result<Vec<Booking>> {
    deps.booking_repository
        .find_by_user(user_id, filter)
        .await
        .map_err(BookingApplicationError::RepositoryError)
}

/// 公開マッチを検索する
///
/// 公開・受付中（Pending / Confirmed）の予約。日付の指定がなければ `today` 以降。
/// 人数・空き枠で絞り込み、指定されたキーで並べる。
pub async fn find_public_group_matches(
    deps: &ServiceDependencies,
    query: &PublicMatchQuery,
    today: NaiveDate,
) -> Result<Vec<Booking>> {
    let candidates = deps
        .booking_repository
        .find_public_matches(query, today)
        .await
        .map_err(BookingApplicationError::RepositoryError)?;

    Ok(query.apply(candidates))
}

/// 個人プレイヤー向けに参加できる公開マッチを検索する
///
/// 公開マッチ検索と同じだが、デフォルトは空き枠1以上・参加人数の多い順。
pub async fn find_joinable_bookings(
    deps: &ServiceDependencies,
    query: PublicMatchQuery,
    today: NaiveDate,
) -> Result<Vec<Booking>> {
    let query = joinable_defaults(query);
    find_public_group_matches(deps, &query, today).await
}

fn joinable_defaults(mut query: PublicMatchQuery) -> PublicMatchQuery {
    if query.sort_by.is_none() {
        query.sort_by = Some(MatchSortKey::Players);
        query.sort_order = query.sort_order.or(Some(SortOrder::Desc));
    }
    query.available_slots = query.available_slots.or(Some(1));
    query
}

/// コート・日付のキャンセルされていない予約
///
/// 完了済みの予約も枠を占有し続ける。
pub async fn find_bookings_by_court_and_date(
    deps: &ServiceDependencies,
    court_id: CourtId,
    date: NaiveDate,
) -> Result<Vec<Booking>> {
    deps.booking_repository
        .find_by_court_and_date(court_id, date)
        .await
        .map_err(BookingApplicationError::RepositoryError)
}

/// オーナーが所有する施設の予約
///
/// 施設を持たないオーナーは空の一覧になる。
pub async fn find_bookings_for_owner(
    deps: &ServiceDependencies,
    owner_id: UserId,
    filter: &BookingFilter,
) -> Result<Vec<Booking>> {
    let venue_ids: Vec<VenueId> = deps
        .court_directory
        .list_venues_by_owner(owner_id)
        .await
        .map_err(BookingApplicationError::CourtDirectoryError)?
        .into_iter()
        .map(|venue| venue.venue_id)
        .collect();

    if venue_ids.is_empty() {
        return Ok(Vec::new());
    }

    deps.booking_repository
        .find_by_venues(&venue_ids, filter)
        .await
        .map_err(BookingApplicationError::RepositoryError)
}

/// コートの1日の空き状況
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtAvailability {
    pub court_id: CourtId,
    pub date: NaiveDate,
    /// 営業時間。カタログの開店・閉店時刻が不正な場合は None
    pub opening_hours: Option<TimeSlot>,
    /// 予約済みの枠（開始時刻順）
    pub booked: Vec<TimeSlot>,
    /// 空き枠（開始時刻順）
    pub free: Vec<TimeSlot>,
}

/// コートの空き枠を計算する
///
/// 営業時間からキャンセルされていない予約の枠を除いたもの。
pub async fn get_court_availability(
    deps: &ServiceDependencies,
    court_id: CourtId,
    date: NaiveDate,
) -> Result<CourtAvailability> {
    let court = deps
        .court_directory
        .get_court_by_id(court_id)
        .await
        .map_err(BookingApplicationError::CourtDirectoryError)?
        .filter(|court| court.is_active)
        .ok_or(BookingApplicationError::CourtNotFound(court_id))?;

    let mut booked: Vec<TimeSlot> = find_bookings_by_court_and_date(deps, court_id, date)
        .await?
        .iter()
        .map(Booking::slot)
        .collect();
    booked.sort_by_key(|slot| slot.start);

    let opening_hours = court.opening_hours();
    let free = opening_hours
        .map(|hours| schedule::free_slots(&hours, &booked))
        .unwrap_or_default();

    Ok(CourtAvailability {
        court_id,
        date,
        opening_hours,
        booked,
        free,
    })
}
