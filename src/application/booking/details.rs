use crate::domain::{Booking, BookingId, CourtId, UserId, VenueId};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;

use super::booking_service::{ServiceDependencies, load_booking};
use super::errors::Result;

/// 取得できなかった名前の代わりに表示する値
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtSummary {
    pub court_id: CourtId,
    pub name: String,
    pub size: String,
    pub hourly_rate: Option<Decimal>,
    pub peak_hour_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueSummary {
    pub venue_id: VenueId,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub full_name: String,
    pub profile_image: Option<String>,
}

/// 参加中のプレイヤーの表示情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDetail {
    pub user_id: UserId,
    pub full_name: String,
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// 予約の詳細ビュー
///
/// 予約本体に、コート・施設・作成者・参加中のプレイヤーの表示情報を付けたもの。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub court: CourtSummary,
    pub venue: VenueSummary,
    pub creator: UserSummary,
    pub players_details: Vec<PlayerDetail>,
    pub active_player_count: u32,
    pub available_slots: u32,
}

/// 予約の詳細を取得する
///
/// 予約が存在しなければ BookingNotFound。
/// コート・施設・ユーザーが取得できない場合は "Unknown" で埋め、失敗させない。
pub async fn get_booking_with_details(
    deps: &ServiceDependencies,
    booking_id: BookingId,
) -> Result<BookingDetails> {
    let booking = load_booking(deps, booking_id).await?;
    Ok(build_details(deps, booking).await)
}

/// 予約から詳細ビューを組み立てる（読み取りのみ、失敗しない）
pub(super) async fn build_details(deps: &ServiceDependencies, booking: Booking) -> BookingDetails {
    let (court, venue, creator) = futures::join!(
        resolve_court(deps, booking.court_id),
        resolve_venue(deps, booking.venue_id),
        resolve_user(deps, booking.created_by),
    );

    let active: Vec<_> = booking.active_players().cloned().collect();
    let profiles = join_all(active.iter().map(|p| resolve_user(deps, p.user_id))).await;

    let players_details = active
        .iter()
        .zip(profiles)
        .map(|(player, profile)| PlayerDetail {
            user_id: player.user_id,
            full_name: profile.full_name,
            profile_image: profile.profile_image,
            is_admin: player.is_admin,
            joined_at: player.joined_at,
        })
        .collect();

    BookingDetails {
        active_player_count: booking.active_player_count(),
        available_slots: booking.available_slots(),
        court,
        venue,
        creator,
        players_details,
        booking,
    }
}

async fn resolve_court(deps: &ServiceDependencies, court_id: CourtId) -> CourtSummary {
    match deps.court_directory.get_court_by_id(court_id).await {
        Ok(Some(court)) => CourtSummary {
            court_id,
            name: court.name,
            size: court.size,
            hourly_rate: Some(court.hourly_rate),
            peak_hour_rate: Some(court.peak_hour_rate),
        },
        other => {
            if let Err(e) = other {
                tracing::warn!(court_id = %court_id, error = %e, "failed to resolve court");
            }
            CourtSummary {
                court_id,
                name: UNKNOWN.to_string(),
                size: UNKNOWN.to_string(),
                hourly_rate: None,
                peak_hour_rate: None,
            }
        }
    }
}

async fn resolve_venue(deps: &ServiceDependencies, venue_id: VenueId) -> VenueSummary {
    match deps.court_directory.get_venue_by_id(venue_id).await {
        Ok(Some(venue)) => VenueSummary {
            venue_id,
            name: venue.name,
            location: venue.location,
        },
        other => {
            if let Err(e) = other {
                tracing::warn!(venue_id = %venue_id, error = %e, "failed to resolve venue");
            }
            VenueSummary {
                venue_id,
                name: UNKNOWN.to_string(),
                location: UNKNOWN.to_string(),
            }
        }
    }
}

/// ユーザーの表示情報。取得できなければ "Unknown"
pub(super) async fn resolve_user(deps: &ServiceDependencies, user_id: UserId) -> UserSummary {
    match deps.user_directory.get_user_by_id(user_id).await {
        Ok(Some(profile)) => UserSummary {
            user_id,
            full_name: profile.full_name,
            profile_image: profile.profile_image,
        },
        other => {
            if let Err(e) = other {
                tracing::warn!(user_id = %user_id, error = %e, "failed to resolve user");
            }
            UserSummary {
                user_id,
                full_name: UNKNOWN.to_string(),
                profile_image: None,
            }
        }
    }
}
