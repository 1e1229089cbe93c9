use crate::domain::{CourtId, CourtRates, CourtTerms, TimeOfDay, TimeSlot, UserId, VenueId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// コート（施設カタログの読み取り専用ビュー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub court_id: CourtId,
    pub venue_id: VenueId,
    pub name: String,
    /// コートの種別（例: "5-a-side"）
    pub size: String,
    pub is_active: bool,
    pub hourly_rate: Decimal,
    pub peak_hour_rate: Decimal,
    /// 定員（予約の max_players の上限）
    pub max_players: u32,
    pub opening_time: TimeOfDay,
    pub closing_time: TimeOfDay,
}

impl Court {
    /// 予約作成に必要な条件を取り出す
    pub fn terms(&self) -> CourtTerms {
        CourtTerms {
            court_id: self.court_id,
            venue_id: self.venue_id,
            rates: CourtRates {
                hourly_rate: self.hourly_rate,
                peak_hour_rate: self.peak_hour_rate,
            },
            capacity: self.max_players,
        }
    }

    /// 営業時間。開店 >= 閉店 の場合は None
    pub fn opening_hours(&self) -> Option<TimeSlot> {
        TimeSlot::new(self.opening_time, self.closing_time)
    }
}

/// 施設
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub venue_id: VenueId,
    pub owner_id: UserId,
    pub name: String,
    pub location: String,
}

/// 施設カタログポート
///
/// コートと施設の情報は外部のカタログが管理する。このエンジンは読み取るだけ。
#[async_trait]
pub trait CourtDirectory: Send + Sync {
    /// IDでコートを取得する
    async fn get_court_by_id(&self, court_id: CourtId) -> Result<Option<Court>>;

    /// IDで施設を取得する
    async fn get_venue_by_id(&self, venue_id: VenueId) -> Result<Option<Venue>>;

    /// オーナーが所有する施設の一覧
    async fn list_venues_by_owner(&self, owner_id: UserId) -> Result<Vec<Venue>>;
}
