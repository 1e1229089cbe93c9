use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 予約ID - 予約管理コンテキストの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// コートID - 施設カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourtId(Uuid);

impl CourtId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for CourtId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 施設ID - 施設カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueId(Uuid);

impl VenueId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for VenueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ユーザーID - 利用者管理コンテキストへの参照
///
/// プレイヤー・施設オーナーのどちらもこのIDで識別される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 時刻のパースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeOfDayError {
    /// "HH:MM" 形式ではない
    InvalidFormat(String),
    /// 時・分が範囲外
    OutOfRange(String),
}

impl fmt::Display for TimeOfDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDayError::InvalidFormat(s) => {
                write!(f, "invalid time of day (expected HH:MM): {s}")
            }
            TimeOfDayError::OutOfRange(s) => write!(f, "time of day out of range: {s}"),
        }
    }
}

impl std::error::Error for TimeOfDayError {}

/// 1日の終わり（24:00）を分で表した値
const END_OF_DAY_MINUTES: u16 = 24 * 60;

/// 時刻（施設のローカル時刻、タイムゾーン変換なし）
///
/// 永続化・シリアライズ時は "HH:MM"（24時間表記）の文字列。
/// 営業終了時刻を表すために "24:00" のみ例外的に受け付ける。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// 時・分から生成する
    pub fn new(hour: u8, minute: u8) -> Result<Self, TimeOfDayError> {
        let minutes = u16::from(hour) * 60 + u16::from(minute);
        if minute >= 60 || minutes > END_OF_DAY_MINUTES {
            return Err(TimeOfDayError::OutOfRange(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self(minutes))
    }

    /// 深夜0時からの経過分
    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.0 % 60) as u8
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| TimeOfDayError::InvalidFormat(s.to_string()))?;

        if hour.len() != 2 || minute.len() != 2 {
            return Err(TimeOfDayError::InvalidFormat(s.to_string()));
        }

        let hour: u8 = hour
            .parse()
            .map_err(|_| TimeOfDayError::InvalidFormat(s.to_string()))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| TimeOfDayError::InvalidFormat(s.to_string()))?;

        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeOfDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}
