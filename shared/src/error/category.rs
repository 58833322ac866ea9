//! Error category by code range

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx
    General,
    /// 4xxx
    Order,
    /// 6xxx
    Menu,
    /// 7xxx
    Inventory,
    /// 9xxx and anything unassigned
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            4000..5000 => Self::Order,
            6000..7000 => Self::Menu,
            7000..8000 => Self::Inventory,
            _ => Self::System,
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
