//! Screen / ScreenAction Model

use serde::{Deserialize, Serialize};

/// A logical UI/resource area, e.g. "Patients"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Screen {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

/// An operation available on a screen, e.g. "View"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ScreenAction {
    pub id: i64,
    pub screen_id: i64,
    pub name: String,
    pub is_active: bool,
}

/// Screen with its actions (catalog listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenWithActions {
    #[serde(flatten)]
    pub screen: Screen,
    pub actions: Vec<ScreenAction>,
}
