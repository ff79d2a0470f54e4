use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MemberId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            avatar_url: None,
            pix_key: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub member_ids: Vec<MemberId>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// Money a member put forward towards an expense.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Payer {
    pub member_id: MemberId,
    pub amount: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Groceries,
    Dining,
    Entertainment,
    Bills,
    Transport,
    Health,
    Education,
    Housing,
    Pets,
    Gifts,
    Travel,
    Beauty,
    #[default]
    Other,
    Transfer,
}

/// A shared cost inside a group.
///
/// `amount` is the nominal total. The ledger only ever looks at what the
/// `payers` actually put in, so a partially paid expense splits the paid part.
/// An empty `participant_ids` means the whole roster shares the cost.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount: f64,
    pub payers: Vec<Payer>,
    #[serde(default)]
    pub participant_ids: Vec<MemberId>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

impl Expense {
    pub fn total_paid(&self) -> f64 {
        self.payers.iter().map(|payer| payer.amount).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Contribution {
    pub id: String,
    pub member_id: MemberId,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueCategory {
    Salary,
    Freelance,
    Investment,
    Gift,
    #[default]
    Other,
}

/// Personal income. `received == false` marks a forecast.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Revenue {
    pub id: String,
    pub member_id: MemberId,
    pub description: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub category: RevenueCategory,
    pub received: bool,
}
