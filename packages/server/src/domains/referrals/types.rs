use serde::Serialize;

use crate::domains::customer::models::Customer;

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// A referred customer as shown to their referrer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub full_name: Option<String>,
    pub phone_number: String,
    pub referral_id: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    /// How many customers this referral has referred in turn
    pub referral_count: u64,
}

impl ReferralSummary {
    pub fn from_customer(customer: Customer, referral_count: u64) -> Self {
        Self {
            full_name: customer.full_name,
            phone_number: customer.phone_number,
            referral_id: customer.referral_id,
            joined_at: customer.created_at,
            referral_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralPage {
    pub items: Vec<ReferralSummary>,
    /// 1-based
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// ceil(total / per_page); zero items still render one empty page
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = total.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
