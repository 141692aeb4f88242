use serde::{Deserialize, Serialize};

// ============================================================================
// Order Records
// ============================================================================
//
// Wire shape of a synthetic order. Field names are the JSON keys consumed by
// the downstream order service, so they must not be renamed.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: String,
    pub oof_shard: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

/// Price after applying a percentage sale, truncated toward zero.
pub fn discounted_price(price: i64, sale: i64) -> i64 {
    price - price * sale / 100
}

/// Sum of the discounted item prices.
pub fn goods_total(items: &[Item]) -> i64 {
    items.iter().map(|item| item.total_price).sum()
}

impl Order {
    #[cfg(test)]
    pub fn items_total(&self) -> i64 {
        goods_total(&self.items)
    }

    /// Serialize as UTF-8 JSON. Non-ASCII text is written as-is.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
