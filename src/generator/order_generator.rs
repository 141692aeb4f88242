use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::reference::{ReferenceData, ReferenceDataError};
use crate::models::{discounted_price, goods_total, Delivery, Item, Order, Payment};

// ============================================================================
// Order Generator
// ============================================================================
//
// Builds one complete order per call. The `order_uid` counter lives on the
// generator instance, so a fresh generator always starts at "b1".
//
// Derived fields:
// - item.total_price  = price - price * sale / 100
// - payment.goods_total = sum of item.total_price
// - payment.amount      = goods_total + delivery_cost
//
// ============================================================================

const ENTRY: &str = "WBILMT";
const CURRENCY: &str = "RUB";
const PROVIDER: &str = "wbpay";
const BANK: &str = "alpha";

pub const MIN_ITEMS: usize = 1;
pub const MAX_ITEMS: usize = 5;

pub struct OrderGenerator<R = StdRng> {
    rng: R,
    tables: ReferenceData,
    counter: u64,
}

impl OrderGenerator<StdRng> {
    /// Generator seeded from OS entropy; runs are not reproducible.
    pub fn from_entropy(tables: ReferenceData) -> Result<Self, ReferenceDataError> {
        Self::with_rng(tables, StdRng::from_entropy())
    }

    /// Same seed and tables produce the same orders, timestamps aside.
    pub fn seeded(tables: ReferenceData, seed: u64) -> Result<Self, ReferenceDataError> {
        Self::with_rng(tables, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> OrderGenerator<R> {
    pub fn with_rng(tables: ReferenceData, rng: R) -> Result<Self, ReferenceDataError> {
        tables.validate()?;
        Ok(Self {
            rng,
            tables,
            counter: 0,
        })
    }

    pub fn next_order(&mut self) -> Order {
        self.next_order_at(Utc::now())
    }

    pub fn next_order_at(&mut self, now: DateTime<Utc>) -> Order {
        let item_count = self.rng.gen_range(MIN_ITEMS..=MAX_ITEMS);
        let items: Vec<Item> = (0..item_count).map(|_| self.random_item()).collect();
        let goods_total = goods_total(&items);

        let delivery = self.random_delivery();
        let payment = self.random_payment(goods_total, now);

        Order {
            order_uid: self.next_uid(),
            track_number: self.track_number(),
            entry: ENTRY.to_string(),
            delivery,
            payment,
            items,
            locale: pick(&mut self.rng, &self.tables.locales),
            internal_signature: String::new(),
            customer_id: format!("customer_{}", self.rng.gen_range(10000..=99999)),
            delivery_service: pick(&mut self.rng, &self.tables.delivery_services),
            shardkey: format!("shard_{}", self.rng.gen_range(0..=9)),
            sm_id: self.rng.gen_range(0..=99),
            date_created: rfc3339_micros(now),
            oof_shard: format!("oof_{}", self.rng.gen_range(0..=9)),
        }
    }

    fn next_uid(&mut self) -> String {
        self.counter += 1;
        format!("b{}", self.counter)
    }

    fn track_number(&mut self) -> String {
        format!("{}{}", ENTRY, self.rng.gen_range(100000..=999999))
    }

    fn random_string(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn random_item(&mut self) -> Item {
        let price = self.rng.gen_range(10..=110) * 1000;
        let sale = self.rng.gen_range(0..=30);

        Item {
            chrt_id: self.rng.gen_range(100000..=999999),
            track_number: self.track_number(),
            price,
            rid: self.random_string(10),
            name: pick(&mut self.rng, &self.tables.item_names),
            sale,
            size: self.rng.gen_range(1..=50).to_string(),
            total_price: discounted_price(price, sale),
            nm_id: self.rng.gen_range(100000..=999999),
            brand: pick(&mut self.rng, &self.tables.brands),
            status: self.rng.gen_range(1..=5),
        }
    }

    fn random_delivery(&mut self) -> Delivery {
        let name = pick(&mut self.rng, &self.tables.names);
        let phone = format!("+7{}", self.rng.gen_range(1_000_000_000_i64..=9_999_999_999));
        let zip = self.rng.gen_range(100000..=999999).to_string();
        let city = pick(&mut self.rng, &self.tables.cities);
        let street = self.random_string(10);
        let address = format!(
            "ул. {}, д. {}, кв. {}",
            street,
            self.rng.gen_range(1..=100),
            self.rng.gen_range(1..=100)
        );
        let region = pick(&mut self.rng, &self.tables.regions);
        let username = self.random_string(8);
        let email = format!("{}@{}", username, pick(&mut self.rng, &self.tables.email_domains));

        Delivery {
            name,
            phone,
            zip,
            city,
            address,
            region,
            email,
        }
    }

    fn random_payment(&mut self, goods_total: i64, now: DateTime<Utc>) -> Payment {
        let delivery_cost = self.rng.gen_range(1000..=6000);

        Payment {
            transaction: self.random_string(20),
            request_id: self.random_string(15),
            currency: CURRENCY.to_string(),
            provider: PROVIDER.to_string(),
            amount: goods_total + delivery_cost,
            payment_dt: now.timestamp(),
            bank: BANK.to_string(),
            delivery_cost,
            goods_total,
            custom_fee: self.rng.gen_range(0..=1000),
        }
    }
}

/// Tables are validated non-empty when the generator is built.
fn pick<R: Rng>(rng: &mut R, table: &[String]) -> String {
    table[rng.gen_range(0..table.len())].clone()
}

fn rfc3339_micros(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
