use chrono::Utc;
use rand::Rng;

/// Largest integer the gateway accepts as an order code.
pub const MAX_CODE: i64 = 9_007_199_254_740_991;

/// Booking deposit: 10% of the service price, rounded half up to the currency unit.
pub fn deposit_for(price: i64) -> i64 {
    (price + 5) / 10
}

/// Numeric code shared by orders and payment links: five timestamp digits
/// followed by eight random digits. Uniqueness is enforced by the database.
pub fn generate_code() -> i64 {
    let prefix = Utc::now().timestamp().rem_euclid(100_000);
    let suffix = rand::thread_rng().gen_range(10_000_000..100_000_000_i64);
    prefix * 100_000_000 + suffix
}

/// A priced line as it sits in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub total_price: i64,
    pub total_items: i32,
}

impl CartTotals {
    pub fn compute<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = Line>,
    {
        lines.into_iter().fold(CartTotals::default(), |acc, line| CartTotals {
            total_price: acc.total_price + line.price * i64::from(line.quantity),
            total_items: acc.total_items + line.quantity,
        })
    }
}
