use serde::{Deserialize, Serialize};

use provend_core::VendorId;

/// Weighted linear performance score.
///
/// `delivery_rate` is a percentage (0–100), `quality_rating` a 0–5 rating
/// (scaled by 20 onto the same range), `price_score` a 0–100 score.
pub fn performance_score(delivery_rate: f64, quality_rating: f64, price_score: f64) -> f64 {
    delivery_rate * 0.4 + quality_rating * 20.0 * 0.4 + price_score * 0.2
}

/// A supplier that procurement orders reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub delivery_rate: f64,
    pub quality_rating: f64,
    pub price_score: f64,
    pub performance_score: f64,
}

impl Vendor {
    pub fn new(
        name: impl Into<String>,
        delivery_rate: f64,
        quality_rating: f64,
        price_score: f64,
    ) -> Self {
        let mut vendor = Self {
            id: VendorId::new(),
            name: name.into(),
            delivery_rate,
            quality_rating,
            price_score,
            performance_score: 0.0,
        };
        vendor.recalculate();
        vendor
    }

    /// Recompute the stored performance score from the current inputs.
    pub fn recalculate(&mut self) {
        self.performance_score =
            performance_score(self.delivery_rate, self.quality_rating, self.price_score);
    }
}
