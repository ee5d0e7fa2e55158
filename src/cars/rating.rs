//! Star rating aggregation.
//!
//! A car keeps the running sum of submitted ratings and how many were submitted;
//! the displayed average is derived from the two and never stored.

pub const MAX_STARS: f64 = 5.0;

pub fn average(sum: f64, count: u32) -> f64 {
	if count == 0 || !sum.is_finite() {
		return 0.0;
	}
	(sum / f64::from(count)).clamp(0.0, MAX_STARS)
}

/// Average rounded to the nearest half star, the granularity of the star widget.
pub fn stars(sum: f64, count: u32) -> f64 {
	(average(sum, count) * 2.0).round() / 2.0
}

pub fn validate(rating: f64) -> Result<f64, String> {
	if rating.is_finite() && (0.0..=MAX_STARS).contains(&rating) {
		Ok(rating)
	} else {
		Err(format!("rating must be between 0 and {}", MAX_STARS))
	}
}

/// Folds one review into the aggregate pair.
pub fn apply(sum: f64, count: u32, rating: f64) -> (f64, u32) {
	(sum + rating, count.saturating_add(1))
}
