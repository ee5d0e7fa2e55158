use axum::{
	extract::{Path, State},
	Json,
};
use chrono::Utc;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
	auth::CurrentUser,
	cars::{cars::find_car, rating},
	error::{AppError, AppResult},
	keys,
	store::{self, DbClient, CARS, REVIEWS},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
	pub car_id: String,
	pub name: String,
	pub rating: f64,
	#[serde(default)]
	pub thoughts: String,
	/// Milliseconds since the epoch.
	pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewView {
	pub id: String,
	#[serde(flatten)]
	pub review: Review,
}

#[derive(Deserialize, Debug)]
pub struct NewReview {
	pub rating: f64,
	#[serde(default, alias = "comment")]
	pub thoughts: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ReviewPosted {
	pub review: ReviewView,
	pub average_rating: f64,
	pub rated: u32,
}

pub async fn car_reviews(db: &DbClient, car_id: &str) -> AppResult<Vec<ReviewView>> {
	let mut reviews: Vec<ReviewView> = store::fetch_all::<Review>(db, REVIEWS)
		.await?
		.into_iter()
		.filter(|(_, review)| review.car_id == car_id)
		.map(|(id, review)| ReviewView { id, review })
		.collect();
	reviews.sort_by(|a, b| b.review.timestamp.cmp(&a.review.timestamp));
	Ok(reviews)
}

pub async fn get_reviews(db: State<DbClient>, Path(car_id): Path<String>) -> AppResult<Json<Vec<ReviewView>>> {
	Ok(Json(car_reviews(&db, &car_id).await?))
}

/// Stores the review, then folds its rating into the car's running sum and count.
/// If the car cannot be updated the review is withdrawn again.
pub async fn post_review(CurrentUser(user): CurrentUser, db: State<DbClient>, Path(car_id): Path<String>, Json(new): Json<NewReview>) -> AppResult<(StatusCode, Json<ReviewPosted>)> {
	let score = rating::validate(new.rating).map_err(AppError::Validation)?;
	let mut car = find_car(&db, &car_id).await?.ok_or(AppError::NotFound("car"))?;

	let review = Review {
		car_id: car_id.clone(),
		name: user.name,
		rating: score,
		thoughts: new.thoughts.trim().to_string(),
		timestamp: Utc::now().timestamp_millis(),
	};
	let id = keys::new_id();
	store::store(&db, REVIEWS, &id, &review).await?;

	(car.rating, car.rated) = rating::apply(car.rating, car.rated, score);
	if let Err(e) = store::store(&db, CARS, &car_id, &car).await {
		// a listed review must also be counted in the aggregate
		match db.delete(REVIEWS, &id).await {
			Ok(_) => log::warn!("car {} not updated, review {} withdrawn: {}", car_id, id, e),
			Err(undo) => log::error!("review {} on car {} is not counted and could not be withdrawn: {}", id, car_id, undo),
		}
		return Err(e);
	}
	log::info!("review {} on car {} by {}", id, car_id, user.sub);

	Ok((
		StatusCode::CREATED,
		Json(ReviewPosted {
			review: ReviewView { id, review },
			average_rating: car.average_rating(),
			rated: car.rated,
		}),
	))
}
