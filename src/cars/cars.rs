use axum::{
	extract::{Path, State},
	response::{IntoResponse, Response},
	Json,
};
use hyper::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::rating;
use crate::{
	auth::CurrentUser,
	error::{AppError, AppResult},
	keys,
	store::{self, DbClient, CARS},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Car {
	#[serde(alias = "title")]
	pub name: String,
	#[serde(default, deserialize_with = "text_or_number")]
	pub year: String,
	#[serde(default)]
	pub image: String,
	#[serde(default)]
	pub description: String,
	/// Sum of every submitted rating.
	#[serde(default)]
	pub rating: f64,
	/// Number of ratings submitted.
	#[serde(default)]
	pub rated: u32,
}

impl Car {
	pub fn average_rating(&self) -> f64 {
		rating::average(self.rating, self.rated)
	}

	/// Overwrites every editable field. Rating aggregates are never part of the form.
	pub fn apply(&mut self, form: CarForm) {
		self.name = form.name;
		self.year = form.year;
		self.image = form.image;
		self.description = form.description;
	}
}

/// The fields a user edits on the detail page or the standalone update form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CarForm {
	#[serde(alias = "title")]
	pub name: String,
	#[serde(default, deserialize_with = "text_or_number")]
	pub year: String,
	#[serde(default)]
	pub image: String,
	#[serde(default)]
	pub description: String,
}

impl CarForm {
	fn validate(self) -> AppResult<Self> {
		if self.name.trim().is_empty() {
			return Err(AppError::Validation("Please enter a name.".to_string()));
		}
		Ok(self)
	}
}

impl From<&Car> for CarForm {
	fn from(car: &Car) -> Self {
		CarForm {
			name: car.name.clone(),
			year: car.year.clone(),
			image: car.image.clone(),
			description: car.description.clone(),
		}
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CarCard {
	pub id: String,
	pub name: String,
	pub year: String,
	pub image: String,
	pub average_rating: f64,
}

impl CarCard {
	pub fn new(id: String, car: &Car) -> Self {
		CarCard {
			id,
			name: car.name.clone(),
			year: car.year.clone(),
			image: car.image.clone(),
			average_rating: car.average_rating(),
		}
	}
}

/// Detail page payload. `car` is `None` for an unknown id, rendered as a placeholder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DetailView {
	pub id: String,
	pub car: Option<Car>,
	pub average_rating: f64,
	pub stars: f64,
}

impl DetailView {
	pub fn new(id: String, car: Car) -> Self {
		DetailView {
			id,
			average_rating: car.average_rating(),
			stars: rating::stars(car.rating, car.rated),
			car: Some(car),
		}
	}

	pub fn placeholder(id: String) -> Self {
		DetailView {
			id,
			car: None,
			average_rating: 0.0,
			stars: 0.0,
		}
	}
}

/// Older records store the year as a number.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	match Value::deserialize(deserializer)? {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		Value::Null => Ok(String::new()),
		other => Err(serde::de::Error::custom(format!("expected text or number, got {}", other))),
	}
}

pub async fn find_car(db: &DbClient, id: &str) -> AppResult<Option<Car>> {
	store::fetch(db, CARS, id).await
}

pub async fn all_cars(db: &DbClient) -> AppResult<Vec<(String, Car)>> {
	store::fetch_all(db, CARS).await
}

pub async fn get_cars(db: State<DbClient>) -> AppResult<Json<Vec<CarCard>>> {
	let cars = all_cars(&db).await?;
	log::debug!("listing {} cars", cars.len());
	Ok(Json(cars.into_iter().map(|(id, car)| CarCard::new(id, &car)).collect()))
}

pub async fn car_detail(db: State<DbClient>, Path(id): Path<String>) -> AppResult<Response> {
	Ok(match find_car(&db, &id).await? {
		Some(car) => Json(DetailView::new(id, car)).into_response(),
		None => (StatusCode::NOT_FOUND, Json(DetailView::placeholder(id))).into_response(),
	})
}

pub async fn car_form(db: State<DbClient>, Path(id): Path<String>) -> AppResult<Json<CarForm>> {
	let car = find_car(&db, &id).await?.ok_or(AppError::NotFound("car"))?;
	Ok(Json(CarForm::from(&car)))
}

/// Last writer wins: there is no version check between the fetch and the write.
pub async fn update_car(CurrentUser(user): CurrentUser, db: State<DbClient>, Path(id): Path<String>, Json(form): Json<CarForm>) -> AppResult<Json<DetailView>> {
	let form = form.validate()?;
	let mut car = find_car(&db, &id).await?.ok_or(AppError::NotFound("car"))?;
	car.apply(form);
	store::store(&db, CARS, &id, &car).await?;
	log::info!("car {} updated by {}", id, user.sub);

	Ok(Json(DetailView::new(id, car)))
}

pub async fn create_car(CurrentUser(user): CurrentUser, db: State<DbClient>, Json(form): Json<CarForm>) -> AppResult<(StatusCode, Json<DetailView>)> {
	let form = form.validate()?;
	let car = Car {
		name: form.name,
		year: form.year,
		image: form.image,
		description: form.description,
		rating: 0.0,
		rated: 0,
	};
	let id = keys::new_id();
	store::store(&db, CARS, &id, &car).await?;
	log::info!("car {} added by {}", id, user.sub);

	Ok((StatusCode::CREATED, Json(DetailView::new(id, car))))
}

pub async fn delete_car(CurrentUser(user): CurrentUser, db: State<DbClient>, Path(id): Path<String>) -> AppResult<StatusCode> {
	if !db.delete(CARS, &id).await? {
		return Err(AppError::NotFound("car"));
	}
	log::info!("car {} deleted by {}", id, user.sub);
	Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn car() -> Car {
		serde_json::from_value(json!({
			"title": "Ambassador",
			"year": 1958,
			"image": "https://img/amby.png",
			"description": "Classic",
			"rating": 9.0,
			"rated": 2
		}))
		.unwrap()
	}

	#[test]
	fn test_car_accepts_title_and_numeric_year() {
		let car = car();
		assert_eq!(car.name, "Ambassador");
		assert_eq!(car.year, "1958");
		assert_eq!(car.average_rating(), 4.5);
	}

	#[test]
	fn test_missing_aggregates_default_to_zero() {
		let car: Car = serde_json::from_value(json!({"name": "Gypsy"})).unwrap();
		assert_eq!((car.rating, car.rated), (0.0, 0));
		assert_eq!(car.average_rating(), 0.0);
	}

	#[test]
	fn test_unchanged_form_is_noop() {
		let before = car();
		let mut after = before.clone();
		after.apply(CarForm::from(&before));
		assert_eq!(after, before);
	}

	#[test]
	fn test_apply_keeps_rating_aggregates() {
		let mut car = car();
		car.apply(CarForm {
			name: "Ambassador Nova".to_string(),
			year: "1990".to_string(),
			image: String::new(),
			description: String::new(),
		});
		assert_eq!(car.name, "Ambassador Nova");
		assert_eq!((car.rating, car.rated), (9.0, 2));
	}

	#[test]
	fn test_blank_name_rejected() {
		let form = CarForm {
			name: "  ".to_string(),
			year: String::new(),
			image: String::new(),
			description: String::new(),
		};
		assert!(matches!(form.validate(), Err(AppError::Validation(_))));
	}

	#[test]
	fn test_placeholder_view() {
		let view = DetailView::placeholder("missing".to_string());
		assert!(view.car.is_none());
		assert_eq!(view.average_rating, 0.0);
	}
}
