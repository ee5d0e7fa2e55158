use axum::{
	extract::{Query, State},
	Json,
};
use serde::Deserialize;

use crate::{
	cars::cars::{all_cars, Car, CarCard},
	error::AppResult,
	store::DbClient,
};

const MAX_DISTANCE: usize = 2;

#[derive(Deserialize, Debug)]
pub struct SearchParams {
	#[serde(default)]
	pub q: String,
}

fn close(field: &str, keyword: &str) -> bool {
	if field.is_empty() {
		return false;
	}
	let field = field.to_lowercase();
	// short keywords are within typo distance of almost anything
	field.contains(keyword) || (keyword.chars().count() > MAX_DISTANCE && levenshtein::levenshtein(&field, keyword) <= MAX_DISTANCE)
}

/// Matches on name, year or description, tolerating small typos.
pub fn matches(car: &Car, keyword: &str) -> bool {
	close(&car.name, keyword) || close(&car.year, keyword) || close(&car.description, keyword)
}

pub async fn search(db: State<DbClient>, Query(params): Query<SearchParams>) -> AppResult<Json<Vec<CarCard>>> {
	let keyword = params.q.trim().to_lowercase();
	let cars = all_cars(&db).await?;
	if keyword.is_empty() {
		return Ok(Json(cars.into_iter().map(|(id, car)| CarCard::new(id, &car)).collect()));
	}

	let found: Vec<CarCard> = cars.into_iter().filter(|(_, car)| matches(car, &keyword)).map(|(id, car)| CarCard::new(id, &car)).collect();
	log::debug!("search `{}` matched {} cars", keyword, found.len());
	Ok(Json(found))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn car(name: &str, year: &str, description: &str) -> Car {
		Car {
			name: name.to_string(),
			year: year.to_string(),
			image: String::new(),
			description: description.to_string(),
			rating: 0.0,
			rated: 0,
		}
	}

	#[test]
	fn test_matches_typos_and_substrings() {
		let amby = car("Ambassador", "1958", "Hindustan Motors classic");
		assert!(matches(&amby, "ambasador"));
		assert!(matches(&amby, "hindustan"));
		assert!(matches(&amby, "1958"));
		assert!(!matches(&amby, "tesla"));
	}

	#[test]
	fn test_short_keyword_needs_substring() {
		let bare = car("Gypsy", "", "");
		assert!(!matches(&bare, "ab"));
		assert!(matches(&bare, "gy"));
	}
}
