use crate::error::{AppError, AppResult};

pub const MOBILE_DIGITS: usize = 10;

/// Accepts exactly ten ASCII digits, nothing else. Runs before any network call.
pub fn validate_mobile(mobile: &str) -> AppResult<&str> {
	if mobile.len() == MOBILE_DIGITS && mobile.bytes().all(|b| b.is_ascii_digit()) {
		Ok(mobile)
	} else {
		Err(AppError::InvalidPhone)
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn test_validate_mobile_examples() {
		assert!(validate_mobile("9876543210").is_ok());
		assert!(validate_mobile("0000000000").is_ok());
		assert!(validate_mobile("987654321").is_err());
		assert!(validate_mobile("98765432101").is_err());
		assert!(validate_mobile("+919876543").is_err());
		assert!(validate_mobile("98765 4321").is_err());
		assert!(validate_mobile("").is_err());
		// non-ASCII digits are not phone digits
		assert!(validate_mobile("٩٨٧٦٥٤٣٢١٠").is_err());
	}

	proptest! {
		#[test]
		fn test_any_ten_digits_accepted(mobile in "[0-9]{10}") {
			prop_assert!(validate_mobile(&mobile).is_ok());
		}

		#[test]
		fn test_wrong_length_rejected(mobile in "[0-9]{0,9}|[0-9]{11,20}") {
			prop_assert!(matches!(validate_mobile(&mobile), Err(AppError::InvalidPhone)));
		}

		#[test]
		fn test_non_digit_rejected(prefix in "[0-9]{0,9}", bad in "[^0-9]", suffix in "[0-9]{0,9}") {
			let mobile = format!("{}{}{}", prefix, bad, suffix);
			prop_assert!(validate_mobile(&mobile).is_err());
		}
	}
}
