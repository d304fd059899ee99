//! Validation Utilities

use validator::ValidationErrors;

use super::error::AppError;

/// Convert validator output into a single-message `AppError::Validation`.
/// The first failing field wins; the client sees `"field: message"`.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let detail = e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_default();
                format!("{field}: {detail}")
            })
        })
        .next()
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct RenameBody {
        #[validate(length(min = 1, message = "must not be empty"))]
        chat_name: String,
    }

    #[test]
    fn test_first_field_error_becomes_message() {
        let err = RenameBody {
            chat_name: String::new(),
        }
        .validate()
        .unwrap_err();

        match validation_error(err) {
            AppError::Validation(message) => {
                assert_eq!(message, "chat_name: must not be empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_error_set_gets_generic_message() {
        match validation_error(ValidationErrors::new()) {
            AppError::Validation(message) => assert_eq!(message, "Validation failed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
