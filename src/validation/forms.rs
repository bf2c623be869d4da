use axum::extract::FromRequest;
use garde::Validate;

use crate::error::{AppError, FieldErrors, Result};

/// A JSON request body whose parse failures are `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Runs the `garde` rules of a request payload.
///
/// Failures become `AppError::Validation` with the messages grouped by
/// field, ready for inline display next to form inputs.
pub fn validate<T>(payload: &T) -> Result<()>
where
    T: Validate,
    T::Context: Default,
{
    let Err(report) = payload.validate() else {
        return Ok(());
    };

    let mut field_errors = FieldErrors::new();
    for (path, error) in report.iter() {
        let field = path.to_string();
        let field = if field.is_empty() { "form".to_string() } else { field };
        field_errors
            .entry(field)
            .or_default()
            .push(error.message().to_string());
    }

    let message = field_errors
        .iter()
        .next()
        .and_then(|(field, messages)| {
            messages.first().map(|m| format!("{}: {}", field, m))
        })
        .unwrap_or_else(|| "Invalid form data".to_string());

    Err(AppError::Validation {
        message,
        field_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Form {
        #[garde(email)]
        email: String,
        #[garde(length(min = 8))]
        password: String,
    }

    #[test]
    fn valid_form_passes() {
        let form = Form {
            email: "jane@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate(&form).is_ok());
    }

    #[test]
    fn errors_are_grouped_by_field() {
        let form = Form {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        match validate(&form) {
            Err(AppError::Validation { field_errors, .. }) => {
                assert!(field_errors.contains_key("email"));
                assert!(field_errors.contains_key("password"));
                assert_eq!(field_errors.len(), 2);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
