use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::queue::QueueError;

const MOBILE_NOT_PROVIDED: &str = "Not provided";

/// Roster entry. Only employees on the roster can take a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub emp_id: String,
    pub name: String,
    pub gender: String,
    pub department: String,
    pub mobile: String,
}

/// Roster submission as it arrives from the staff form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEmployee {
    pub emp_id: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub department: Option<String>,
    pub mobile: Option<String>,
}

impl NewEmployee {
    pub fn validate(self) -> Result<Employee, QueueError> {
        fn required(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let (Some(emp_id), Some(name), Some(gender), Some(department)) = (
            required(self.emp_id),
            required(self.name),
            required(self.gender),
            required(self.department),
        ) else {
            return Err(QueueError::Validation(
                "Please fill in all mandatory fields.".to_string(),
            ));
        };

        Ok(Employee {
            emp_id,
            name,
            gender,
            department,
            mobile: required(self.mobile).unwrap_or_else(|| MOBILE_NOT_PROVIDED.to_string()),
        })
    }
}
