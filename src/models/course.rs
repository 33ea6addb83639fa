use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::AppError;

pub const DEFAULT_CREDITS: i64 = 3;
pub const NAME_MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub credits: i64,
}

/// Body of `POST /courses/`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCourseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub credits: Option<Value>,
}

/// Body of `PUT /courses/{id}`.
///
/// Every field distinguishes "absent" (`None`) from "present", so an explicit
/// `null` is still seen as a value: `description: null` clears the description
/// while `credits: null` is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub credits: Option<Value>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A validated insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub credits: i64,
}

/// A validated partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub credits: Option<i64>,
}

impl CourseChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.credits.is_none()
    }
}

impl TryFrom<CreateCourseRequest> for NewCourse {
    type Error = AppError;

    fn try_from(req: CreateCourseRequest) -> Result<Self, Self::Error> {
        let name = validate_name(req.name)?;
        let credits = match req.credits {
            None | Some(Value::Null) => DEFAULT_CREDITS,
            Some(value) => parse_credits(&value)?,
        };

        Ok(Self {
            name,
            description: req.description,
            credits,
        })
    }
}

impl TryFrom<UpdateCourseRequest> for CourseChanges {
    type Error = AppError;

    fn try_from(req: UpdateCourseRequest) -> Result<Self, Self::Error> {
        let name = req.name.map(validate_name).transpose()?;
        let credits = req.credits.as_ref().map(parse_credits).transpose()?;

        Ok(Self {
            name,
            description: req.description,
            credits,
        })
    }
}

fn validate_name(name: Option<String>) -> Result<String, AppError> {
    match name {
        Some(name) if name.is_empty() => Err(AppError::BadRequest("name is required".to_string())),
        Some(name) if name.chars().count() > NAME_MAX_LEN => Err(AppError::BadRequest(format!(
            "name must be at most {} characters",
            NAME_MAX_LEN
        ))),
        Some(name) => Ok(name),
        None => Err(AppError::BadRequest("name is required".to_string())),
    }
}

/// Accepts JSON integers and strings holding a base-10 integer.
pub fn parse_credits(value: &Value) -> Result<i64, AppError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| AppError::BadRequest("credits must be an integer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_bad_request(err: AppError, expected: &str) -> bool {
        matches!(err, AppError::BadRequest(msg) if msg == expected)
    }

    #[test]
    fn test_create_defaults_credits() {
        let req: CreateCourseRequest =
            serde_json::from_value(json!({ "name": "Algorithms" })).unwrap();
        let new = NewCourse::try_from(req).unwrap();

        assert_eq!(new.name, "Algorithms");
        assert_eq!(new.description, None);
        assert_eq!(new.credits, DEFAULT_CREDITS);
    }

    #[test]
    fn test_create_null_credits_uses_default() {
        let req: CreateCourseRequest =
            serde_json::from_value(json!({ "name": "Algorithms", "credits": null })).unwrap();
        assert_eq!(NewCourse::try_from(req).unwrap().credits, DEFAULT_CREDITS);
    }

    #[test]
    fn test_create_requires_name() {
        let missing: CreateCourseRequest = serde_json::from_value(json!({ "credits": 4 })).unwrap();
        assert!(is_bad_request(NewCourse::try_from(missing).unwrap_err(), "name is required"));

        let empty: CreateCourseRequest = serde_json::from_value(json!({ "name": "" })).unwrap();
        assert!(is_bad_request(NewCourse::try_from(empty).unwrap_err(), "name is required"));
    }

    #[test]
    fn test_name_length_limit() {
        let ok = CreateCourseRequest {
            name: Some("a".repeat(NAME_MAX_LEN)),
            ..Default::default()
        };
        assert!(NewCourse::try_from(ok).is_ok());

        let too_long = CreateCourseRequest {
            name: Some("a".repeat(NAME_MAX_LEN + 1)),
            ..Default::default()
        };
        assert!(is_bad_request(
            NewCourse::try_from(too_long).unwrap_err(),
            "name must be at most 128 characters"
        ));
    }

    #[test]
    fn test_create_ignores_unknown_fields() {
        let req: CreateCourseRequest =
            serde_json::from_value(json!({ "name": "Compilers", "room": "B12" })).unwrap();
        assert_eq!(NewCourse::try_from(req).unwrap().name, "Compilers");
    }

    #[test]
    fn test_parse_credits() {
        assert_eq!(parse_credits(&json!(4)).unwrap(), 4);
        assert_eq!(parse_credits(&json!("5")).unwrap(), 5);
        assert_eq!(parse_credits(&json!(" 6 ")).unwrap(), 6);
        assert_eq!(parse_credits(&json!(-2)).unwrap(), -2);

        for bad in [json!("abc"), json!("4.5"), json!(4.5), json!(true), json!(null), json!([1])] {
            assert!(
                is_bad_request(parse_credits(&bad).unwrap_err(), "credits must be an integer"),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_update_distinguishes_absent_and_null() {
        let req: UpdateCourseRequest = serde_json::from_value(json!({})).unwrap();
        let changes = CourseChanges::try_from(req).unwrap();
        assert!(changes.is_empty());

        let req: UpdateCourseRequest =
            serde_json::from_value(json!({ "description": null })).unwrap();
        let changes = CourseChanges::try_from(req).unwrap();
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.name, None);
        assert_eq!(changes.credits, None);
    }

    #[test]
    fn test_update_rejects_bad_credits_and_null_name() {
        let req: UpdateCourseRequest =
            serde_json::from_value(json!({ "name": "Renamed", "credits": "x" })).unwrap();
        assert!(is_bad_request(
            CourseChanges::try_from(req).unwrap_err(),
            "credits must be an integer"
        ));

        let req: UpdateCourseRequest = serde_json::from_value(json!({ "credits": null })).unwrap();
        assert!(CourseChanges::try_from(req).is_err());

        let req: UpdateCourseRequest = serde_json::from_value(json!({ "name": null })).unwrap();
        assert!(is_bad_request(CourseChanges::try_from(req).unwrap_err(), "name is required"));
    }

    #[test]
    fn test_course_serializes_in_column_order() {
        let course = Course {
            id: 1,
            name: "Algorithms".to_string(),
            description: None,
            credits: 4,
        };
        assert_eq!(
            serde_json::to_string(&course).unwrap(),
            r#"{"id":1,"name":"Algorithms","description":null,"credits":4}"#
        );
    }
}
