//! Bulk employee import: validate rows, resolve departments, batch persist.
//!
//! Rows arrive either as a multipart CSV upload (headers `name`, `position`,
//! `departmentId`, `hireDate`, optional `salary`) or as a JSON array body.
//! Validation is a fully sequential pass; nothing is written until every row
//! has been parsed and its department resolved. Rows failing any check are
//! skipped and logged, never fatal.

use crate::{auth::auth::AuthUser, error::ApiError, model::employee::Employee};
use actix_multipart::Multipart;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use futures_util::{StreamExt as _, TryStreamExt as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

/// Upload size cap (5MB).
const MAX_IMPORT_SIZE: usize = 5 * 1024 * 1024;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One raw import row, all fields still unvalidated text.
#[derive(Debug, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub position: Option<String>,

    #[serde(default, rename = "departmentId", alias = "department_id")]
    pub department_id: Option<String>,

    #[serde(default, rename = "hireDate", alias = "hire_date")]
    pub hire_date: Option<String>,

    #[serde(default)]
    pub salary: Option<String>,
}

impl RawRow {
    /// Lift one element of a JSON array body into a row. String and number
    /// values are both accepted; anything else counts as absent.
    pub fn from_json(value: &Value) -> Self {
        fn field(value: &Value, keys: &[&str]) -> Option<String> {
            for key in keys {
                match value.get(key) {
                    Some(Value::String(s)) => return Some(s.clone()),
                    Some(Value::Number(n)) => return Some(n.to_string()),
                    _ => {}
                }
            }
            None
        }

        RawRow {
            name: field(value, &["name"]),
            position: field(value, &["position"]),
            department_id: field(value, &["departmentId", "department_id"]),
            hire_date: field(value, &["hireDate", "hire_date"]),
            salary: field(value, &["salary"]),
        }
    }
}

/// Why a row was dropped from the batch.
#[derive(Debug, PartialEq)]
pub enum SkipReason {
    MissingName,
    MissingDepartmentId,
    InvalidDepartmentId,
    UnknownDepartment,
    InvalidHireDate,
    NegativeSalary,
}

impl SkipReason {
    fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingName => "missing name",
            SkipReason::MissingDepartmentId => "missing departmentId",
            SkipReason::InvalidDepartmentId => "departmentId is not an integer",
            SkipReason::UnknownDepartment => "department not found",
            SkipReason::InvalidHireDate => "unparseable hireDate",
            SkipReason::NegativeSalary => "negative salary",
        }
    }
}

/// A row that passed field validation, before department resolution.
#[derive(Debug, PartialEq)]
pub struct ParsedRow {
    pub name: String,
    pub position: Option<String>,
    pub department_id: u64,
    pub hire_date: NaiveDate,
    pub salary: f64,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Field validation for one row. Absent hire date falls back to `today`;
/// a present but unparseable date skips the row (the stricter of the two
/// upstream policies). Salary defaults to 0 when absent or unparseable.
pub fn parse_row(row: &RawRow, today: NaiveDate) -> Result<ParsedRow, SkipReason> {
    let name = present(&row.name).ok_or(SkipReason::MissingName)?;

    let department_id = present(&row.department_id).ok_or(SkipReason::MissingDepartmentId)?;
    let department_id: u64 = department_id
        .parse()
        .map_err(|_| SkipReason::InvalidDepartmentId)?;

    let hire_date = match present(&row.hire_date) {
        Some(raw) => {
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| SkipReason::InvalidHireDate)?
        }
        None => today,
    };

    let salary = present(&row.salary)
        .and_then(|raw| raw.parse::<f64>().ok())
        .unwrap_or(0.0);
    if salary < 0.0 {
        return Err(SkipReason::NegativeSalary);
    }

    Ok(ParsedRow {
        name: name.to_string(),
        position: present(&row.position).map(str::to_string),
        department_id,
        hire_date,
        salary,
    })
}

/// Decode a CSV document (with a header row) into raw rows.
pub fn read_csv(data: &[u8]) -> Result<Vec<RawRow>, ApiError> {
    let mut reader = csv::Reader::from_reader(data);

    reader
        .deserialize::<RawRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::validation(format!("Malformed CSV: {}", e)))
}

#[derive(Serialize, ToSchema)]
pub struct ImportSummary {
    #[schema(example = "Bulk import completed")]
    pub message: String,
    #[schema(example = 2)]
    pub count: usize,
    pub employees: Vec<Employee>,
}

/// The pipeline proper: validate each row, resolve its department (one
/// lookup per row), then persist all accepted rows as a single multi-row
/// INSERT. No transaction wraps the import; the one statement is the batch.
pub async fn run_import(pool: &MySqlPool, rows: Vec<RawRow>) -> Result<ImportSummary, ApiError> {
    let today = Utc::now().date_naive();
    let mut accepted: Vec<ParsedRow> = Vec::new();

    for (index, raw) in rows.iter().enumerate() {
        let parsed = match parse_row(raw, today) {
            Ok(parsed) => parsed,
            Err(reason) => {
                info!(row = index, reason = reason.as_str(), "Skipping import row");
                continue;
            }
        };

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM departments WHERE id = ? LIMIT 1)",
        )
        .bind(parsed.department_id)
        .fetch_one(pool)
        .await?;

        if !exists {
            info!(
                row = index,
                department_id = parsed.department_id,
                reason = SkipReason::UnknownDepartment.as_str(),
                "Skipping import row"
            );
            continue;
        }

        accepted.push(parsed);
    }

    if accepted.is_empty() {
        return Ok(ImportSummary {
            message: "Bulk import completed".to_string(),
            count: 0,
            employees: Vec::new(),
        });
    }

    let now = Utc::now().naive_utc();

    let mut builder = sqlx::QueryBuilder::new(
        "INSERT INTO employees \
         (name, position, salary, is_active, hire_date, last_activity_date, department_id) ",
    );
    builder.push_values(accepted.iter(), |mut b, row| {
        b.push_bind(&row.name)
            .push_bind(&row.position)
            .push_bind(row.salary)
            .push_bind(true)
            .push_bind(row.hire_date)
            .push_bind(now)
            .push_bind(row.department_id);
    });

    let result = builder.build().execute(pool).await?;

    // A single multi-row INSERT assigns contiguous ids starting at
    // last_insert_id; re-read that range to return the persisted records.
    let first_id = result.last_insert_id();
    let count = accepted.len();

    let employees = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE id >= ? AND id < ? ORDER BY id",
    )
    .bind(first_id)
    .bind(first_id + count as u64)
    .fetch_all(pool)
    .await?;

    info!(accepted = count, total = rows.len(), "Bulk import persisted");

    Ok(ImportSummary {
        message: "Bulk import completed".to_string(),
        count,
        employees,
    })
}

async fn read_multipart_file(req: &HttpRequest, payload: web::Payload) -> Result<Vec<u8>, ApiError> {
    let mut multipart = Multipart::new(req.headers(), payload);

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {}", e)))?
    {
        let mut data = Vec::new();

        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {}", e)))?
        {
            if data.len() + chunk.len() > MAX_IMPORT_SIZE {
                return Err(ApiError::validation("Uploaded file is too large"));
            }
            data.extend_from_slice(&chunk);
        }

        // First file field wins, matching single-file upload semantics.
        return Ok(data);
    }

    Err(ApiError::validation("No file uploaded"))
}

async fn read_body(mut payload: web::Payload) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ApiError::validation(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > MAX_IMPORT_SIZE {
            return Err(ApiError::validation("Request body is too large"));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Bulk import endpoint. Accepts `multipart/form-data` with a CSV file, or
/// a JSON array of row objects.
#[utoipa::path(
    post,
    path = "/api/employees/bulk",
    request_body(
        content = String,
        description = "CSV file upload (multipart) or a JSON array of rows \
                       with fields name, position, departmentId, hireDate, salary",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Import summary", body = ImportSummary),
        (status = 400, description = "Unreadable upload or body"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn bulk_import(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<impl Responder, ApiError> {
    let rows = if req.content_type().starts_with("multipart/") {
        let data = read_multipart_file(&req, payload).await?;
        read_csv(&data)?
    } else {
        let body = read_body(payload).await?;
        let values: Vec<Value> = serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Body must be a JSON array: {}", e)))?;
        values.iter().map(RawRow::from_json).collect()
    };

    let summary = run_import(pool.get_ref(), rows).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
    }

    fn row(name: Option<&str>, dept: Option<&str>) -> RawRow {
        RawRow {
            name: name.map(str::to_string),
            department_id: dept.map(str::to_string),
            ..RawRow::default()
        }
    }

    #[test]
    fn valid_row_parses_with_defaults() {
        let parsed = parse_row(&row(Some("A"), Some("1")), today()).unwrap();
        assert_eq!(parsed.name, "A");
        assert_eq!(parsed.department_id, 1);
        assert_eq!(parsed.hire_date, today());
        assert_eq!(parsed.salary, 0.0);
        assert_eq!(parsed.position, None);
    }

    #[test]
    fn missing_name_is_skipped() {
        assert_eq!(
            parse_row(&row(None, Some("1")), today()),
            Err(SkipReason::MissingName)
        );
        assert_eq!(
            parse_row(&row(Some("   "), Some("1")), today()),
            Err(SkipReason::MissingName)
        );
    }

    #[test]
    fn missing_or_non_numeric_department_is_skipped() {
        assert_eq!(
            parse_row(&row(Some("A"), None), today()),
            Err(SkipReason::MissingDepartmentId)
        );
        assert_eq!(
            parse_row(&row(Some("A"), Some("abc")), today()),
            Err(SkipReason::InvalidDepartmentId)
        );
        assert_eq!(
            parse_row(&row(Some("A"), Some("1.5")), today()),
            Err(SkipReason::InvalidDepartmentId)
        );
    }

    #[test]
    fn unparseable_hire_date_skips_the_row() {
        let mut raw = row(Some("A"), Some("1"));
        raw.hire_date = Some("not-a-date".to_string());
        assert_eq!(parse_row(&raw, today()), Err(SkipReason::InvalidHireDate));

        raw.hire_date = Some("2024-02-30".to_string());
        assert_eq!(parse_row(&raw, today()), Err(SkipReason::InvalidHireDate));
    }

    #[test]
    fn supplied_hire_date_is_used() {
        let mut raw = row(Some("A"), Some("1"));
        raw.hire_date = Some("2024-01-15".to_string());
        let parsed = parse_row(&raw, today()).unwrap();
        assert_eq!(parsed.hire_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn salary_defaults_to_zero_on_parse_failure() {
        let mut raw = row(Some("A"), Some("1"));
        raw.salary = Some("lots".to_string());
        assert_eq!(parse_row(&raw, today()).unwrap().salary, 0.0);

        raw.salary = Some("42000.5".to_string());
        assert_eq!(parse_row(&raw, today()).unwrap().salary, 42000.5);
    }

    #[test]
    fn negative_salary_skips_the_row() {
        let mut raw = row(Some("A"), Some("1"));
        raw.salary = Some("-1".to_string());
        assert_eq!(parse_row(&raw, today()), Err(SkipReason::NegativeSalary));
    }

    #[test]
    fn json_rows_accept_numbers_and_strings() {
        let raw = RawRow::from_json(&json!({
            "name": "B",
            "departmentId": 999,
            "salary": 1000,
        }));
        assert_eq!(raw.name.as_deref(), Some("B"));
        assert_eq!(raw.department_id.as_deref(), Some("999"));
        assert_eq!(raw.salary.as_deref(), Some("1000"));

        let raw = RawRow::from_json(&json!({
            "name": "C",
            "department_id": "3",
            "hireDate": "2024-01-01"
        }));
        assert_eq!(raw.department_id.as_deref(), Some("3"));
        assert_eq!(raw.hire_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn csv_rows_decode_with_expected_headers() {
        let data = b"name,position,departmentId,hireDate\n\
                     Ann,Accountant,1,2024-01-01\n\
                     Bob,,999,\n";
        let rows = read_csv(data).unwrap();
        assert_eq!(rows.len(), 2);

        let parsed = parse_row(&rows[0], today()).unwrap();
        assert_eq!(parsed.name, "Ann");
        assert_eq!(parsed.position.as_deref(), Some("Accountant"));
        assert_eq!(parsed.department_id, 1);

        let parsed = parse_row(&rows[1], today()).unwrap();
        assert_eq!(parsed.department_id, 999);
        assert_eq!(parsed.hire_date, today());
    }

    #[test]
    fn csv_with_salary_column() {
        let data = b"name,departmentId,salary\nAnn,1,52000\n";
        let rows = read_csv(data).unwrap();
        assert_eq!(parse_row(&rows[0], today()).unwrap().salary, 52000.0);
    }

    #[test]
    fn garbage_csv_is_a_validation_error() {
        let data = b"name,departmentId\n\"unterminated\n";
        assert!(matches!(
            read_csv(data),
            Err(ApiError::Validation(_))
        ));
    }
}
