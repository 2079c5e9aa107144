//! Mapped types shared by unit tests.

use chrono::NaiveDateTime;

use crate::metadata::{ColumnMetadata, Field, Mapped, Record, TableMetadata};
use crate::value::{EnumMeta, EnumMode, SqlEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active = 1,
    Suspended = 2,
    Retired = 3,
}

pub static STATUS: EnumMeta = EnumMeta::new(
    "Status",
    &[("Active", 1), ("Suspended", 2), ("Retired", 3)],
);

impl SqlEnum for Status {
    fn enum_meta() -> &'static EnumMeta {
        &STATUS
    }

    fn to_i64(&self) -> i64 {
        *self as i64
    }
}

/// Two-column table: `[dbo].[Employee]`.
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: i32,
    pub name: String,
}

static EMPLOYEE_COLUMNS: [ColumnMetadata; 2] = [
    ColumnMetadata::new("Id", "Id").search_key(),
    ColumnMetadata::new("Name", "Name"),
];

static EMPLOYEE: TableMetadata = TableMetadata::new("Employee")
    .schema("dbo")
    .members(&EMPLOYEE_COLUMNS);

impl Record for Employee {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "Id" => Some(Field::value(self.id)),
            "Name" => Some(Field::value(&self.name)),
            _ => None,
        }
    }
}

impl Mapped for Employee {
    fn metadata() -> &'static TableMetadata {
        &EMPLOYEE
    }
}

/// `[dbo].[Staff]` with an enum column stored as text.
#[derive(Debug, Clone)]
pub struct Staff {
    pub id: i32,
    pub name: String,
    pub dept_id: i32,
    pub status: Status,
    pub manager_id: Option<i32>,
}

static STAFF_COLUMNS: [ColumnMetadata; 5] = [
    ColumnMetadata::new("Id", "Id").search_key().skip_insert(),
    ColumnMetadata::new("Name", "Name"),
    ColumnMetadata::new("DeptId", "DeptId"),
    ColumnMetadata::new("Status", "Status").enumerated(&STATUS, EnumMode::AsString),
    ColumnMetadata::new("ManagerId", "ManagerId"),
];

static STAFF: TableMetadata = TableMetadata::new("Staff")
    .schema("dbo")
    .members(&STAFF_COLUMNS);

impl Record for Staff {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "Id" => Some(Field::value(self.id)),
            "Name" => Some(Field::value(&self.name)),
            "DeptId" => Some(Field::value(self.dept_id)),
            "Status" => Some(Field::Value(self.status.to_sql_value())),
            "ManagerId" => Some(Field::value(self.manager_id)),
            _ => None,
        }
    }
}

impl Mapped for Staff {
    fn metadata() -> &'static TableMetadata {
        &STAFF
    }
}

/// Read-only view over the `Staff` table.
#[derive(Debug, Clone)]
pub struct StaffView {
    pub id: i32,
}

static STAFF_VIEW_COLUMNS: [ColumnMetadata; 1] = [ColumnMetadata::new("Id", "Id")];

static STAFF_VIEW: TableMetadata = TableMetadata::new("Staff")
    .schema("dbo")
    .members(&STAFF_VIEW_COLUMNS);

impl Record for StaffView {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "Id" => Some(Field::value(self.id)),
            _ => None,
        }
    }
}

impl Mapped for StaffView {
    fn metadata() -> &'static TableMetadata {
        &STAFF_VIEW
    }
}

/// `[dbo].[Department]`
#[derive(Debug, Clone)]
pub struct Department {
    pub id: i32,
    pub title: String,
}

static DEPARTMENT_COLUMNS: [ColumnMetadata; 2] = [
    ColumnMetadata::new("Id", "Id").search_key(),
    ColumnMetadata::new("Title", "Title"),
];

static DEPARTMENT: TableMetadata = TableMetadata::new("Department")
    .schema("dbo")
    .members(&DEPARTMENT_COLUMNS);

impl Record for Department {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "Id" => Some(Field::value(self.id)),
            "Title" => Some(Field::value(&self.title)),
            _ => None,
        }
    }
}

impl Mapped for Department {
    fn metadata() -> &'static TableMetadata {
        &DEPARTMENT
    }
}

/// Composite key, JSON column and an insert-only timestamp; no declared schema.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub order_id: i32,
    pub line_no: i32,
    pub sku: String,
    pub qty: i32,
    pub notes: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

static ORDER_LINE_COLUMNS: [ColumnMetadata; 6] = [
    ColumnMetadata::new("order_id", "OrderId").search_key(),
    ColumnMetadata::new("line_no", "LineNo").search_key(),
    ColumnMetadata::new("sku", "Sku"),
    ColumnMetadata::new("qty", "Qty"),
    ColumnMetadata::new("notes", "Notes").json(),
    ColumnMetadata::new("created_at", "CreatedAt").skip_update(),
];

static ORDER_LINE: TableMetadata = TableMetadata::new("OrderLine").members(&ORDER_LINE_COLUMNS);

impl Record for OrderLine {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "order_id" => Some(Field::value(self.order_id)),
            "line_no" => Some(Field::value(self.line_no)),
            "sku" => Some(Field::value(&self.sku)),
            "qty" => Some(Field::value(self.qty)),
            "notes" => Some(Field::value(self.notes.clone())),
            "created_at" => Some(Field::value(self.created_at)),
            _ => None,
        }
    }
}

impl Mapped for OrderLine {
    fn metadata() -> &'static TableMetadata {
        &ORDER_LINE
    }
}

/// A captured local used in filters.
#[derive(Debug, Clone)]
pub struct Limits {
    pub min_id: i32,
    pub inner: Inner,
}

#[derive(Debug, Clone)]
pub struct Inner {
    pub value: String,
}

impl Record for Limits {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "min_id" => Some(Field::value(self.min_id)),
            "inner" => Some(Field::record(self.inner.clone())),
            _ => None,
        }
    }
}

impl Record for Inner {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "value" => Some(Field::value(&self.value)),
            _ => None,
        }
    }
}

pub fn employee(id: i32, name: &str) -> Employee {
    Employee {
        id,
        name: name.to_string(),
    }
}

pub fn staff(id: i32, name: &str, status: Status) -> Staff {
    Staff {
        id,
        name: name.to_string(),
        dept_id: 10,
        status,
        manager_id: None,
    }
}
