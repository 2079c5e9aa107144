#![allow(dead_code)]

use tablemap::{ColumnMetadata, EnumMeta, EnumMode, Field, Mapped, Record, SqlEnum, TableMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low = 1,
    Normal = 5,
    Urgent = 9,
}

pub static PRIORITY: EnumMeta =
    EnumMeta::new("Priority", &[("Low", 1), ("Normal", 5), ("Urgent", 9)]);

impl SqlEnum for Priority {
    fn enum_meta() -> &'static EnumMeta {
        &PRIORITY
    }

    fn to_i64(&self) -> i64 {
        *self as i64
    }
}

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

/// Same `Employee` table, seen with its department link.
#[derive(Debug, Clone)]
pub struct EmployeeDept {
    pub id: i32,
    pub dept_id: i32,
}

static EMPLOYEE_DEPT_COLUMNS: [ColumnMetadata; 2] = [
    ColumnMetadata::new("Id", "Id").search_key(),
    ColumnMetadata::new("DeptId", "DeptId"),
];

static EMPLOYEE_DEPT: TableMetadata = TableMetadata::new("Employee")
    .schema("dbo")
    .members(&EMPLOYEE_DEPT_COLUMNS);

impl Record for EmployeeDept {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "Id" => Some(Field::value(self.id)),
            "DeptId" => Some(Field::value(self.dept_id)),
            _ => None,
        }
    }
}

impl Mapped for EmployeeDept {
    fn metadata() -> &'static TableMetadata {
        &EMPLOYEE_DEPT
    }
}

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

/// `[ops].[Ticket]` with an enum column stored by name.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    pub priority: Priority,
}

static TICKET_COLUMNS: [ColumnMetadata; 3] = [
    ColumnMetadata::new("Id", "TicketId").search_key().skip_insert(),
    ColumnMetadata::new("Subject", "Subject"),
    ColumnMetadata::new("Priority", "Priority").enumerated(&PRIORITY, EnumMode::AsString),
];

static TICKET: TableMetadata = TableMetadata::new("Ticket")
    .schema("ops")
    .members(&TICKET_COLUMNS);

impl Record for Ticket {
    fn field(&self, member: &str) -> Option<Field> {
        match member {
            "Id" => Some(Field::value(self.id)),
            "Subject" => Some(Field::value(&self.subject)),
            "Priority" => Some(Field::Value(self.priority.to_sql_value())),
            _ => None,
        }
    }
}

impl Mapped for Ticket {
    fn metadata() -> &'static TableMetadata {
        &TICKET
    }
}

pub fn employee(id: i32, name: &str) -> Employee {
    Employee {
        id,
        name: name.to_string(),
    }
}
