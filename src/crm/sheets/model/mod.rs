use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crm::sheets::workload::SitePlan;

/// A cell exactly as it came out of the spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RawCell {
    /// Whether the cell holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Blank => true,
            RawCell::Text(value) => value.trim().is_empty(),
            RawCell::Number(_) | RawCell::Bool(_) => false,
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<bool> for RawCell {
    fn from(value: bool) -> Self {
        RawCell::Bool(value)
    }
}

/// First worksheet of an uploaded workbook, as plain cells.
///
/// `rows[0]` is the header row; `first_row` is its 1-based sheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub first_row: usize,
    pub rows: Vec<Vec<RawCell>>,
}

impl Sheet {
    /// Builds a sheet whose header sits on row 1.
    pub fn from_rows(rows: Vec<Vec<RawCell>>) -> Self {
        Self { first_row: 1, rows }
    }

    pub fn header(&self) -> Option<&[RawCell]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Data rows paired with their 1-based sheet row number.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[RawCell])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(offset, cells)| (self.first_row + offset, cells.as_slice()))
    }
}

/// Normalized value stored in a canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
}

impl Scalar {
    /// Returns the text payload when the scalar is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Scalar::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(value) => f.write_str(value),
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Decimal(value) => write!(f, "{value}"),
            Scalar::Flag(value) => write!(f, "{value}"),
        }
    }
}

/// Canonical field names shared by every sheet kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CompanyName,
    Name,
    Email,
    Phone,
    BillingAddress,
    Depannage,
    Astreinte,
    Tags,
    Status,
    Client,
    Prestation,
    Category,
    BudgetCode,
    Frequency,
    FrequencyInterval,
    FrequencyUnit,
    Amount,
    Site,
    Equipment,
    Efficiency,
    FilterType,
    Dimensions,
    Quantity,
    OrderWeek,
    Ordered,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::CompanyName => "company_name",
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::BillingAddress => "billing_address",
            Field::Depannage => "depannage",
            Field::Astreinte => "astreinte",
            Field::Tags => "tags",
            Field::Status => "status",
            Field::Client => "client",
            Field::Prestation => "prestation",
            Field::Category => "category",
            Field::BudgetCode => "budget_code",
            Field::Frequency => "frequency",
            Field::FrequencyInterval => "frequency_interval",
            Field::FrequencyUnit => "frequency_unit",
            Field::Amount => "amount",
            Field::Site => "site",
            Field::Equipment => "equipment",
            Field::Efficiency => "efficiency",
            Field::FilterType => "filter_type",
            Field::Dimensions => "dimensions",
            Field::Quantity => "quantity",
            Field::OrderWeek => "order_week",
            Field::Ordered => "ordered",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-fields of the repeated contact group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

/// The four sheet layouts the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Clients,
    Services,
    Parts,
    Workload,
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SheetKind::Clients => "clients",
            SheetKind::Services => "services",
            SheetKind::Parts => "parts",
            SheetKind::Workload => "workload",
        };
        f.write_str(name)
    }
}

/// A contact nested under a client row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One validated row, keyed by canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// 1-based source row number.
    pub row: usize,
    pub fields: BTreeMap<Field, Scalar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<ContactRecord>,
    /// Identifier of the client a services row was linked to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl CanonicalRecord {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            fields: BTreeMap::new(),
            contacts: Vec::new(),
            client_id: None,
        }
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, field: Field, value: Scalar) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&Scalar> {
        self.fields.get(&field)
    }

    /// Returns the field as text, if it is present and textual.
    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(Scalar::as_text)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn remove(&mut self, field: Field) -> Option<Scalar> {
        self.fields.remove(&field)
    }
}

/// An accepted row on its way to the record-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportedRow {
    Record(CanonicalRecord),
    Site(SitePlan),
}

impl ImportedRow {
    pub fn row(&self) -> usize {
        match self {
            ImportedRow::Record(record) => record.row,
            ImportedRow::Site(plan) => plan.row,
        }
    }
}

/// Summary of one import call, delivered once to the report sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub created: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    /// Outcome for an import that failed before any row was read.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            created: 0,
            total: 0,
            errors: vec![message.into()],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
