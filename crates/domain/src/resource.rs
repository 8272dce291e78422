//! Domain resources managed from the dashboard and their scope layout.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pondok_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Role, ScopeField};

/// Field carrying the gender cohort on partitioned resources.
pub const GENDER_FIELD: &str = "jenis_kelamin";

/// Field carrying the department on partitioned resources.
pub const DEPARTMENT_FIELD: &str = "jurusan";

/// Relation field linking student-owned resources to their student.
pub const STUDENT_RELATION_FIELD: &str = "santri_id";

/// Scope fields a student passes on to the records they own.
pub const STUDENT_SCOPE_FIELDS: [&str; 2] = [GENDER_FIELD, DEPARTMENT_FIELD];

/// Extracts the scope fields present on a student's data.
#[must_use]
pub fn student_scope(data: &Value) -> Map<String, Value> {
    STUDENT_SCOPE_FIELDS
        .iter()
        .filter_map(|field| {
            data.get(*field)
                .map(|value| ((*field).to_owned(), value.clone()))
        })
        .collect()
}

/// Resource collections exposed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Student master data.
    Santri,
    /// Academic grades.
    Nilai,
    /// Quran memorisation progress.
    Tahfidz,
    /// Disciplinary violations.
    Pelanggaran,
    /// Student invoices.
    Tagihan,
    /// Operational expenses.
    Pengeluaran,
    /// Inventory items.
    Inventaris,
    /// Organisational chart entries.
    StrukturOrganisasi,
    /// News posts.
    Berita,
}

impl ResourceKind {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Santri => "santri",
            Self::Nilai => "nilai",
            Self::Tahfidz => "tahfidz",
            Self::Pelanggaran => "pelanggaran",
            Self::Tagihan => "tagihan",
            Self::Pengeluaran => "pengeluaran",
            Self::Inventaris => "inventaris",
            Self::StrukturOrganisasi => "struktur_organisasi",
            Self::Berita => "berita",
        }
    }

    /// Returns all known resources.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceKind] = &[
            ResourceKind::Santri,
            ResourceKind::Nilai,
            ResourceKind::Tahfidz,
            ResourceKind::Pelanggaran,
            ResourceKind::Tagihan,
            ResourceKind::Pengeluaran,
            ResourceKind::Inventaris,
            ResourceKind::StrukturOrganisasi,
            ResourceKind::Berita,
        ];

        ALL
    }

    /// Returns the concrete data field carrying a scope dimension, if the
    /// resource is partitioned on it.
    ///
    /// Student data and every student-owned resource are partitioned on both
    /// dimensions, so a record is visible exactly when its student is.
    #[must_use]
    pub fn scope_field_name(&self, field: ScopeField) -> Option<&'static str> {
        if !(matches!(self, Self::Santri) || self.is_student_owned()) {
            return None;
        }

        match field {
            ScopeField::Gender => Some(GENDER_FIELD),
            ScopeField::Department => Some(DEPARTMENT_FIELD),
        }
    }

    /// Returns the resources whose records belong to one student.
    #[must_use]
    pub fn student_owned() -> &'static [Self] {
        const STUDENT_OWNED: &[ResourceKind] = &[
            ResourceKind::Nilai,
            ResourceKind::Tahfidz,
            ResourceKind::Pelanggaran,
            ResourceKind::Tagihan,
        ];

        STUDENT_OWNED
    }

    /// Returns whether records belong to one student and inherit their scope.
    #[must_use]
    pub fn is_student_owned(&self) -> bool {
        Self::student_owned().contains(self)
    }

    /// Returns whether the role may create, update or delete records.
    #[must_use]
    pub fn writable_by(&self, role: Role) -> bool {
        match role {
            Role::SuperAdmin | Role::Rois => true,
            Role::Bendahara => matches!(self, Self::Tagihan | Self::Pengeluaran),
            Role::Kesantrian => !matches!(self, Self::Tagihan | Self::Pengeluaran),
            Role::Dewan => false,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::NotFound(format!("unknown resource '{value}'")))
    }
}

/// Stored resource record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    record_id: String,
    resource: ResourceKind,
    data: Value,
    created_at: String,
}

impl ResourceRecord {
    /// Creates a record projection.
    #[must_use]
    pub fn new(
        record_id: impl Into<String>,
        resource: ResourceKind,
        data: Value,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            resource,
            data,
            created_at: created_at.into(),
        }
    }

    /// Returns the record id.
    #[must_use]
    pub fn record_id(&self) -> &str {
        self.record_id.as_str()
    }

    /// Returns the owning resource.
    #[must_use]
    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    /// Returns the record payload.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the creation timestamp in RFC3339.
    #[must_use]
    pub fn created_at(&self) -> &str {
        self.created_at.as_str()
    }

    /// Returns a string field from the payload.
    #[must_use]
    pub fn text_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}
