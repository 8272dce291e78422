//! Roles, scope dimensions and the resolved identity of a dashboard user.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pondok_core::{AccountId, AppError};
use serde::{Deserialize, Serialize};

/// Administrative role assigned through an access profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access, including profile and account management.
    SuperAdmin,
    /// School director.
    Rois,
    /// Treasurer; owns billing and expenses.
    Bendahara,
    /// Student affairs; owns student, grading and discipline data.
    Kesantrian,
    /// Board of trustees; read-only.
    Dewan,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Rois => "rois",
            Self::Bendahara => "bendahara",
            Self::Kesantrian => "kesantrian",
            Self::Dewan => "dewan",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::SuperAdmin,
            Role::Rois,
            Role::Bendahara,
            Role::Kesantrian,
            Role::Dewan,
        ];

        ALL
    }

    /// Returns whether the role may read the audit log.
    #[must_use]
    pub fn can_read_audit_log(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Rois)
    }

    /// Returns whether the role may manage access profiles and admin accounts.
    #[must_use]
    pub fn can_manage_accounts(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "rois" => Ok(Self::Rois),
            "bendahara" => Ok(Self::Bendahara),
            "kesantrian" => Ok(Self::Kesantrian),
            "dewan" => Ok(Self::Dewan),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Gender cohort a profile is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderScope {
    /// Male cohort (`L`, laki-laki).
    #[serde(rename = "L")]
    Male,
    /// Female cohort (`P`, perempuan).
    #[serde(rename = "P")]
    Female,
    /// No gender restriction.
    #[serde(rename = "ALL")]
    All,
}

impl GenderScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "L",
            Self::Female => "P",
            Self::All => "ALL",
        }
    }
}

impl FromStr for GenderScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "L" => Ok(Self::Male),
            "P" => Ok(Self::Female),
            "ALL" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown gender scope value '{value}'"
            ))),
        }
    }
}

/// Department (jurusan) a profile is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepartmentScope {
    /// Classical text track.
    Kitab,
    /// Quran memorisation track.
    Tahfidz,
    /// No department restriction.
    All,
}

impl DepartmentScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kitab => "KITAB",
            Self::Tahfidz => "TAHFIDZ",
            Self::All => "ALL",
        }
    }
}

impl FromStr for DepartmentScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "KITAB" => Ok(Self::Kitab),
            "TAHFIDZ" => Ok(Self::Tahfidz),
            "ALL" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown department scope value '{value}'"
            ))),
        }
    }
}

/// Pair of scope dimensions attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessScope {
    gender: GenderScope,
    department: DepartmentScope,
}

impl AccessScope {
    /// Creates a scope from both dimensions.
    #[must_use]
    pub fn new(gender: GenderScope, department: DepartmentScope) -> Self {
        Self { gender, department }
    }

    /// Scope that restricts nothing.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::new(GenderScope::All, DepartmentScope::All)
    }

    /// Returns the gender dimension.
    #[must_use]
    pub fn gender(&self) -> GenderScope {
        self.gender
    }

    /// Returns the department dimension.
    #[must_use]
    pub fn department(&self) -> DepartmentScope {
        self.department
    }
}

/// Per-account role and scope assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessProfile {
    account_id: AccountId,
    full_name: Option<String>,
    photo_url: Option<String>,
    role: Role,
    scope: AccessScope,
    is_active: bool,
}

impl AccessProfile {
    /// Creates an access profile.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        full_name: Option<String>,
        photo_url: Option<String>,
        role: Role,
        scope: AccessScope,
        is_active: bool,
    ) -> Self {
        Self {
            account_id,
            full_name: full_name.filter(|value| !value.trim().is_empty()),
            photo_url: photo_url.filter(|value| !value.trim().is_empty()),
            role,
            scope,
            is_active,
        }
    }

    /// Returns the owning account id.
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Returns the profile display name, if set.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Returns the profile photo URL, if set.
    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Returns the assigned role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the assigned scope.
    #[must_use]
    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    /// Returns whether the profile may use the dashboard.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Identity of the signed-in user after profile resolution.
///
/// Every scoped read and every audit record is derived from this value; it is
/// rebuilt on each request and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    id: AccountId,
    name: String,
    avatar: Option<String>,
    role: Role,
    scope: AccessScope,
    is_active: bool,
}

impl ResolvedIdentity {
    /// Creates a resolved identity.
    #[must_use]
    pub fn new(
        id: AccountId,
        name: impl Into<String>,
        avatar: Option<String>,
        role: Role,
        scope: AccessScope,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            avatar,
            role,
            scope,
            is_active,
        }
    }

    /// Returns the account id.
    #[must_use]
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the avatar URL, if any.
    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Returns the resolved role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the resolved scope.
    #[must_use]
    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    /// Returns whether the identity may use the dashboard.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}
