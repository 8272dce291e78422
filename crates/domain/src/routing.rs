use crate::Role;

/// Landing route for student affairs.
pub const STUDENT_DATA_ROUTE: &str = "/santri";

/// Landing route for the treasurer.
pub const BILLING_ROUTE: &str = "/keuangan/tagihan";

/// Default dashboard route.
pub const DASHBOARD_ROUTE: &str = "/";

/// Returns the post-login route for a role storage value.
///
/// Total over all strings: unknown values land on the dashboard.
#[must_use]
pub fn landing_route_for(role: &str) -> &'static str {
    match role {
        "kesantrian" => STUDENT_DATA_ROUTE,
        "bendahara" => BILLING_ROUTE,
        _ => DASHBOARD_ROUTE,
    }
}

impl Role {
    /// Returns the post-login route for this role.
    #[must_use]
    pub fn landing_route(&self) -> &'static str {
        landing_route_for(self.as_str())
    }
}
