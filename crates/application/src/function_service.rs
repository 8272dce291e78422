//! Privileged operations executed by hosted server functions.

use std::sync::Arc;

use async_trait::async_trait;
use pondok_core::{AccountId, AppError, AppResult};
use pondok_domain::{AuditAction, ResolvedIdentity, ResourceKind};
use serde_json::{Value, json};
use tracing::info;

use crate::{AuditRecorder, ResourceService};

/// Server function that removes an admin account from the auth provider.
pub const DELETE_ADMIN_FUNCTION: &str = "delete-admin";

/// Server function that opens a payment gateway transaction.
pub const PAYMENT_TOKEN_FUNCTION: &str = "create-payment-token";

const PAID_STATUS: &str = "LUNAS";

/// Port for invoking hosted server functions with service credentials.
#[async_trait]
pub trait FunctionGateway: Send + Sync {
    /// Invokes a function and returns its JSON result.
    async fn invoke(&self, function_name: &str, body: Value) -> AppResult<Value>;
}

/// Payment gateway token for one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentToken {
    /// Snap token handed to the payment widget.
    pub token: String,
    /// Hosted payment page, when the gateway returns one.
    pub redirect_url: Option<String>,
}

/// Operations that need elevated credentials.
#[derive(Clone)]
pub struct PrivilegedFunctionService {
    gateway: Arc<dyn FunctionGateway>,
    resources: ResourceService,
    audit: AuditRecorder,
}

impl PrivilegedFunctionService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn FunctionGateway>,
        resources: ResourceService,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            gateway,
            resources,
            audit,
        }
    }

    /// Deletes an admin account. Only super administrators may call this,
    /// and never on their own account.
    pub async fn delete_admin_account(
        &self,
        actor: &ResolvedIdentity,
        account_id: AccountId,
    ) -> AppResult<()> {
        if !actor.is_active() || !actor.role().can_manage_accounts() {
            return Err(AppError::Forbidden(format!(
                "role '{}' may not delete admin accounts",
                actor.role()
            )));
        }

        if account_id == actor.id() {
            return Err(AppError::Conflict(
                "administrators cannot delete their own account".to_owned(),
            ));
        }

        self.gateway
            .invoke(
                DELETE_ADMIN_FUNCTION,
                json!({ "user_id": account_id.to_string() }),
            )
            .await?;

        let record_id = account_id.to_string();
        self.audit.record(
            Some(actor),
            AuditAction::Delete,
            "admin_account",
            Some(record_id.as_str()),
            None,
        );
        info!(account_id = %account_id, actor_id = %actor.id(), "admin account deleted");

        Ok(())
    }

    /// Opens a payment transaction for an unpaid invoice visible to the actor.
    pub async fn create_payment_token(
        &self,
        actor: &ResolvedIdentity,
        invoice_id: &str,
    ) -> AppResult<PaymentToken> {
        if !actor.is_active() || !ResourceKind::Tagihan.writable_by(actor.role()) {
            return Err(AppError::Forbidden(format!(
                "role '{}' may not collect payments",
                actor.role()
            )));
        }

        let invoice = self
            .resources
            .get_record(actor, ResourceKind::Tagihan, invoice_id)
            .await?;

        if invoice.text_field("status") == Some(PAID_STATUS) {
            return Err(AppError::Conflict(format!(
                "invoice '{invoice_id}' is already paid"
            )));
        }

        let amount = invoice
            .data()
            .get("nominal")
            .and_then(whole_amount)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "invoice '{invoice_id}' has no positive 'nominal'"
                ))
            })?;

        let response = self
            .gateway
            .invoke(
                PAYMENT_TOKEN_FUNCTION,
                json!({
                    "order_id": invoice.record_id(),
                    "gross_amount": amount,
                    "customer_name": invoice.text_field("nama_santri"),
                    "description": invoice.text_field("keterangan"),
                }),
            )
            .await?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Internal("payment function returned no token".to_owned())
            })?
            .to_owned();
        let redirect_url = response
            .get("redirect_url")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        self.audit.record(
            Some(actor),
            AuditAction::Create,
            "payment_transaction",
            Some(invoice.record_id()),
            Some(json!({ "gross_amount": amount })),
        );

        Ok(PaymentToken {
            token,
            redirect_url,
        })
    }
}

/// Reads an invoice amount stored as an integer, a whole float or a numeric string.
fn whole_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|amount| amount.fract() == 0.0 && amount.abs() < 9.0e15)
                .map(|amount| amount as i64)
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| whole_amount(&Value::from(text.parse::<f64>().ok()?)))
        }
        _ => None,
    }
}
