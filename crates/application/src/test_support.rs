use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pondok_core::{AccountId, AppError, AppResult, AuthenticatedAccount};
use pondok_domain::{
    AccessProfile, AccessScope, DepartmentScope, GenderScope, ResolvedIdentity, ResourceKind,
    ResourceRecord, Role, STUDENT_RELATION_FIELD, STUDENT_SCOPE_FIELDS, ScopedQuery,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::{
    AccessProfileRepository, AuditDeliveryPolicy, AuditEvent, AuditRecorder, AuditRepository,
    AuditWorker, AuthProvider, AuthSession, FunctionGateway, ResourceRepository,
    SignInCredentials,
};

pub fn identity(role: Role, gender: GenderScope, department: DepartmentScope) -> ResolvedIdentity {
    ResolvedIdentity::new(
        AccountId::new(),
        format!("{} tester", role.as_str()),
        None,
        role,
        AccessScope::new(gender, department),
        true,
    )
}

pub fn unrestricted(role: Role) -> ResolvedIdentity {
    identity(role, GenderScope::All, DepartmentScope::All)
}

pub fn audit_channel(repository: Arc<FakeAuditRepository>) -> (AuditRecorder, AuditWorker) {
    AuditRecorder::channel(
        repository,
        AuditDeliveryPolicy {
            queue_capacity: 64,
            max_attempts: 3,
            retry_base_delay: Duration::ZERO,
        },
    )
}

#[derive(Default)]
pub struct FakeAuditRepository {
    pub events: Mutex<Vec<AuditEvent>>,
    pub failures_remaining: Mutex<u32>,
    pub attempts: Mutex<u32>,
}

impl FakeAuditRepository {
    pub fn failing(times: u32) -> Self {
        Self {
            failures_remaining: Mutex::new(times),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        *self.attempts.lock().await += 1;

        let mut failures_remaining = self.failures_remaining.lock().await;
        if *failures_remaining > 0 {
            *failures_remaining -= 1;
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAccessProfileRepository {
    pub profiles: Mutex<HashMap<AccountId, AccessProfile>>,
    pub unavailable: bool,
}

impl FakeAccessProfileRepository {
    pub fn with_profiles(profiles: Vec<AccessProfile>) -> Self {
        Self {
            profiles: Mutex::new(
                profiles
                    .into_iter()
                    .map(|profile| (profile.account_id(), profile))
                    .collect(),
            ),
            unavailable: false,
        }
    }
}

#[async_trait]
impl AccessProfileRepository for FakeAccessProfileRepository {
    async fn find_profile(&self, account_id: AccountId) -> AppResult<Option<AccessProfile>> {
        if self.unavailable {
            return Err(AppError::Internal("profile store unavailable".to_owned()));
        }

        Ok(self.profiles.lock().await.get(&account_id).cloned())
    }

    async fn list_profiles(&self) -> AppResult<Vec<AccessProfile>> {
        let mut profiles: Vec<AccessProfile> =
            self.profiles.lock().await.values().cloned().collect();
        profiles.sort_by_key(AccessProfile::account_id);
        Ok(profiles)
    }

    async fn save_profile(&self, profile: AccessProfile) -> AppResult<AccessProfile> {
        self.profiles
            .lock()
            .await
            .insert(profile.account_id(), profile.clone());
        Ok(profile)
    }
}

#[derive(Default)]
pub struct FakeResourceRepository {
    pub records: Mutex<Vec<ResourceRecord>>,
    pub next_id: Mutex<u32>,
}

impl FakeResourceRepository {
    pub async fn seed(&self, resource: ResourceKind, data: Value) -> String {
        match self.insert_record(resource, data).await {
            Ok(record) => record.record_id().to_owned(),
            Err(error) => panic!("seeding fake resource failed: {error}"),
        }
    }
}

#[async_trait]
impl ResourceRepository for FakeResourceRepository {
    async fn list_records(&self, query: &ScopedQuery) -> AppResult<Vec<ResourceRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.resource() == query.resource() && query.matches(record.data()))
            .skip(query.offset())
            .take(query.limit())
            .cloned()
            .collect())
    }

    async fn count_records(&self, query: &ScopedQuery) -> AppResult<u64> {
        let count = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.resource() == query.resource() && query.matches(record.data()))
            .count();
        Ok(count as u64)
    }

    async fn find_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| {
                record.resource() == query.resource()
                    && record.record_id() == record_id
                    && query.scope_admits(record.data())
            })
            .cloned())
    }

    async fn insert_record(&self, resource: ResourceKind, data: Value) -> AppResult<ResourceRecord> {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let record = ResourceRecord::new(
            format!("{}-{}", resource.as_str(), *next_id),
            resource,
            data,
            "2026-01-01T00:00:00Z",
        );
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
        data: Value,
    ) -> AppResult<ResourceRecord> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|record| {
                record.resource() == query.resource()
                    && record.record_id() == record_id
                    && query.scope_admits(record.data())
            })
            .ok_or_else(|| AppError::NotFound(format!("record '{record_id}' not found")))?;

        *record = ResourceRecord::new(
            record.record_id(),
            record.resource(),
            data,
            record.created_at(),
        );
        Ok(record.clone())
    }

    async fn delete_record(&self, query: &ScopedQuery, record_id: &str) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| {
            !(record.resource() == query.resource()
                && record.record_id() == record_id
                && query.scope_admits(record.data()))
        });

        if records.len() == before {
            return Err(AppError::NotFound(format!("record '{record_id}' not found")));
        }

        Ok(())
    }

    async fn reassign_student_scope(
        &self,
        student_id: &str,
        scope: &Map<String, Value>,
    ) -> AppResult<u64> {
        let mut records = self.records.lock().await;
        let mut reassigned = 0;
        for record in records.iter_mut().filter(|record| {
            record.resource().is_student_owned()
                && record.text_field(STUDENT_RELATION_FIELD) == Some(student_id)
        }) {
            let mut data = record.data().clone();
            if let Value::Object(fields) = &mut data {
                for field in STUDENT_SCOPE_FIELDS {
                    fields.remove(field);
                }
                fields.extend(scope.clone());
            }
            *record = ResourceRecord::new(
                record.record_id(),
                record.resource(),
                data,
                record.created_at(),
            );
            reassigned += 1;
        }

        Ok(reassigned)
    }
}

pub struct FakeAuthProvider {
    pub accounts: HashMap<String, (String, AuthenticatedAccount)>,
    pub signed_out: Mutex<Vec<String>>,
}

impl FakeAuthProvider {
    pub fn with_account(email: &str, password: &str, account: AuthenticatedAccount) -> Self {
        Self {
            accounts: HashMap::from([(email.to_owned(), (password.to_owned(), account))]),
            signed_out: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn sign_in(&self, credentials: &SignInCredentials) -> AppResult<AuthSession> {
        match self.accounts.get(&credentials.email) {
            Some((password, account)) if password == &credentials.password => Ok(AuthSession {
                account: account.clone(),
                access_token: format!("token-{}", account.account_id()),
            }),
            _ => Err(AppError::Unauthorized("invalid login credentials".to_owned())),
        }
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        self.signed_out.lock().await.push(access_token.to_owned());
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<AuthenticatedAccount>> {
        Ok(self
            .accounts
            .values()
            .map(|(_, account)| account)
            .find(|account| format!("token-{}", account.account_id()) == access_token)
            .cloned())
    }
}

#[derive(Default)]
pub struct FakeFunctionGateway {
    pub invocations: Mutex<Vec<(String, Value)>>,
    pub response: Value,
}

#[async_trait]
impl FunctionGateway for FakeFunctionGateway {
    async fn invoke(&self, function_name: &str, body: Value) -> AppResult<Value> {
        self.invocations
            .lock()
            .await
            .push((function_name.to_owned(), body));
        Ok(self.response.clone())
    }
}
