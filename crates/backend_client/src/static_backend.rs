use async_trait::async_trait;

use crate::{
    BackendClient, BackendError, BackendResult, CompanyRecord, Entity, NewUser, UserRecord,
};

/// A read-only [`BackendClient`] over a fixed set of records. Lookups are
/// linear searches; a miss is the only way a read can fail.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    users: Vec<UserRecord>,
    companies: Vec<CompanyRecord>,
}

impl StaticBackend {
    pub fn new(users: Vec<UserRecord>, companies: Vec<CompanyRecord>) -> Self {
        Self { users, companies }
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn companies(&self) -> &[CompanyRecord] {
        &self.companies
    }
}

impl Default for StaticBackend {
    fn default() -> Self {
        Self::new(
            vec![
                UserRecord {
                    id: "23".to_string(),
                    first_name: "Bill".to_string(),
                    age: 20,
                    company_id: None,
                },
                UserRecord {
                    id: "47".to_string(),
                    first_name: "Samantha".to_string(),
                    age: 21,
                    company_id: None,
                },
            ],
            vec![],
        )
    }
}

#[async_trait]
impl BackendClient for StaticBackend {
    fn describe(&self) -> String {
        format!(
            "static backend ({} users, {} companies)",
            self.users.len(),
            self.companies.len()
        )
    }

    async fn user(&self, id: &str) -> BackendResult<UserRecord> {
        self.users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                entity: Entity::User,
                id: id.to_string(),
            })
    }

    async fn company(&self, id: &str) -> BackendResult<CompanyRecord> {
        self.companies
            .iter()
            .find(|company| company.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                entity: Entity::Company,
                id: id.to_string(),
            })
    }

    async fn company_users(&self, company_id: &str) -> BackendResult<Vec<UserRecord>> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.company_id.as_deref() == Some(company_id))
            .cloned()
            .collect())
    }

    async fn create_user(&self, _new_user: NewUser) -> BackendResult<UserRecord> {
        Err(BackendError::ReadOnly)
    }
}
