//! The `User` and `Company` object types.
//!
//! The two types refer to each other (`User.company`, `Company.users`).
//! async-graphql registers object types lazily: registering `User` reaches
//! `Company` through the return type of `company`, and the back-reference to
//! `User` resolves by name because `User` is already in the registry. No
//! declaration order is required.

use async_graphql::{Context, Object, Result};
use tracing::debug;
use usergraph_backend_client::{CompanyRecord, UserRecord};

use super::{backend_error, ctx_data, ApiSchemaContext};

/// A user, as stored by the backend.
#[derive(Debug, Clone)]
pub struct User {
    record: UserRecord,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self { record }
    }
}

impl User {
    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    /// Looks up the user's company. Users without a `companyId` have no
    /// company, and no request is made for them.
    pub async fn company(&self, ctx: &ApiSchemaContext) -> Result<Option<Company>> {
        let Some(company_id) = self.record.company_id.as_deref() else {
            return Ok(None);
        };

        debug!(user_id = %self.record.id, company_id, "Resolving company of user");
        let company = ctx
            .backend
            .company(company_id)
            .await
            .map_err(backend_error)?;
        Ok(Some(company.into()))
    }
}

#[Object]
impl User {
    async fn id(&self) -> &str {
        &self.record.id
    }

    async fn first_name(&self) -> &str {
        &self.record.first_name
    }

    async fn age(&self) -> i32 {
        self.record.age
    }

    /// The company this user works for, if any.
    #[graphql(name = "company")]
    async fn graphql_company(&self, ctx: &Context<'_>) -> Result<Option<Company>> {
        self.company(ctx_data(ctx)).await
    }
}

/// A company, as stored by the backend.
#[derive(Debug, Clone)]
pub struct Company {
    record: CompanyRecord,
}

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        Self { record }
    }
}

impl Company {
    pub fn record(&self) -> &CompanyRecord {
        &self.record
    }

    pub async fn users(&self, ctx: &ApiSchemaContext) -> Result<Vec<User>> {
        debug!(company_id = %self.record.id, "Resolving users of company");
        let users = ctx
            .backend
            .company_users(&self.record.id)
            .await
            .map_err(backend_error)?;
        Ok(users.into_iter().map(Into::into).collect())
    }
}

#[Object]
impl Company {
    async fn id(&self) -> &str {
        &self.record.id
    }

    async fn name(&self) -> &str {
        &self.record.name
    }

    async fn description(&self) -> &str {
        &self.record.description
    }

    /// All users whose `companyId` is this company's `id`.
    #[graphql(name = "users")]
    async fn graphql_users(&self, ctx: &Context<'_>) -> Result<Option<Vec<User>>> {
        self.users(ctx_data(ctx)).await.map(Some)
    }
}
