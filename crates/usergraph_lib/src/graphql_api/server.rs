use async_graphql::{Context, Object, Result};
use tracing::{info, warn};
use usergraph_backend_client::NewUser;

use super::api_types::{Company, User};
use super::{backend_error, ctx_data};

pub struct QueryRoot;

#[Object(name = "RootQueryType")]
impl QueryRoot {
    /// Fetches a single user by ID. Without an ID, nothing is fetched and the
    /// result is `null`.
    async fn user(&self, ctx: &Context<'_>, id: Option<String>) -> Result<Option<User>> {
        let Some(id) = id else {
            return Ok(None);
        };

        let ctx_data = ctx_data(ctx);
        let user = ctx_data.backend.user(&id).await.map_err(backend_error)?;
        Ok(Some(user.into()))
    }

    /// Fetches a single company by ID. Without an ID, nothing is fetched and
    /// the result is `null`.
    async fn company(&self, ctx: &Context<'_>, id: Option<String>) -> Result<Option<Company>> {
        let Some(id) = id else {
            return Ok(None);
        };

        let ctx_data = ctx_data(ctx);
        let company = ctx_data
            .backend
            .company(&id)
            .await
            .map_err(backend_error)?;
        Ok(Some(company.into()))
    }
}

pub struct MutationRoot;

#[Object(name = "Mutation")]
impl MutationRoot {
    /// Creates a new user. The backend assigns its ID; every call creates a
    /// new record.
    ///
    /// `companyId` is only sent to the backend if `mutations.forwardCompanyId`
    /// is enabled in the configuration.
    async fn add_user(
        &self,
        ctx: &Context<'_>,
        first_name: String,
        age: i32,
        company_id: Option<String>,
    ) -> Result<Option<User>> {
        let ctx_data = ctx_data(ctx);

        let company_id = match company_id {
            Some(company_id) if !ctx_data.mutations.forward_company_id => {
                warn!(
                    %company_id,
                    "Dropping `companyId` from `addUser`; enable `mutations.forwardCompanyId` to send it"
                );
                None
            }
            company_id => company_id,
        };

        let new_user = NewUser {
            first_name,
            age,
            company_id,
        };
        let user = ctx_data
            .backend
            .create_user(new_user)
            .await
            .map_err(backend_error)?;

        info!(id = %user.id, "Created user");
        Ok(Some(user.into()))
    }
}
