use crate::{
    api::AdminApi,
    error::ApiResult,
    models::{BlacklistCheck, BlacklistDomain},
    optimistic::ActionOutcome,
    screens::Operator,
};

/// Domains the backend refuses to serve ads to.
#[derive(Debug, Default)]
pub struct BlacklistScreen {
    domains: Vec<BlacklistDomain>,
}

impl BlacklistScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domains(&self) -> &[BlacklistDomain] {
        &self.domains
    }

    pub async fn load<A: AdminApi + ?Sized>(&mut self, api: &A) -> ApiResult<()> {
        self.domains = api.blacklist().await?;
        Ok(())
    }

    /// Add a domain, then reload the list.
    pub async fn add<A, O>(&mut self, api: &A, operator: &O, domain: &str) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let domain = domain.trim();
        if domain.is_empty() {
            operator.notify("Enter a domain to blacklist.");
            return ActionOutcome::Rejected;
        }

        if let Err(e) = api.add_to_blacklist(domain).await {
            tracing::error!("failed to blacklist {}: {}", domain, e);
            operator.notify(&format!("Failed to add domain: {}", e.notice()));
            return ActionOutcome::Failed;
        }

        tracing::info!("blacklisted {}", domain);
        self.reload_logged(api).await;
        ActionOutcome::Applied
    }

    /// Confirm, drop the entry locally, then delete it on the server. A
    /// failed delete reloads the list.
    pub async fn remove<A, O>(&mut self, api: &A, operator: &O, id: i64) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let label = self
            .domains
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.domain.clone())
            .unwrap_or_else(|| format!("#{id}"));
        if !operator.confirm(&format!("Remove {label} from the blacklist?")) {
            return ActionOutcome::Declined;
        }

        self.domains.retain(|d| d.id != id);

        match api.remove_from_blacklist(id).await {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => {
                tracing::error!("failed to remove blacklist entry {}: {}", id, e);
                operator.notify(&format!("Failed to remove domain: {}", e.notice()));
                self.reload_logged(api).await;
                ActionOutcome::Reloaded
            }
        }
    }

    pub async fn check<A: AdminApi + ?Sized>(&self, api: &A, domain: &str) -> ApiResult<BlacklistCheck> {
        api.check_blacklist(domain.trim()).await
    }

    async fn reload_logged<A: AdminApi + ?Sized>(&mut self, api: &A) {
        if let Err(e) = self.load(api).await {
            tracing::error!("failed to reload blacklist: {}", e);
        }
    }
}
