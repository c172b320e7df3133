use crate::{
    api::{validate_ad_form, AdminApi},
    error::ApiResult,
    models::{Ad, AdForm, AdStatus},
    optimistic::{optimistic_update, ActionOutcome},
    query::AdFilter,
    screens::Operator,
    table::{Column, Table},
};

/// The ad list: filter state, the rows of the last load, and table sorting.
#[derive(Debug)]
pub struct AdScreen {
    ads: Vec<Ad>,
    filter: AdFilter,
    table: Table<Ad>,
}

impl Default for AdScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl AdScreen {
    pub fn new() -> Self {
        Self {
            ads: Vec::new(),
            filter: AdFilter::default(),
            table: Table::new(ad_columns()),
        }
    }

    pub fn ads(&self) -> &[Ad] {
        &self.ads
    }

    pub fn filter(&self) -> &AdFilter {
        &self.filter
    }

    pub fn table(&self) -> &Table<Ad> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table<Ad> {
        &mut self.table
    }

    /// Rows in display order.
    pub fn view(&self) -> Vec<&Ad> {
        self.table.view(&self.ads)
    }

    /// Replace the rows with a fresh server read. On failure the previous
    /// rows stay and the error is returned.
    pub async fn load<A: AdminApi + ?Sized>(&mut self, api: &A) -> ApiResult<()> {
        let ads = api.list_ads(&self.filter).await?;
        tracing::debug!("loaded {} ad(s)", ads.len());
        self.ads = ads;
        Ok(())
    }

    /// Change the filter and reload.
    pub async fn set_filter<A: AdminApi + ?Sized>(
        &mut self,
        api: &A,
        filter: AdFilter,
    ) -> ApiResult<()> {
        self.filter = filter;
        self.load(api).await
    }

    /// Create (`editing == None`) or edit an ad, then reload the list.
    pub async fn save<A, O>(
        &mut self,
        api: &A,
        operator: &O,
        editing: Option<i64>,
        form: &AdForm,
    ) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        if let Err(e) = validate_ad_form(form, editing.is_none()) {
            operator.notify(&e.notice());
            return ActionOutcome::Rejected;
        }

        let result = match editing {
            Some(id) => api.update_ad(id, form).await,
            None => api.create_ad(form).await.map(|created| {
                tracing::info!("created ad {}", created.id);
            }),
        };

        if let Err(e) = result {
            tracing::error!("failed to save ad: {}", e);
            operator.notify(&format!("Failed to save ad: {}", e.notice()));
            return ActionOutcome::Failed;
        }

        self.reload_logged(api).await;
        ActionOutcome::Applied
    }

    /// Confirm, drop the row locally, then delete on the server. A failed
    /// delete reloads the list since the removed row cannot be restored.
    pub async fn delete<A, O>(&mut self, api: &A, operator: &O, id: i64) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        if !operator.confirm(&format!("Delete ad {id}?")) {
            return ActionOutcome::Declined;
        }

        self.ads.retain(|ad| ad.id != id);

        match api.delete_ad(id).await {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => {
                tracing::error!("failed to delete ad {}: {}", id, e);
                operator.notify(&format!("Failed to delete ad: {}", e.notice()));
                self.reload_logged(api).await;
                ActionOutcome::Reloaded
            }
        }
    }

    /// Flip an ad between active and inactive after confirmation.
    pub async fn toggle_status<A, O>(&mut self, api: &A, operator: &O, id: i64) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let Some(pos) = self.position(id) else {
            operator.notify(&format!("Ad {id} is not in the current list."));
            return ActionOutcome::Rejected;
        };

        let next = self.ads[pos].status.toggled();
        let verb = match next {
            AdStatus::Active => "Activate",
            AdStatus::Inactive => "Deactivate",
        };
        if !operator.confirm(&format!("{verb} ad {id}?")) {
            return ActionOutcome::Declined;
        }

        let result = optimistic_update(
            &mut self.ads,
            |ads| ads[pos].status,
            |ads, status| ads[pos].status = status,
            next,
            api.set_ad_status(id, next),
        )
        .await;

        match result {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => {
                operator.notify(&format!("Failed to update ad status: {}", e.notice()));
                ActionOutcome::RolledBack
            }
        }
    }

    /// Flip whether closing the ad counts as a click-through.
    pub async fn toggle_x_redirect<A, O>(&mut self, api: &A, operator: &O, id: i64) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let Some(pos) = self.position(id) else {
            operator.notify(&format!("Ad {id} is not in the current list."));
            return ActionOutcome::Rejected;
        };

        let next = !self.ads[pos].x_redirect_enabled;
        let result = optimistic_update(
            &mut self.ads,
            |ads| ads[pos].x_redirect_enabled,
            |ads, enabled| ads[pos].x_redirect_enabled = enabled,
            next,
            api.set_ad_x_redirect(id, next),
        )
        .await;

        match result {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => {
                operator.notify(&format!("Failed to update close redirect: {}", e.notice()));
                ActionOutcome::RolledBack
            }
        }
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.ads.iter().position(|ad| ad.id == id)
    }

    async fn reload_logged<A: AdminApi + ?Sized>(&mut self, api: &A) {
        if let Err(e) = self.load(api).await {
            tracing::error!("failed to reload ads: {}", e);
        }
    }
}

fn ad_columns() -> Vec<Column<Ad>> {
    vec![
        Column::numeric("id", "ID", |ad: &Ad| ad.id.to_string()),
        Column::plain("img_url", "Image"),
        Column::plain("link", "Link"),
        Column::plain("type", "Type"),
        Column::plain("status", "Status"),
        Column::plain("x_redirect_enabled", "Close redirect"),
        Column::date("created_at", "Created", |ad: &Ad| ad.created_at.clone()),
        Column::plain("actions", "Actions"),
    ]
}
