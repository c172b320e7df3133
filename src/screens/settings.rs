use crate::{
    api::AdminApi,
    error::ApiResult,
    models::{AdKind, AdSettings, AdSettingsPatch},
    optimistic::{optimistic_update, ActionOutcome},
    screens::Operator,
};

/// The delivery switches. Starts from the all-enabled defaults and only
/// replaces them with a successful server read.
#[derive(Debug, Default)]
pub struct SettingsPanel {
    settings: AdSettings,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> AdSettings {
        self.settings
    }

    /// Whether the per-placement switches accept changes.
    pub fn placements_editable(&self) -> bool {
        self.settings.global_enabled
    }

    pub async fn load<A: AdminApi + ?Sized>(&mut self, api: &A) -> ApiResult<()> {
        match api.ad_settings().await {
            Ok(settings) => {
                self.settings = settings;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("failed to load ad settings, keeping current values: {}", e);
                Err(e)
            }
        }
    }

    pub async fn toggle_global<A, O>(&mut self, api: &A, operator: &O) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let patch = AdSettingsPatch {
            global_enabled: Some(!self.settings.global_enabled),
            ..Default::default()
        };
        self.apply(api, operator, patch).await
    }

    /// Flip a placement switch. Refused without a request while the global
    /// switch is off.
    pub async fn toggle_placement<A, O>(&mut self, api: &A, operator: &O, kind: AdKind) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        if !self.placements_editable() {
            tracing::debug!("ignoring {} toggle while ads are globally disabled", kind.as_str());
            return ActionOutcome::Rejected;
        }

        let patch = match kind {
            AdKind::Main => AdSettingsPatch {
                main_enabled: Some(!self.settings.main_enabled),
                ..Default::default()
            },
            AdKind::Secondary => AdSettingsPatch {
                secondary_enabled: Some(!self.settings.secondary_enabled),
                ..Default::default()
            },
        };
        self.apply(api, operator, patch).await
    }

    /// Flip the once-per-day frequency cap of a placement.
    pub async fn toggle_once_per_day<A, O>(&mut self, api: &A, operator: &O, kind: AdKind) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let patch = match kind {
            AdKind::Main => AdSettingsPatch {
                main_ad_once_per_day: Some(!self.settings.main_ad_once_per_day),
                ..Default::default()
            },
            AdKind::Secondary => AdSettingsPatch {
                secondary_ad_once_per_day: Some(!self.settings.secondary_ad_once_per_day),
                ..Default::default()
            },
        };
        self.apply(api, operator, patch).await
    }

    async fn apply<A, O>(&mut self, api: &A, operator: &O, patch: AdSettingsPatch) -> ActionOutcome
    where
        A: AdminApi + ?Sized,
        O: Operator + ?Sized,
    {
        let next = patch.apply_to(&self.settings);
        let result = optimistic_update(
            &mut self.settings,
            |s| *s,
            |s, v| *s = v,
            next,
            api.patch_ad_settings(&patch),
        )
        .await;

        match result {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => {
                operator.notify(&format!("Failed to update ad settings: {}", e.notice()));
                ActionOutcome::RolledBack
            }
        }
    }
}
