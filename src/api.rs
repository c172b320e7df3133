use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde_json::json;

use crate::{
    client::{HttpClient, RequestOptions},
    error::{ApiError, ApiResult},
    models::{
        Ad, AdForm, AdSettings, AdSettingsPatch, AdStatus, BlacklistCheck, BlacklistDomain,
        ClickEvent, ClickStatRow, Created, DailyStats, DataEnvelope, Overview, Paged,
        RandomPairResponse, VisitorStatRow, VisitorSummary,
    },
    query::{AdFilter, ClickStatsQuery, DateRange, VisitorStatsQuery},
};

const NO_QUERY: &[(&str, &str)] = &[];

// ── Seams ──────────────────────────────────────────────────────────────────

/// Backend calls made by the ad delivery controller on a host page.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    /// Absolute URL for a server-relative asset path.
    fn asset_url(&self, path: &str) -> String;

    async fn random_pair(&self, domain: Option<&str>) -> ApiResult<RandomPairResponse>;

    async fn record_page_view(&self) -> ApiResult<()>;

    async fn record_click(&self, ad_id: i64, domain: &str) -> ApiResult<()>;
}

/// Backend calls made by the admin screens.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_ads(&self, filter: &AdFilter) -> ApiResult<Vec<Ad>>;

    async fn create_ad(&self, form: &AdForm) -> ApiResult<Created>;

    async fn update_ad(&self, id: i64, form: &AdForm) -> ApiResult<()>;

    async fn set_ad_status(&self, id: i64, status: AdStatus) -> ApiResult<()>;

    async fn set_ad_x_redirect(&self, id: i64, enabled: bool) -> ApiResult<()>;

    async fn delete_ad(&self, id: i64) -> ApiResult<()>;

    async fn ad_settings(&self) -> ApiResult<AdSettings>;

    async fn patch_ad_settings(&self, patch: &AdSettingsPatch) -> ApiResult<()>;

    async fn clicks_by_domain_ip(&self, query: &ClickStatsQuery) -> ApiResult<Paged<ClickStatRow>>;

    async fn visitors_by_domain_ip(
        &self,
        query: &VisitorStatsQuery,
    ) -> ApiResult<Paged<VisitorStatRow, VisitorSummary>>;

    async fn overview(&self) -> ApiResult<Overview>;

    async fn daily_stats(&self, range: &DateRange) -> ApiResult<DailyStats>;

    async fn blacklist(&self) -> ApiResult<Vec<BlacklistDomain>>;

    async fn add_to_blacklist(&self, domain: &str) -> ApiResult<()>;

    async fn remove_from_blacklist(&self, id: i64) -> ApiResult<()>;

    async fn check_blacklist(&self, domain: &str) -> ApiResult<BlacklistCheck>;
}

// ── REST implementation ────────────────────────────────────────────────────

/// Both API seams over the ads backend's REST endpoints.
#[derive(Clone, Debug)]
pub struct RestClient {
    http: HttpClient,
}

impl RestClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

/// Build the multipart body shared by create and edit.
fn ad_form_body(form: &AdForm) -> Form {
    let mut body = Form::new()
        .text("link", form.link.trim().to_owned())
        .text("is_main", form.kind.is_main().to_string())
        .text("x_redirect_enabled", form.x_redirect_enabled.to_string());

    if let Some(image) = &form.image {
        let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        body = body.part("file", part);
    }

    body
}

/// Client-side checks run before any upload is attempted.
pub fn validate_ad_form(form: &AdForm, creating: bool) -> ApiResult<()> {
    let link = form.link.trim();
    if link.is_empty() {
        return Err(ApiError::Invalid("Ad link must not be empty.".into()));
    }
    if !link.starts_with("http://") && !link.starts_with("https://") {
        return Err(ApiError::Invalid(
            "Ad link must start with http:// or https://".into(),
        ));
    }
    if creating && form.image.is_none() {
        return Err(ApiError::Invalid("An image is required for a new ad.".into()));
    }
    Ok(())
}

#[async_trait]
impl DeliveryApi for RestClient {
    fn asset_url(&self, path: &str) -> String {
        self.http.url(path)
    }

    async fn random_pair(&self, domain: Option<&str>) -> ApiResult<RandomPairResponse> {
        let query: Vec<(&str, &str)> = domain.map(|d| vec![("domain", d)]).unwrap_or_default();
        self.http
            .get_json("/ads/random_pair", &query, &RequestOptions::silent())
            .await
    }

    async fn record_page_view(&self) -> ApiResult<()> {
        self.http
            .call_json(
                Method::POST,
                "/events/page_view",
                &json!({}),
                &RequestOptions::silent(),
            )
            .await
    }

    async fn record_click(&self, ad_id: i64, domain: &str) -> ApiResult<()> {
        self.http
            .call_json(
                Method::POST,
                "/events/click",
                &ClickEvent { ad_id, domain },
                &RequestOptions::silent(),
            )
            .await
    }
}

#[async_trait]
impl AdminApi for RestClient {
    async fn list_ads(&self, filter: &AdFilter) -> ApiResult<Vec<Ad>> {
        let envelope: DataEnvelope<Ad> = self
            .http
            .get_json("/ads", &filter.to_query(), &RequestOptions::keyed("ads"))
            .await?;
        Ok(envelope.data)
    }

    async fn create_ad(&self, form: &AdForm) -> ApiResult<Created> {
        validate_ad_form(form, true)?;
        let builder = self
            .http
            .request(Method::POST, "/ads/upload")
            .multipart(ad_form_body(form));
        self.http
            .send_json(builder, &RequestOptions::keyed("ads"))
            .await
    }

    async fn update_ad(&self, id: i64, form: &AdForm) -> ApiResult<()> {
        validate_ad_form(form, false)?;
        let builder = self
            .http
            .request(Method::PUT, &format!("/ads/{id}"))
            .multipart(ad_form_body(form));
        self.http
            .send(builder, &RequestOptions::keyed("ads"))
            .await
            .map(drop)
    }

    async fn set_ad_status(&self, id: i64, status: AdStatus) -> ApiResult<()> {
        self.http
            .call_json(
                Method::PATCH,
                &format!("/ads/{id}/status"),
                &json!({ "status": status }),
                &RequestOptions::keyed("ads"),
            )
            .await
    }

    async fn set_ad_x_redirect(&self, id: i64, enabled: bool) -> ApiResult<()> {
        self.http
            .call_json(
                Method::PATCH,
                &format!("/ads/{id}/x_redirect"),
                &json!({ "enabled": enabled }),
                &RequestOptions::keyed("ads"),
            )
            .await
    }

    async fn delete_ad(&self, id: i64) -> ApiResult<()> {
        let builder = self.http.request(Method::DELETE, &format!("/ads/{id}"));
        self.http
            .send(builder, &RequestOptions::keyed("ads"))
            .await
            .map(drop)
    }

    async fn ad_settings(&self) -> ApiResult<AdSettings> {
        self.http
            .get_json("/ads/settings", NO_QUERY, &RequestOptions::keyed("settings"))
            .await
    }

    async fn patch_ad_settings(&self, patch: &AdSettingsPatch) -> ApiResult<()> {
        self.http
            .call_json(
                Method::PATCH,
                "/ads/settings",
                patch,
                &RequestOptions::keyed("settings"),
            )
            .await
    }

    async fn clicks_by_domain_ip(&self, query: &ClickStatsQuery) -> ApiResult<Paged<ClickStatRow>> {
        self.http
            .get_json(
                "/stats/clicks/by_domain_ip",
                query,
                &RequestOptions::keyed("stats"),
            )
            .await
    }

    async fn visitors_by_domain_ip(
        &self,
        query: &VisitorStatsQuery,
    ) -> ApiResult<Paged<VisitorStatRow, VisitorSummary>> {
        self.http
            .get_json(
                "/stats/visitors/by_domain_ip",
                query,
                &RequestOptions::keyed("stats"),
            )
            .await
    }

    async fn overview(&self) -> ApiResult<Overview> {
        self.http
            .get_json("/stats/overview", NO_QUERY, &RequestOptions::keyed("traffic"))
            .await
    }

    async fn daily_stats(&self, range: &DateRange) -> ApiResult<DailyStats> {
        self.http
            .get_json("/stats/daily", range, &RequestOptions::keyed("traffic"))
            .await
    }

    async fn blacklist(&self) -> ApiResult<Vec<BlacklistDomain>> {
        let envelope: DataEnvelope<BlacklistDomain> = self
            .http
            .get_json("/domains/blacklist", NO_QUERY, &RequestOptions::keyed("domains"))
            .await?;
        Ok(envelope.data)
    }

    async fn add_to_blacklist(&self, domain: &str) -> ApiResult<()> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(ApiError::Invalid("Domain must not be empty.".into()));
        }
        self.http
            .call_json(
                Method::POST,
                "/domains/blacklist",
                &json!({ "domain": domain }),
                &RequestOptions::keyed("domains"),
            )
            .await
    }

    async fn remove_from_blacklist(&self, id: i64) -> ApiResult<()> {
        let builder = self
            .http
            .request(Method::DELETE, &format!("/domains/blacklist/{id}"));
        self.http
            .send(builder, &RequestOptions::keyed("domains"))
            .await
            .map(drop)
    }

    async fn check_blacklist(&self, domain: &str) -> ApiResult<BlacklistCheck> {
        self.http
            .get_json(
                "/domains/blacklist/check",
                &[("domain", domain.trim())],
                &RequestOptions::keyed("domains"),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdKind, ImageFile};

    fn form(link: &str, image: bool) -> AdForm {
        AdForm {
            link: link.into(),
            kind: AdKind::Main,
            x_redirect_enabled: true,
            image: image.then(|| ImageFile {
                file_name: "a.png".into(),
                bytes: vec![0x89, 0x50],
            }),
        }
    }

    #[test]
    fn create_requires_link_and_image() {
        assert!(validate_ad_form(&form("", true), true).is_err());
        assert!(validate_ad_form(&form("ftp://x", true), true).is_err());
        assert!(validate_ad_form(&form("https://x.example", false), true).is_err());
        assert!(validate_ad_form(&form("https://x.example", true), true).is_ok());
    }

    #[test]
    fn edit_allows_missing_image() {
        assert!(validate_ad_form(&form(" https://x.example ", false), false).is_ok());
    }
}
