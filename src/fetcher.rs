use async_trait::async_trait;

use crate::config::FetchConfig;
use crate::envelope;
use crate::error::FetchError;
use crate::retry::fetch_with_retry;
use crate::types::{FetchRequest, PageResult};

/// Loads one page of comments.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<PageResult, FetchError>;
}

/// Fetches pages from the comment-listing endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpPageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(HttpPageFetcher { client, config })
    }

    fn query_params(&self, request: &FetchRequest) -> Vec<(&'static str, String)> {
        vec![
            ("callback", self.config.callback.clone()),
            ("productId", request.product_id.to_string()),
            ("score", request.score.to_string()),
            ("sortType", request.sort_type.to_string()),
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("isShadowSku", "0".to_string()),
            ("fold", "1".to_string()),
        ]
    }

    async fn fetch_once(&self, request: &FetchRequest) -> Result<PageResult, FetchError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&self.query_params(request))
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(page = request.page, status = status.as_u16(), "comment page request rejected");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        match envelope::parse_page(&body, &self.config.callback) {
            Ok(page_result) => {
                tracing::info!(
                    page = request.page,
                    comments = page_result.comments.len(),
                    "loaded comments page"
                );
                Ok(page_result)
            }
            Err(e) => {
                tracing::warn!(page = request.page, error = %e, body = %body, "could not parse comment page");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<PageResult, FetchError> {
        fetch_with_retry(&self.config.retry, || self.fetch_once(request)).await
    }
}
