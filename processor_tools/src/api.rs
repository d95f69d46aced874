use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::ProcessorConfig,
    data_objects::{NewPreference, Payment, PaymentSearchResult, Preference},
    ProcessorApiError,
};

const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

#[derive(Clone)]
pub struct ProcessorApi {
    config: ProcessorConfig,
    client: Arc<Client>,
}

impl ProcessorApi {
    pub fn new(config: ProcessorConfig) -> Result<Self, ProcessorApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| ProcessorApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ProcessorApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, ProcessorApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ProcessorApiError::Timeout(e.to_string())
            } else {
                ProcessorApiError::RestRequestError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ProcessorApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ProcessorApiError::RestResponseError(e.to_string()))?;
            Err(ProcessorApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Creates a hosted checkout session. The preference's external reference doubles as the idempotency key, so a
    /// retried call cannot open two sessions for the same reference.
    pub async fn create_preference(&self, preference: &NewPreference) -> Result<Preference, ProcessorApiError> {
        let reference = preference.external_reference.as_str();
        debug!("Creating checkout preference for {reference}");
        let headers = [(IDEMPOTENCY_HEADER, reference)];
        let result = self
            .rest_query::<Preference, &NewPreference>(Method::POST, "/checkout/preferences", &[], &headers, Some(preference))
            .await?;
        info!("Created checkout preference {} for {reference}", result.id);
        Ok(result)
    }

    /// Payment ids go into the request path, so anything but a plain token is refused before a request is made.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, ProcessorApiError> {
        if !is_plain_token(payment_id) {
            warn!("Refusing to fetch payment with id '{payment_id}'");
            return Err(ProcessorApiError::InvalidPaymentId(payment_id.to_string()));
        }
        let path = format!("/v1/payments/{payment_id}");
        debug!("Fetching payment #{payment_id}");
        let result = self.rest_query::<Payment, ()>(Method::GET, &path, &[], &[], None).await?;
        debug!("Fetched payment #{payment_id}. Status: {}", result.status);
        Ok(result)
    }

    /// Payments made against the preference carrying `reference`, newest first.
    pub async fn search_payments_by_reference(&self, reference: &str) -> Result<PaymentSearchResult, ProcessorApiError> {
        debug!("Searching payments for {reference}");
        let params = [("external_reference", reference), ("sort", "date_created"), ("criteria", "desc")];
        let result =
            self.rest_query::<PaymentSearchResult, ()>(Method::GET, "/v1/payments/search", &params, &[], None).await?;
        debug!("{} payments found for {reference}", result.results.len());
        Ok(result)
    }
}

fn is_plain_token(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
