use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::data_source::{ArticlesRequest, BarsRequest, NewsSource, PriceSource, SourceError};
use crate::{Interval, ProviderId, RawArticle, RawBar, RawTimestamp};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) bullion/",
    env!("CARGO_PKG_VERSION")
);

/// Yahoo Finance chart and search endpoints over blocking HTTP.
///
/// Responses are handed back raw; timestamps are floored to the requested
/// grid but values are not validated here.
#[derive(Debug, Clone)]
pub struct YahooAdapter {
    client: Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|error| SourceError::internal(format!("http client setup failed: {error}")))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
        })
    }

    /// Point the adapter at another host, e.g. a local mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn get(&self, url: &str) -> Result<String, SourceError> {
        debug!(url, "yahoo request");
        let response = self
            .client
            .get(url)
            .header("referer", "https://finance.yahoo.com/")
            .send()
            .map_err(transport_error)?;
        read_body(response)
    }
}

fn chart_interval(interval: Interval) -> &'static str {
    match interval {
        Interval::OneHour => "60m",
        other => other.as_str(),
    }
}

fn transport_error(error: reqwest::Error) -> SourceError {
    if error.is_decode() {
        SourceError::internal(format!("yahoo response unreadable: {error}"))
    } else {
        SourceError::unavailable(format!("yahoo transport error: {error}"))
    }
}

fn read_body(response: Response) -> Result<String, SourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status));
    }
    response.text().map_err(transport_error)
}

fn status_error(status: StatusCode) -> SourceError {
    let message = format!("yahoo returned status {}", status.as_u16());
    if status == StatusCode::TOO_MANY_REQUESTS {
        SourceError::rate_limited(message)
    } else if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        SourceError::unavailable(message)
    } else {
        SourceError::invalid_request(message)
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_bars(&self, req: &BarsRequest) -> Result<Vec<RawBar>, SourceError> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&includePrePost=false",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            req.start.unix_timestamp(),
            req.end.unix_timestamp(),
            chart_interval(req.interval),
        );
        let body = self.get(&url)?;
        parse_chart(&body, req.interval)
    }
}

impl NewsSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_articles(&self, req: &ArticlesRequest) -> Result<Vec<RawArticle>, SourceError> {
        let url = format!(
            "{}/v1/finance/search?q={}&quotesCount=0&newsCount={}",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            req.limit,
        );
        let body = self.get(&url)?;
        let mut articles = parse_search(&body)?;
        articles.truncate(req.limit);
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
struct SearchNews {
    title: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
    #[serde(rename = "providerPublishTime")]
    provider_publish_time: Option<i64>,
}

fn column<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

/// Decode a chart body into raw bars on the interval grid.
///
/// Slots where every value is null carry no trade and are dropped; partially
/// populated slots are kept so validation can reject them.
fn parse_chart(body: &str, interval: Interval) -> Result<Vec<RawBar>, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::internal(format!("failed to parse yahoo chart: {error}")))?;

    if let Some(error) = response.chart.error {
        let message = format!("yahoo chart error {}: {}", error.code, error.description);
        return Err(if error.code.eq_ignore_ascii_case("Not Found") {
            SourceError::invalid_request(message)
        } else {
            SourceError::unavailable(message)
        });
    }

    let Some(result) = response.chart.result.and_then(|mut r| (!r.is_empty()).then(|| r.remove(0)))
    else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let bar = RawBar {
                timestamp: Some(interval.align_down(ts)),
                open: column(&quote.open, i),
                high: column(&quote.high, i),
                low: column(&quote.low, i),
                close: column(&quote.close, i),
                volume: column(&quote.volume, i),
            };
            let empty = bar.open.is_none()
                && bar.high.is_none()
                && bar.low.is_none()
                && bar.close.is_none();
            (!empty).then_some(bar)
        })
        .collect();
    Ok(bars)
}

fn parse_search(body: &str) -> Result<Vec<RawArticle>, SourceError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::internal(format!("failed to parse yahoo search: {error}")))?;

    Ok(response
        .news
        .into_iter()
        .map(|news| RawArticle {
            title: news.title,
            summary: None,
            publisher: news.publisher,
            published_at: news.provider_publish_time.map(RawTimestamp::Unix),
            link: news.link,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;

    #[test]
    fn chart_timestamps_are_floored_and_empty_slots_dropped() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1772409600,1772410500,1772411400,1772411523],
            "indicators":{"quote":[{
                "open":[2040.1,null,2041.0,2041.8],
                "high":[2042.0,null,null,2042.5],
                "low":[2039.5,null,2040.2,2041.1],
                "close":[2041.2,null,2041.9,2042.0],
                "volume":[120,null,90,15]
            }]}
        }],"error":null}}"#;

        let bars = parse_chart(body, Interval::FifteenMinutes).expect("parse");
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0], RawBar::new(1_772_409_600, 2040.1, 2042.0, 2039.5, 2041.2, 120));
        assert_eq!(bars[1].high, None);
        assert_eq!(bars[2].timestamp, Some(1_772_411_400));
    }

    #[test]
    fn chart_error_maps_to_source_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let error = parse_chart(body, Interval::OneDay).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);

        let garbage = parse_chart("<html>", Interval::OneDay).expect_err("must fail");
        assert_eq!(garbage.kind(), SourceErrorKind::Internal);
    }

    #[test]
    fn search_news_becomes_raw_articles() {
        let body = r#"{"quotes":[],"news":[
            {"uuid":"a1","title":"Gold hits record","publisher":"Reuters",
             "link":"https://example.com/a1","providerPublishTime":1772409600,"type":"STORY"},
            {"uuid":"a2","title":"Untimed story","publisher":"Kitco"}
        ]}"#;

        let articles = parse_search(body).expect("parse");
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title.as_deref(), Some("Gold hits record"));
        assert_eq!(articles[0].published_at, Some(RawTimestamp::Unix(1_772_409_600)));
        assert_eq!(articles[1].published_at, None);
    }

    #[test]
    fn statuses_map_to_error_kinds() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS).is_rate_limited());
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY).kind(),
            SourceErrorKind::Unavailable
        );
        assert_eq!(
            status_error(StatusCode::REQUEST_TIMEOUT).kind(),
            SourceErrorKind::Unavailable
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND).kind(),
            SourceErrorKind::InvalidRequest
        );
    }

    #[test]
    fn one_hour_uses_minute_notation() {
        assert_eq!(chart_interval(Interval::OneHour), "60m");
        assert_eq!(chart_interval(Interval::FifteenMinutes), "15m");
    }
}
