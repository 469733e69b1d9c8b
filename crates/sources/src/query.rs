//! Request URL construction for the data service.

use reqwest::Url;

use crate::error::FetchError;

/// Wildcard value meaning "no filter" for year or month.
pub const ALL: &str = "all";

/// Path suffix for a period filter.
///
/// `month` is only used together with a year; `"all"` and empty values are
/// treated as absent.
pub fn period_segments<'a>(year: Option<&'a str>, month: Option<&'a str>) -> Vec<&'a str> {
    let present = |v: Option<&'a str>| {
        v.map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
    };
    match (present(year), present(month)) {
        (Some(year), Some(month)) => vec![month, year],
        (Some(year), None) => vec![year],
        (None, _) => Vec::new(),
    }
}

/// `{base}/data/{subject}[/{month}/{year}]`, with each segment percent-encoded.
pub fn data_url(
    base: &str,
    subject: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> Result<Url, FetchError> {
    let invalid = |message: String| FetchError::InvalidUrl {
        url: base.to_string(),
        message,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| invalid("base url cannot carry a path".to_string()))?;
        segments.pop_if_empty().push("data").push(subject);
        for segment in period_segments(year, month) {
            segments.push(segment);
        }
    }
    Ok(url)
}

/// `{base}/occurrence?scientificname={name}`.
pub fn occurrence_url(base: &str, scientific_name: &str) -> Result<Url, FetchError> {
    let invalid = |message: String| FetchError::InvalidUrl {
        url: base.to_string(),
        message,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("base url cannot carry a path".to_string()))?
        .pop_if_empty()
        .push("occurrence");
    url.query_pairs_mut()
        .append_pair("scientificname", scientific_name);
    Ok(url)
}
