//! Page location capability and share-link query handling.

use url::Url;

/// Query parameter naming the active calendar.
pub const CALENDAR_PARAM: &str = "calendar";

/// Query parameter carrying an inbound share token.
pub const DATA_PARAM: &str = "data";

/// Read and replace the current page address.
///
/// `replace_href` must not add a history entry or trigger a reload.
pub trait LocationState {
    fn href(&self) -> String;
    fn replace_href(&mut self, href: &str);
}

/// Location held in memory; remembers every replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLocation {
    href: String,
    replaced: Vec<String>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            replaced: Vec::new(),
        }
    }

    /// Every href passed to `replace_href`, oldest first.
    pub fn replacements(&self) -> &[String] {
        &self.replaced
    }
}

impl LocationState for MemoryLocation {
    fn href(&self) -> String {
        self.href.clone()
    }

    fn replace_href(&mut self, href: &str) {
        self.href = href.to_string();
        self.replaced.push(href.to_string());
    }
}

/// The planner's query parameters, blank values treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkParams {
    pub calendar: Option<String>,
    pub data: Option<String>,
}

impl LinkParams {
    pub fn from_href(href: &str) -> Self {
        let url = match Url::parse(href) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Error reading calendar parameters from URL: {}", e);
                return Self::default();
            }
        };

        let mut params = Self::default();
        for (name, value) in url.query_pairs() {
            if value.trim().is_empty() {
                continue;
            }
            match name.as_ref() {
                CALENDAR_PARAM if params.calendar.is_none() => {
                    params.calendar = Some(value.into_owned());
                }
                DATA_PARAM if params.data.is_none() => params.data = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// `href` with `calendar=<id>` set and any `data` token dropped. Other
/// parameters and the fragment are kept.
pub fn with_calendar_param(href: &str, calendar_id: &str) -> Option<String> {
    let mut url = match Url::parse(href) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Failed to update calendar id in URL: {}", e);
            return None;
        }
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != CALENDAR_PARAM && name != DATA_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(kept)
        .append_pair(CALENDAR_PARAM, calendar_id);

    Some(url.to_string())
}

/// `<origin><path>?calendar=<id>&data=<token>`, built from the page address.
pub fn share_link(href: &str, calendar_id: &str, token: &str) -> Option<String> {
    let mut url = match Url::parse(href) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Cannot build share link from '{}': {}", href, e);
            return None;
        }
    };

    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair(CALENDAR_PARAM, calendar_id)
        .append_pair(DATA_PARAM, token);

    Some(url.to_string())
}
