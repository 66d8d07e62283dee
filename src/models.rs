//! Shared API Models
//! Mission: Pagination envelope and small response bodies used by every controller

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed page size for every listing endpoint.
pub const PER_PAGE: u32 = 10;

/// Page envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let per_page = request.per_page;
        let last_page = (total.div_ceil(per_page as u64) as u32).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset() + 1;
            (Some(from), Some(from + data.len() as u64 - 1))
        };

        Self {
            data,
            current_page: request.page,
            per_page,
            total,
            last_page,
            from,
            to,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }
}

/// Resolved page position: 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Page numbers below 1 clamp to the first page.
    pub fn new(page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: PER_PAGE,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset_i64(&self) -> i64 {
        self.offset() as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None)
    }
}

/// `{"message": "..."}` acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Aggregate counts for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_scholarships: u64,
    pub active_scholarships: u64,
    pub total_applications: u64,
    pub pending_applications: u64,
    pub approved_applications: u64,
    pub rejected_applications: u64,
    pub total_users: u64,
}

/// Current UTC time as fixed-width RFC 3339, so timestamp columns sort lexically.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Trimmed string input where blank counts as absent, so `required` rejects it.
/// Use with `#[serde(default, deserialize_with = "...")]`.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(trimmed_or_blank(deserializer)?.filter(|s| !s.is_empty()))
}

/// Trimmed string input that keeps an explicit blank, for optional fields
/// where `""` must fail a length rule instead of being skipped.
pub fn trimmed_or_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_string()))
}

pub fn trimmed_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(trimmed_or_blank(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "trimmed")]
        name: Option<String>,
        #[serde(default, deserialize_with = "trimmed_or_blank")]
        nickname: Option<String>,
        #[serde(default, deserialize_with = "trimmed_text")]
        bio: String,
    }

    #[test]
    fn test_trimmed_fields() {
        let form: Form = serde_json::from_str(r#"{"name":"  Ada ","nickname":"   ","bio":" hi\n"}"#).unwrap();
        assert_eq!(form.name.as_deref(), Some("Ada"));
        assert_eq!(form.nickname.as_deref(), Some(""));
        assert_eq!(form.bio, "hi");

        let blank: Form = serde_json::from_str(r#"{"name":" \t ","bio":null}"#).unwrap();
        assert_eq!(blank.name, None);
        assert_eq!(blank.nickname, None);
        assert_eq!(blank.bio, "");
    }

    #[test]
    fn test_page_bounds() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(Some(2)), 13);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.from, Some(11));
        assert_eq!(page.to, Some(13));
    }

    #[test]
    fn test_empty_page_has_no_range() {
        let page: Page<u8> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert_eq!(page.to, None);
    }

    #[test]
    fn test_page_zero_clamps_to_first() {
        let req = PageRequest::new(Some(0));
        assert_eq!(req.page, 1);
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(), PER_PAGE as i64);
    }

    #[test]
    fn test_stats_use_camel_case_keys() {
        let json = serde_json::to_value(AdminStats {
            pending_applications: 2,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["pendingApplications"], 2);
        assert!(json.get("totalUsers").is_some());
    }
}
