use serde::{Deserialize, Deserializer, Serialize};

/// One page of a list endpoint.
///
/// The backend is inconsistent about envelope names: some endpoints answer
/// `{results, count}`, others `{data, total_count}`, a few a bare array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
        }
    }

    /// Number of pages needed to show `count` items, `page_size` at a time.
    pub fn total_pages(&self, page_size: u32) -> u32 {
        total_pages(self.count, page_size)
    }
}

pub fn total_pages(count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size as u64) as u32
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Wrapped {
                #[serde(alias = "data")]
                results: Vec<T>,
                #[serde(default, alias = "total_count")]
                count: Option<u64>,
            },
            Bare(Vec<T>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Wrapped { results, count } => {
                let count = count.unwrap_or(results.len() as u64);
                Page {
                    items: results,
                    count,
                }
            }
            Raw::Bare(items) => Page {
                count: items.len() as u64,
                items,
            },
        })
    }
}

/// Query parameters for a list request. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn query(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}
