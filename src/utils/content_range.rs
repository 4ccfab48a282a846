use axum::http::HeaderMap;
use axum::http::header;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static CONTENT_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<unit>[A-Za-z]+) (?<start>[0-9]+)-(?<end>[0-9]+)/(?<total>[0-9]+|\*)$").unwrap()
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContentRangeError {
    #[error("Content-Range header is missing")]
    Missing,

    #[error("Content-Range header is not valid ASCII")]
    NotAscii,

    #[error("expected `bytes <start>-<end>/<total>`, got `{0}`")]
    Format(String),

    #[error("unsupported range unit `{0}`")]
    Unit(String),

    #[error("offset `{0}` is out of range")]
    Overflow(String),

    #[error("start offset {start} is greater than end offset {end}")]
    Reversed { start: u64, end: u64 },

    #[error("end offset {end} is beyond the declared total of {total} bytes")]
    BeyondTotal { end: u64, total: u64 },

    #[error("range {start}-{end} is too large")]
    TooLarge { start: u64, end: u64 },
}

/// A parsed `Content-Range: bytes <start>-<end>/<total>` descriptor.
///
/// `end` is inclusive. The total may be `*`, and it never feeds the block size:
/// [`ContentRange::size`] is always recomputed from the bounds. Only
/// [`ContentRange::new`] builds one, so `size == end - start + 1` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    start: u64,
    end: u64,
    total: Option<u64>,
    size: u64,
}

impl ContentRange {
    pub fn new(start: u64, end: u64, total: Option<u64>) -> Result<Self, ContentRangeError> {
        if start > end {
            return Err(ContentRangeError::Reversed { start, end });
        }
        if let Some(total) = total
            && end >= total
        {
            return Err(ContentRangeError::BeyondTotal { end, total });
        }
        let size = (end - start)
            .checked_add(1)
            .ok_or(ContentRangeError::TooLarge { start, end })?;

        Ok(ContentRange {
            start,
            end,
            total,
            size,
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ContentRangeError> {
        headers
            .get(header::CONTENT_RANGE)
            .ok_or(ContentRangeError::Missing)?
            .to_str()
            .map_err(|_| ContentRangeError::NotAscii)?
            .parse()
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl FromStr for ContentRange {
    type Err = ContentRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let caps = CONTENT_RANGE_RE
            .captures(s)
            .ok_or_else(|| ContentRangeError::Format(s.to_string()))?;

        let unit = &caps["unit"];
        if !unit.eq_ignore_ascii_case("bytes") {
            return Err(ContentRangeError::Unit(unit.to_string()));
        }

        let start = parse_offset(&caps["start"])?;
        let end = parse_offset(&caps["end"])?;
        let total = match &caps["total"] {
            "*" => None,
            total => Some(parse_offset(total)?),
        };
        ContentRange::new(start, end, total)
    }
}

fn parse_offset(digits: &str) -> Result<u64, ContentRangeError> {
    digits
        .parse()
        .map_err(|_| ContentRangeError::Overflow(digits.to_string()))
}
