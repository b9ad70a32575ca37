//! Stop identifier normalization
//!
//! The journey planner identifies stations with HAFAS composite ids such as
//! `A=1@O=S+U Alexanderplatz@X=13411267@Y=52521508@U=86@L=900100003@`, or with
//! colon-separated global ids like `de:11000:900100003`. The REST backend only
//! understands the plain IBNR code (`900100003`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Plain station code accepted by the REST backend's departure endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedStopCode(String);

impl NormalizedStopCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedStopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedStopCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NormalizedStopCode> for String {
    fn from(code: NormalizedStopCode) -> Self {
        code.0
    }
}

/// Derive the REST station code from a planner location id
///
/// First match wins:
/// 1. `L=` present: the text after it, up to the next `@` or the end.
/// 2. `:` present: the last `:`-separated segment.
/// 3. otherwise the id unchanged.
#[must_use]
pub fn normalize(raw_id: &str) -> NormalizedStopCode {
    if let Some((_, rest)) = raw_id.split_once("L=") {
        let code = rest.split_once('@').map_or(rest, |(code, _)| code);
        return NormalizedStopCode(code.to_owned());
    }

    if let Some((_, last)) = raw_id.rsplit_once(':') {
        return NormalizedStopCode(last.to_owned());
    }

    NormalizedStopCode(raw_id.to_owned())
}
