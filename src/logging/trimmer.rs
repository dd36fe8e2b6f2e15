// SPDX-License-Identifier: MPL-2.0
//! Fragment parsing and oldest-first trimming of log content.
//!
//! Trimming only ever cuts at the end of a parsed fragment, so the content
//! left behind re-parses into a suffix of the original fragment sequence.

use std::ops::Range;
use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::domain::diagnostics::{MaxLogSize, TrimBatch};

/// One `<p class="...">...</p>` fragment followed by its optional newline.
static FRAGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p class="([a-z]+)">(.*?)</p>\n?"#).expect("fragment regex should compile")
});

/// A parsed entry fragment borrowed from raw log content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// CSS class of the fragment (`system`, `debug`, `error`, `session`).
    pub class: &'a str,
    /// Inner HTML of the paragraph.
    pub body: &'a [u8],
    /// Byte range of the whole fragment, including its newline.
    pub range: Range<usize>,
}

/// Parses every fragment in `data`, in file order.
///
/// Bytes between fragments (corruption, partial writes) are skipped.
#[must_use]
pub fn parse_fragments(data: &[u8]) -> Vec<Fragment<'_>> {
    FRAGMENT_PATTERN
        .captures_iter(data)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let class = std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
            Some(Fragment {
                class,
                body: caps.get(2)?.as_bytes(),
                range: whole.range(),
            })
        })
        .collect()
}

/// Where to cut log content so that it fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPlan {
    /// Content before this offset is dropped.
    pub cut: usize,
    /// Number of whole fragments dropped.
    pub removed: usize,
}

/// Computes oldest-first cuts over serialized log content.
pub struct LogTrimmer;

impl LogTrimmer {
    /// Plans removal of exactly the `count` oldest fragments.
    ///
    /// Returns `None` when the content holds no parsable fragment.
    #[must_use]
    pub fn plan_trim(data: &[u8], count: usize) -> Option<TrimPlan> {
        let fragments = parse_fragments(data);
        if fragments.is_empty() {
            return None;
        }
        let removed = count.min(fragments.len());
        let cut = if removed == 0 {
            0
        } else {
            fragments[removed - 1].range.end
        };
        Some(TrimPlan { cut, removed })
    }

    /// Removes the `count` oldest fragments and returns the remainder.
    ///
    /// Returns `None` when the content holds no parsable fragment.
    #[must_use]
    pub fn trim(data: &[u8], count: usize) -> Option<Vec<u8>> {
        Self::plan_trim(data, count).map(|plan| data[plan.cut..].to_vec())
    }

    /// Plans repeated passes of `batch` oldest fragments until the rest fits.
    ///
    /// The newest fragment is never removed. If even the newest fragment with
    /// its trailing bytes is too large, the plan keeps only that fragment and
    /// the caller is left to handle the overshoot.
    #[must_use]
    pub fn plan_fit(data: &[u8], max_size: MaxLogSize, batch: TrimBatch) -> Option<TrimPlan> {
        let fragments = parse_fragments(data);
        let newest = fragments.len().checked_sub(1)?;

        if max_size.fits(data.len()) {
            return Some(TrimPlan { cut: 0, removed: 0 });
        }

        let mut removed = 0;
        while removed < newest {
            removed = (removed + batch.value()).min(newest);
            let cut = fragments[removed - 1].range.end;
            if max_size.fits(data.len() - cut) {
                return Some(TrimPlan { cut, removed });
            }
        }

        Some(TrimPlan {
            cut: fragments[newest].range.start,
            removed: newest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::entry::{LogEntry, Origin};

    fn content(messages: &[&str]) -> Vec<u8> {
        messages
            .iter()
            .map(|message| LogEntry::debug(*message, Origin::new("f.rs", "f", 1)).to_fragment())
            .collect::<String>()
            .into_bytes()
    }

    fn messages_of(data: &[u8]) -> Vec<String> {
        parse_fragments(data)
            .iter()
            .map(|fragment| String::from_utf8_lossy(fragment.body).into_owned())
            .collect()
    }

    #[test]
    fn parse_finds_every_fragment_in_order() {
        let data = content(&["one", "two", "three"]);
        let fragments = parse_fragments(&data);
        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|fragment| fragment.class == "debug"));
        assert_eq!(fragments[2].range.end, data.len());
        assert!(String::from_utf8_lossy(fragments[1].body).contains("two"));
    }

    #[test]
    fn parse_skips_garbage_between_fragments() {
        let mut data = b"garbage<p class=".to_vec();
        data.extend(content(&["kept"]));
        data.extend_from_slice(b"\x00\xfftrailing");
        let fragments = parse_fragments(&data);
        assert_eq!(fragments.len(), 1);
    }

    #[test]
    fn trim_removes_oldest_fragments() {
        let data = content(&["a", "b", "c", "d"]);
        let trimmed = LogTrimmer::trim(&data, 2).expect("content is parsable");
        let before = messages_of(&data);
        assert_eq!(messages_of(&trimmed), before[2..].to_vec());
    }

    #[test]
    fn trim_of_unparsable_content_is_none() {
        assert!(LogTrimmer::trim(b"", 10).is_none());
        assert!(LogTrimmer::trim(b"not a log", 10).is_none());
    }

    #[test]
    fn trim_more_than_available_empties_content() {
        let data = content(&["a", "b"]);
        let trimmed = LogTrimmer::trim(&data, 10).expect("content is parsable");
        assert!(trimmed.is_empty());
    }

    #[test]
    fn plan_fit_keeps_newest_fragment() {
        let data = content(&["first", "second", "third"]);
        let plan = LogTrimmer::plan_fit(&data, MaxLogSize::new(64), TrimBatch::new(10))
            .expect("content is parsable");
        assert_eq!(plan.removed, 2);
        let rest = &data[plan.cut..];
        assert_eq!(messages_of(rest).len(), 1);
        assert!(messages_of(rest)[0].contains("third"));
    }

    #[test]
    fn plan_fit_stops_at_first_fitting_batch() {
        let data = content(&["a", "b", "c", "d", "e", "f"]);
        let one = parse_fragments(&data)[0].range.len();
        // Room for four fragments.
        let max = MaxLogSize::new((one * 4) as u64);
        let plan = LogTrimmer::plan_fit(&data, max, TrimBatch::new(1)).expect("parsable");
        assert_eq!(plan.removed, 2);
        assert!(max.fits(data.len() - plan.cut));
    }

    #[test]
    fn plan_fit_is_noop_when_content_fits() {
        let data = content(&["a"]);
        let plan = LogTrimmer::plan_fit(&data, MaxLogSize::default(), TrimBatch::default())
            .expect("parsable");
        assert_eq!(plan, TrimPlan { cut: 0, removed: 0 });
    }
}
