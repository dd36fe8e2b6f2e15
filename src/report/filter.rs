// SPDX-License-Identifier: MPL-2.0
//! Redaction filters applied to every chapter before serialization.
//!
//! - [`PathRedactionFilter`]: replaces file system paths with `<path>`
//! - [`IdentityRedactionFilter`]: hashes IP addresses, e-mail addresses,
//!   domain names and the system username
//!
//! HTML payloads are rewritten only between tags, and placeholders are
//! escaped there, so filtering never alters the markup itself. Mapping
//! payloads have their values rewritten; keys are left alone.
//!
//! # Privacy
//!
//! - Each identity filter instance has its own session salt
//! - Same input + same instance = same hash (consistent within one report)
//! - Different instances produce different hashes (no cross-report correlation)

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use super::chapter::ChapterContent;
use super::html;
use super::FilterError;

/// A pure transformation over chapter payloads.
///
/// Both methods default to the identity, so a filter only overrides the
/// payload shapes it understands.
pub trait ReportFilter: Send + Sync {
    /// Name used when a failure is logged.
    fn name(&self) -> &str;

    fn filter_html(&self, html: String) -> Result<String, FilterError> {
        Ok(html)
    }

    fn filter_mapping(
        &self,
        mapping: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, FilterError> {
        Ok(mapping)
    }

    /// Dispatches on the payload shape.
    fn apply(&self, content: ChapterContent) -> Result<ChapterContent, FilterError> {
        match content {
            ChapterContent::Html(html) => self.filter_html(html).map(ChapterContent::Html),
            ChapterContent::Mapping(mapping) => {
                self.filter_mapping(mapping).map(ChapterContent::Mapping)
            }
        }
    }
}

/// Delimiters wrapped around a placeholder.
#[derive(Debug, Clone, Copy)]
struct Placeholder {
    open: &'static str,
    close: &'static str,
}

const HTML_PLACEHOLDER: Placeholder = Placeholder {
    open: "&lt;",
    close: "&gt;",
};

const TEXT_PLACEHOLDER: Placeholder = Placeholder {
    open: "<",
    close: ">",
};

fn map_values(
    mapping: BTreeMap<String, String>,
    rewrite: impl Fn(&str) -> String,
) -> BTreeMap<String, String> {
    mapping
        .into_iter()
        .map(|(key, value)| {
            let value = rewrite(&value);
            (key, value)
        })
        .collect()
}

// =============================================================================
// Path Redaction
// =============================================================================

/// Compiled regex patterns for path detection.
static PATH_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    // Matches:
    // - Unix paths: /home/..., /Users/..., /tmp/..., /var/..., /etc/..., /opt/...
    // - Windows paths: C:\..., D:\..., etc.
    // - Windows UNC paths: \\server\share\...
    // - Home shortcut: ~/...
    // Path stops at whitespace, string delimiters and HTML markup/entities.
    Regex::new(concat!(
        r#"("#,
        r#"/home/[^\s"'()\[\]<>&]+"#,
        r#"|/Users/[^\s"'()\[\]<>&]+"#,
        r#"|/tmp/[^\s"'()\[\]<>&]+"#,
        r#"|/var/[^\s"'()\[\]<>&]+"#,
        r#"|/etc/[^\s"'()\[\]<>&]+"#,
        r#"|/opt/[^\s"'()\[\]<>&]+"#,
        r#"|~/[^\s"'()\[\]<>&]+"#,
        r#"|[A-Za-z]:\\[^\s"'()\[\]<>&]+"#,
        r#"|\\\\[^\s"'()\[\]<>&]+"#,
        r#")"#,
    ))
    .expect("path regex should compile")
});

/// Replaces file paths with a `<path>` placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathRedactionFilter;

impl PathRedactionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Redacts paths in plain text.
    ///
    /// ```
    /// use diagnostics_journal::report::PathRedactionFilter;
    ///
    /// let filter = PathRedactionFilter::new();
    /// assert_eq!(
    ///     filter.redact("Failed to open /home/user/photos/image.jpg"),
    ///     "Failed to open <path>"
    /// );
    /// ```
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        Self::redact_with(text, TEXT_PLACEHOLDER)
    }

    fn redact_with(text: &str, placeholder: Placeholder) -> String {
        let replacement = format!("{}path{}", placeholder.open, placeholder.close);
        PATH_PATTERNS
            .replace_all(text, replacement.as_str())
            .into_owned()
    }
}

impl ReportFilter for PathRedactionFilter {
    fn name(&self) -> &str {
        "path redaction"
    }

    fn filter_html(&self, html: String) -> Result<String, FilterError> {
        Ok(html::map_text_nodes(&html, |text| {
            Self::redact_with(text, HTML_PLACEHOLDER)
        }))
    }

    fn filter_mapping(
        &self,
        mapping: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, FilterError> {
        Ok(map_values(mapping, |value| self.redact(value)))
    }
}

// =============================================================================
// Identity Redaction
// =============================================================================

/// IPv4 address pattern: matches addresses like 192.168.1.1
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("IPv4 regex should compile")
});

/// IPv6 address pattern.
///
/// Forms starting or ending with `::` are left out so that Rust paths such
/// as `cafe::new` in log prefixes are not mistaken for addresses.
static IPV6_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"(?:[0-9a-f]{1,4}:){7}[0-9a-f]{1,4}|",
        r"(?:[0-9a-f]{1,4}:){1,6}:[0-9a-f]{1,4}|",
        r"(?:[0-9a-f]{1,4}:){1,5}(?::[0-9a-f]{1,4}){1,2}|",
        r"(?:[0-9a-f]{1,4}:){1,4}(?::[0-9a-f]{1,4}){1,3}|",
        r"(?:[0-9a-f]{1,4}:){1,3}(?::[0-9a-f]{1,4}){1,4}|",
        r"(?:[0-9a-f]{1,4}:){1,2}(?::[0-9a-f]{1,4}){1,5}|",
        r"[0-9a-f]{1,4}:(?::[0-9a-f]{1,4}){1,6}",
        r")\b"
    ))
    .expect("IPv6 regex should compile")
});

/// E-mail address pattern.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,}\b")
        .expect("e-mail regex should compile")
});

/// Domain name pattern: matches domains like example.com, sub.domain.org
static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\b")
        .expect("Domain regex should compile")
});

/// Known TLDs to recognize as domain names (not file extensions)
const KNOWN_TLDS: &[&str] = &[
    "com", "org", "net", "edu", "gov", "mil", "int", "io", "dev", "app", "cloud", "ai", "tech",
    "co", "info", "biz", "me", "uk", "de", "fr", "jp", "cn", "au", "ca", "nl", "ru", "br", "in",
    "it", "es",
];

/// Common file extensions that look like TLDs but should be skipped
const FILE_EXTENSIONS: &[&str] = &[
    "rs", "js", "ts", "py", "go", "md", "txt", "log", "json", "xml", "html", "css", "jpg", "jpeg",
    "png", "gif", "bmp", "webp", "svg", "ico", "mp3", "mp4", "wav", "avi", "mkv", "webm", "mov",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "tar", "gz", "rar", "7z", "exe",
    "dll", "so", "dylib", "toml", "yaml", "yml", "ini", "cfg", "conf",
];

/// Hashes IP addresses, e-mail addresses, domain names and the username.
///
/// Uses blake3 with a per-instance salt. The system username is detected at
/// construction time.
#[derive(Debug, Clone)]
pub struct IdentityRedactionFilter {
    /// Per-instance salt for hashing (32 bytes)
    salt: [u8; 32],
    username_hash: Option<String>,
    username_pattern: Option<Regex>,
}

impl IdentityRedactionFilter {
    /// Creates a filter with a random salt from the operating system.
    ///
    /// The system username is detected from `USER` or `USERNAME`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system cannot provide random bytes.
    pub fn new() -> Result<Self, FilterError> {
        let mut salt = [0u8; 32];
        getrandom::fill(&mut salt)
            .map_err(|err| FilterError(format!("failed to generate salt: {err}")))?;
        let username = Self::get_system_username();
        Ok(Self::build(salt, username.as_deref()))
    }

    /// Creates a filter with a deterministic seed and a known username.
    ///
    /// The seed is expanded to a 32-byte salt using blake3.
    #[must_use]
    pub fn with_seed_and_username(seed: u64, username: Option<&str>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        hasher.update(b"diagnostics_journal_identity_filter_seed");
        let salt = *hasher.finalize().as_bytes();
        Self::build(salt, username)
    }

    fn build(salt: [u8; 32], username: Option<&str>) -> Self {
        let (username_hash, username_pattern) = match username {
            Some(name) if !name.is_empty() => {
                let hash = hash_with_salt(&salt, name);
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).ok();
                (Some(hash), pattern)
            }
            _ => (None, None),
        };

        Self {
            salt,
            username_hash,
            username_pattern,
        }
    }

    fn get_system_username() -> Option<String> {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
    }

    /// Redacts identities in plain text.
    ///
    /// # Order of operations
    ///
    /// 1. Username replacement (to avoid partial matches)
    /// 2. E-mail addresses (before their domain part is seen as a domain)
    /// 3. IPv4 addresses
    /// 4. IPv6 addresses
    /// 5. Domain names, keeping the TLD
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        self.redact_with(input, TEXT_PLACEHOLDER)
    }

    fn redact_with(&self, input: &str, placeholder: Placeholder) -> String {
        let Placeholder { open, close } = placeholder;
        let mut result = input.to_string();

        if let (Some(pattern), Some(hash)) = (&self.username_pattern, &self.username_hash) {
            let replacement = format!("{open}user:{hash}{close}");
            result = pattern
                .replace_all(&result, regex::NoExpand(&replacement))
                .into_owned();
        }

        result = EMAIL_PATTERN
            .replace_all(&result, |caps: &regex::Captures| {
                format!("{open}email:{}{close}", self.hash_value(&caps[0]))
            })
            .into_owned();

        result = IPV4_PATTERN
            .replace_all(&result, |caps: &regex::Captures| {
                let ip = &caps[0];
                if ip.parse::<Ipv4Addr>().is_ok() {
                    format!("{open}ip:{}{close}", self.hash_value(ip))
                } else {
                    ip.to_string()
                }
            })
            .into_owned();

        result = IPV6_PATTERN
            .replace_all(&result, |caps: &regex::Captures| {
                format!("{open}ip:{}{close}", self.hash_value(&caps[0]))
            })
            .into_owned();

        DOMAIN_PATTERN
            .replace_all(&result, |caps: &regex::Captures| {
                let domain = &caps[0];
                let tld = domain.rsplit('.').next().unwrap_or("");
                let tld_lower = tld.to_lowercase();

                if FILE_EXTENSIONS.contains(&tld_lower.as_str()) {
                    return domain.to_string();
                }
                // Allow 2-letter TLDs as country codes even if not in list
                if !KNOWN_TLDS.contains(&tld_lower.as_str()) && tld.len() != 2 {
                    return domain.to_string();
                }

                let domain_part = &domain[..domain.len() - tld.len() - 1];
                format!("{open}domain:{}{close}.{tld}", self.hash_value(domain_part))
            })
            .into_owned()
    }

    /// First 8 hex characters of the keyed blake3 hash.
    fn hash_value(&self, value: &str) -> String {
        hash_with_salt(&self.salt, value)
    }
}

fn hash_with_salt(salt: &[u8; 32], value: &str) -> String {
    let mut hasher = blake3::Hasher::new_keyed(salt);
    hasher.update(value.as_bytes());
    hasher.finalize().to_hex()[..8].to_string()
}

impl ReportFilter for IdentityRedactionFilter {
    fn name(&self) -> &str {
        "identity redaction"
    }

    fn filter_html(&self, html: String) -> Result<String, FilterError> {
        Ok(html::map_text_nodes(&html, |text| {
            self.redact_with(text, HTML_PLACEHOLDER)
        }))
    }

    fn filter_mapping(
        &self,
        mapping: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, FilterError> {
        Ok(map_values(mapping, |value| self.redact(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> IdentityRedactionFilter {
        IdentityRedactionFilter::with_seed_and_username(42, Some("alice"))
    }

    // =========================================================================
    // Path Redaction Tests
    // =========================================================================

    #[test]
    fn path_filter_redacts_unix_and_windows_paths() {
        let filter = PathRedactionFilter::new();
        assert_eq!(filter.redact("open /tmp/a/b.txt failed"), "open <path> failed");
        assert_eq!(
            filter.redact(r"Cannot read C:\Users\name\file.txt"),
            "Cannot read <path>"
        );
        assert_eq!(filter.redact("Invalid format"), "Invalid format");
    }

    #[test]
    fn path_filter_keeps_markup_intact() {
        let filter = PathRedactionFilter::new();
        let html = "<span class=\"log-message\">open &quot;/home/bob/x.png&quot;</span>".to_string();
        let filtered = filter.filter_html(html).expect("path filter never fails");
        assert_eq!(
            filtered,
            "<span class=\"log-message\">open &quot;&lt;path&gt;&quot;</span>"
        );
    }

    #[test]
    fn path_filter_rewrites_mapping_values_only() {
        let filter = PathRedactionFilter::new();
        let mut mapping = BTreeMap::new();
        mapping.insert("/home/key".to_string(), "/home/bob/value".to_string());
        let filtered = filter.filter_mapping(mapping).expect("never fails");
        assert_eq!(filtered.get("/home/key").map(String::as_str), Some("<path>"));
    }

    // =========================================================================
    // Identity Redaction Tests
    // =========================================================================

    #[test]
    fn identity_filter_hashes_ipv4() {
        let result = identity().redact("Error from 192.168.1.1");
        assert!(result.starts_with("Error from <ip:"));
        assert!(!result.contains("192.168.1.1"));
    }

    #[test]
    fn identity_filter_keeps_invalid_ipv4() {
        assert_eq!(identity().redact("999.999.999.999"), "999.999.999.999");
    }

    #[test]
    fn identity_filter_hashes_ipv6_but_not_rust_paths() {
        let filter = identity();
        let result = filter.redact("peer 2001:db8:85a3::8a2e:370:7334 in cafe::connect");
        assert!(!result.contains("2001:db8"));
        assert!(result.contains("cafe::connect"));
    }

    #[test]
    fn identity_filter_hashes_email_before_domain() {
        let result = identity().redact("contact bob@example.com");
        assert!(result.starts_with("contact <email:"));
        assert!(!result.contains("example"));
    }

    #[test]
    fn identity_filter_preserves_tld_and_skips_files() {
        let filter = identity();
        let result = filter.redact("fetch api.example.com then read config.toml");
        assert!(result.contains("<domain:"));
        assert!(result.contains(">.com"));
        assert!(result.contains("config.toml"));
    }

    #[test]
    fn identity_filter_hashes_username_case_insensitively() {
        let result = identity().redact("Alice opened alice's file");
        assert_eq!(result.matches("<user:").count(), 2);
    }

    #[test]
    fn identity_filter_is_deterministic_per_seed() {
        let a = IdentityRedactionFilter::with_seed_and_username(1, None);
        let b = IdentityRedactionFilter::with_seed_and_username(1, None);
        let c = IdentityRedactionFilter::with_seed_and_username(2, None);
        assert_eq!(a.redact("10.0.0.1"), b.redact("10.0.0.1"));
        assert_ne!(a.redact("10.0.0.1"), c.redact("10.0.0.1"));
    }

    #[test]
    fn identity_filter_escapes_placeholders_in_html() {
        let html = "<p class=\"system\">GET 10.0.0.1</p>".to_string();
        let filtered = identity().filter_html(html).expect("never fails");
        assert!(filtered.starts_with("<p class=\"system\">GET &lt;ip:"));
        assert!(filtered.ends_with("&gt;</p>"));
    }

    #[test]
    fn identity_filter_does_not_touch_tags_matching_username() {
        let filter = IdentityRedactionFilter::with_seed_and_username(3, Some("span"));
        let html = "<span class=\"log-message\">span here</span>".to_string();
        let filtered = filter.filter_html(html).expect("never fails");
        assert!(filtered.starts_with("<span class=\"log-message\">&lt;user:"));
        assert!(filtered.ends_with("</span>"));
    }

    #[test]
    fn random_salt_differs_between_instances() {
        let a = IdentityRedactionFilter::new().expect("entropy available");
        let b = IdentityRedactionFilter::new().expect("entropy available");
        assert_ne!(a.redact("10.1.2.3"), b.redact("10.1.2.3"));
    }
}
