//! Substitution placeholders such as `%h` or `%(user.home)`.
//!
//! Values may hold placeholders resolved later on the node that owns them.
//! The model never resolves them; it only detects them so that strict
//! validation can be skipped for values that are not final yet.

use std::fmt;

/// A single-letter placeholder recognized in setting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `%h`: local hostname.
    Hostname,
    /// `%c`: canonical hostname.
    CanonicalHostname,
    /// `%i`: local IP address.
    IpAddress,
    /// `%H`: user home directory.
    HomeDirectory,
    /// `%n`: user name.
    UserName,
    /// `%o`: operating system name.
    OsName,
    /// `%a`: processor architecture.
    Architecture,
    /// `%v`: operating system version.
    OsVersion,
    /// `%t`: temporary directory.
    TempDirectory,
    /// `%d`: random number.
    Random,
    /// `%D`: current date and time.
    DateTime,
}

impl Placeholder {
    /// Every single-letter placeholder.
    pub const ALL: [Placeholder; 11] = [
        Self::Hostname,
        Self::CanonicalHostname,
        Self::IpAddress,
        Self::HomeDirectory,
        Self::UserName,
        Self::OsName,
        Self::Architecture,
        Self::OsVersion,
        Self::TempDirectory,
        Self::Random,
        Self::DateTime,
    ];

    /// The letter following `%`.
    pub const fn letter(&self) -> char {
        match self {
            Self::Hostname => 'h',
            Self::CanonicalHostname => 'c',
            Self::IpAddress => 'i',
            Self::HomeDirectory => 'H',
            Self::UserName => 'n',
            Self::OsName => 'o',
            Self::Architecture => 'a',
            Self::OsVersion => 'v',
            Self::TempDirectory => 't',
            Self::Random => 'd',
            Self::DateTime => 'D',
        }
    }

    /// Looks a placeholder up by its letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.letter() == letter)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.letter())
    }
}

/// Returns `true` if the value holds any placeholder.
///
/// Both single-letter placeholders and `%(property)` references count.
///
/// ```
/// use dynconf_core::contains_placeholders;
///
/// assert!(contains_placeholders("%h"));
/// assert!(contains_placeholders("%H/terracotta/logs"));
/// assert!(contains_placeholders("%(user.dir)/data"));
/// assert!(!contains_placeholders("100%"));
/// assert!(!contains_placeholders("localhost"));
/// ```
pub fn contains_placeholders(value: &str) -> bool {
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.peek() {
            Some('(') => return true,
            Some(letter) if Placeholder::from_letter(*letter).is_some() => return true,
            _ => {}
        }
    }
    false
}

/// Lists the single-letter placeholders in order of appearance.
pub fn find_placeholders(value: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(p) = chars.peek().copied().and_then(Placeholder::from_letter) {
                found.push(p);
                chars.next();
            }
        }
    }
    found
}
