//! Locale and content flags of root blocks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Locales a root block applies to, one bit per [`Locale`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleFlags(pub u32);

impl LocaleFlags {
    /// Every locale
    pub const ALL: Self = Self(0xFFFF_FFFF);

    /// No locale
    pub const NONE: Self = Self(0);

    /// Create from raw bits
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw bits
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether any locale is shared with `other`
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Whether `locale` is set
    pub const fn contains(self, locale: Locale) -> bool {
        (self.0 & locale.bit()) != 0
    }

    /// Locales set in these flags
    pub fn locales(self) -> impl Iterator<Item = Locale> {
        Locale::ALL.into_iter().filter(move |l| self.contains(*l))
    }
}

impl From<Locale> for LocaleFlags {
    fn from(locale: Locale) -> Self {
        Self(locale.bit())
    }
}

impl From<u32> for LocaleFlags {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::ops::BitOr for LocaleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<Locale> for LocaleFlags {
    type Output = Self;

    fn bitor(self, rhs: Locale) -> Self::Output {
        Self(self.0 | rhs.bit())
    }
}

impl fmt::Display for LocaleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Game locales with a dedicated root flag bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Locale {
    #[serde(rename = "enUS")]
    EnUs,
    #[serde(rename = "koKR")]
    KoKr,
    #[serde(rename = "frFR")]
    FrFr,
    #[serde(rename = "deDE")]
    DeDe,
    #[serde(rename = "zhCN")]
    ZhCn,
    #[serde(rename = "esES")]
    EsEs,
    #[serde(rename = "zhTW")]
    ZhTw,
    #[serde(rename = "enGB")]
    EnGb,
    #[serde(rename = "enCN")]
    EnCn,
    #[serde(rename = "enTW")]
    EnTw,
    #[serde(rename = "esMX")]
    EsMx,
    #[serde(rename = "ruRU")]
    RuRu,
    #[serde(rename = "ptBR")]
    PtBr,
    #[serde(rename = "itIT")]
    ItIt,
    #[serde(rename = "ptPT")]
    PtPt,
}

impl Locale {
    /// Every locale in bit order
    pub const ALL: [Self; 15] = [
        Self::EnUs,
        Self::KoKr,
        Self::FrFr,
        Self::DeDe,
        Self::ZhCn,
        Self::EsEs,
        Self::ZhTw,
        Self::EnGb,
        Self::EnCn,
        Self::EnTw,
        Self::EsMx,
        Self::RuRu,
        Self::PtBr,
        Self::ItIt,
        Self::PtPt,
    ];

    /// Flag bit of this locale
    pub const fn bit(self) -> u32 {
        match self {
            Self::EnUs => 0x2,
            Self::KoKr => 0x4,
            Self::FrFr => 0x10,
            Self::DeDe => 0x20,
            Self::ZhCn => 0x40,
            Self::EsEs => 0x80,
            Self::ZhTw => 0x100,
            Self::EnGb => 0x200,
            Self::EnCn => 0x400,
            Self::EnTw => 0x800,
            Self::EsMx => 0x1000,
            Self::RuRu => 0x2000,
            Self::PtBr => 0x4000,
            Self::ItIt => 0x8000,
            Self::PtPt => 0x1_0000,
        }
    }

    /// Locale code such as `enUS`
    pub const fn code(self) -> &'static str {
        match self {
            Self::EnUs => "enUS",
            Self::KoKr => "koKR",
            Self::FrFr => "frFR",
            Self::DeDe => "deDE",
            Self::ZhCn => "zhCN",
            Self::EsEs => "esES",
            Self::ZhTw => "zhTW",
            Self::EnGb => "enGB",
            Self::EnCn => "enCN",
            Self::EnTw => "enTW",
            Self::EsMx => "esMX",
            Self::RuRu => "ruRU",
            Self::PtBr => "ptBR",
            Self::ItIt => "itIT",
            Self::PtPt => "ptPT",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown locale: {s}"))
    }
}

/// Content flags of a root block
///
/// Version 4 roots store 40 bits; the lower 32 are the ones with known meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentFlags(pub u64);

impl ContentFlags {
    /// Windows-only content
    pub const LOAD_ON_WINDOWS: u64 = 0x0001;
    /// macOS-only content
    pub const LOAD_ON_MACOS: u64 = 0x0002;
    /// Installed content
    pub const INSTALL: u64 = 0x0004;
    /// Low violence variant
    pub const LOW_VIOLENCE: u64 = 0x0008;
    /// Not loaded by the client
    pub const DO_NOT_LOAD: u64 = 0x0200;
    /// Encrypted content
    pub const ENCRYPTED: u64 = 0x1000;
    /// Block carries no name hash array
    pub const NO_NAME_HASH: u64 = 0x2000;
    /// Stored without compression
    pub const NO_COMPRESSION: u64 = 0x0001_0000;

    /// Create from raw bits
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Whether `flag` is set
    pub const fn has(self, flag: u64) -> bool {
        (self.0 & flag) != 0
    }

    /// Whether the block stores name hashes
    pub const fn has_name_hashes(self) -> bool {
        !self.has(Self::NO_NAME_HASH)
    }
}

impl fmt::Display for ContentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_bits_are_distinct() {
        let mut seen = 0u32;
        for locale in Locale::ALL {
            assert_eq!(locale.bit().count_ones(), 1);
            assert_eq!(seen & locale.bit(), 0, "{locale} reuses a bit");
            seen |= locale.bit();
        }
    }

    #[test]
    fn test_locale_codes() {
        assert_eq!("enUS".parse::<Locale>().unwrap(), Locale::EnUs);
        assert_eq!("DEDE".parse::<Locale>().unwrap(), Locale::DeDe);
        assert!("xxXX".parse::<Locale>().is_err());
        assert_eq!(Locale::PtPt.to_string(), "ptPT");
    }

    #[test]
    fn test_locale_flags_ops() {
        let flags = LocaleFlags::from(Locale::EnUs) | Locale::EnGb;
        assert_eq!(flags.value(), 0x202);
        assert!(flags.contains(Locale::EnGb));
        assert!(!flags.contains(Locale::DeDe));
        assert!(flags.intersects(LocaleFlags::from(Locale::EnUs)));
        assert!(!flags.intersects(LocaleFlags::from(Locale::FrFr)));
        assert!(LocaleFlags::ALL.intersects(flags));
        assert_eq!(
            flags.locales().collect::<Vec<_>>(),
            vec![Locale::EnUs, Locale::EnGb]
        );
    }

    #[test]
    fn test_locale_serde_names() {
        let json = serde_json::to_string(&Locale::ZhTw).unwrap();
        assert_eq!(json, "\"zhTW\"");
        let flags: LocaleFlags = serde_json::from_str("34").unwrap();
        assert_eq!(flags, LocaleFlags::new(0x22));
    }

    #[test]
    fn test_content_flags() {
        assert!(ContentFlags::default().has_name_hashes());
        let flags = ContentFlags::new(ContentFlags::INSTALL | ContentFlags::NO_NAME_HASH);
        assert!(!flags.has_name_hashes());
        assert!(flags.has(ContentFlags::INSTALL));
    }
}
