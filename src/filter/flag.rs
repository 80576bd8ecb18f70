//! Flag decoration of node names

use lazy_static::lazy_static;
use regex::Regex;

/// Marker used when no region can be recognised in a name.
pub const FALLBACK_FLAG: &str = "🌐";

/// `(?:^|[^A-Za-z])CODE(?:[^A-Za-z]|$)`, so `US` matches `US 01` and `US01`
/// but not `RUSSIA`.
macro_rules! code {
    ($code:literal) => {
        concat!("(?:^|[^A-Za-z])", $code, "(?:[^A-Za-z]|$)")
    };
}

lazy_static! {
    static ref FLAGS: Vec<(&'static str, Regex)> = [
        ("🇭🇰", concat!("港|(?i:hong ?kong)|", code!("HK"))),
        ("🇹🇼", concat!("台|(?i:taiwan)|", code!("TW"))),
        ("🇯🇵", concat!("日本|东京|大阪|(?i:japan|tokyo|osaka)|", code!("JP"))),
        ("🇰🇷", concat!("韩|韓|首尔|(?i:korea|seoul)|", code!("KR"))),
        ("🇸🇬", concat!("新加坡|狮城|(?i:singapore)|", code!("SG"))),
        (
            "🇺🇸",
            concat!("美|洛杉矶|圣何塞|西雅图|(?i:united states|america|los angeles|seattle)|", code!("US"))
        ),
        ("🇬🇧", concat!("英|伦敦|(?i:united kingdom|london)|", code!("UK"), "|", code!("GB"))),
        ("🇩🇪", concat!("德国|法兰克福|(?i:germany|frankfurt)|", code!("DE"))),
        ("🇫🇷", concat!("法国|巴黎|(?i:france|paris)|", code!("FR"))),
        ("🇷🇺", concat!("俄|(?i:russia|moscow)|", code!("RU"))),
        ("🇨🇦", concat!("加拿大|(?i:canada|toronto)|", code!("CA"))),
        ("🇦🇺", concat!("澳大利亚|澳洲|悉尼|(?i:australia|sydney)|", code!("AU"))),
        ("🇮🇳", concat!("印度|(?i:india|mumbai)|", code!("IN"))),
        ("🇨🇳", concat!("中国|回国|(?i:china)|", code!("CN"))),
    ]
    .into_iter()
    .map(|(flag, pattern)| (flag, Regex::new(pattern).unwrap()))
    .collect();
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

/// Whether the name already starts with a flag marker.
pub fn has_flag(name: &str) -> bool {
    name.starts_with(FALLBACK_FLAG) || name.chars().next().is_some_and(is_regional_indicator)
}

/// Prefix `name` with the flag of the first recognised region.
///
/// Names which already carry a flag are returned unchanged.
pub fn prepend_flag(name: &str) -> String {
    if has_flag(name) {
        return name.to_string();
    }
    let flag = FLAGS
        .iter()
        .find(|(_, regex)| regex.is_match(name))
        .map_or(FALLBACK_FLAG, |(flag, _)| *flag);
    format!("{} {}", flag, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepend_flag() {
        assert_eq!(prepend_flag("HK 01"), "🇭🇰 HK 01");
        assert_eq!(prepend_flag("香港 IPLC"), "🇭🇰 香港 IPLC");
        assert_eq!(prepend_flag("US01"), "🇺🇸 US01");
        assert_eq!(prepend_flag("Tokyo Premium"), "🇯🇵 Tokyo Premium");
        assert_eq!(prepend_flag("Russia 01"), "🇷🇺 Russia 01");
    }

    #[test]
    fn test_existing_flag_is_kept() {
        assert_eq!(prepend_flag("🇸🇬 SG 01"), "🇸🇬 SG 01");
        assert_eq!(prepend_flag("🌐 Relay"), "🌐 Relay");
    }

    #[test]
    fn test_fallback_flag() {
        assert_eq!(prepend_flag("Relay"), "🌐 Relay");
        assert!(has_flag(&prepend_flag("")));
    }
}
