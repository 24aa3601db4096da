//! Substitution rules for field canonicalization
//!
//! Raw payloads spell the same device, operator, or OS version dozens of
//! ways. The rule tables here map those variants onto single canonical
//! labels so records land in the same segments during aggregation.
//!
//! Each rule pairs a regex with a replacement that is a pure function of
//! the match groups. Tables are applied either in sequence (every rule gets
//! one chance to replace, each seeing the previous rule's output) or
//! first-match-wins (scanning stops at the first rule that matches). Both
//! modes replace at most once per rule.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Replacement half of a substitution rule
pub enum Replacement {
    /// Fixed replacement text
    Text(&'static str),
    /// Replacement computed from the match groups
    With(fn(&Captures) -> String),
}

/// One canonicalization rule: a pattern and its replacement
pub struct SubRule {
    pattern: Regex,
    replacement: Replacement,
}

impl SubRule {
    fn text(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("static rule pattern must compile"),
            replacement: Replacement::Text(replacement),
        }
    }

    fn with(pattern: &str, replacement: fn(&Captures) -> String) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("static rule pattern must compile"),
            replacement: Replacement::With(replacement),
        }
    }

    /// Whether this rule matches the value
    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    /// Replace the first match in the value.
    ///
    /// Returns the rewritten string, or `None` if the pattern did not match.
    /// Only the matched span is replaced; text around it is preserved.
    pub fn apply(&self, value: &str) -> Option<String> {
        if !self.pattern.is_match(value) {
            return None;
        }
        let replaced = match &self.replacement {
            Replacement::Text(text) => self
                .pattern
                .replace(value, regex::NoExpand(text))
                .into_owned(),
            Replacement::With(f) => self
                .pattern
                .replace(value, |caps: &Captures| f(caps))
                .into_owned(),
        };
        Some(replaced)
    }
}

/// Apply every rule in sequence, each making at most one replacement.
///
/// Later rules see the output of earlier ones, so ordering is part of the
/// table's meaning.
pub fn apply_all(value: &str, rules: &[SubRule]) -> String {
    let mut current = value.to_string();
    for rule in rules {
        if let Some(replaced) = rule.apply(&current) {
            current = replaced;
        }
    }
    current
}

/// Apply at most one rule: the first whose pattern matches.
///
/// Rules in a first-match table are meant to be mutually exclusive; scanning
/// stops as soon as one matches, whether or not the replacement changed the
/// string.
pub fn apply_first(value: &str, rules: &[SubRule]) -> String {
    for rule in rules {
        if let Some(replaced) = rule.apply(value) {
            return replaced;
        }
    }
    value.to_string()
}

/// Append a suffix separated by a space, if the suffix is non-empty
fn add_suffix(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, suffix)
    }
}

// =============================================================================
// OS Version Rules
// =============================================================================

/// OS-version substitutions, applied in sequence:
/// 1. a `-prerelease`/`.prerelease` suffix becomes ` (pre-release)`
/// 2. a dotted numeric version is truncated to at most 3 significant
///    components, dropping trailing `.0` segments
/// 3. vendor-prefixed Tarako build identifiers collapse to the fixed label
pub static OS_SUBS: LazyLock<Vec<SubRule>> = LazyLock::new(|| {
    vec![
        SubRule::text(r"(?i)[.\-]prerelease$", " (pre-release)"),
        SubRule::with(
            r"(?i)^(?P<num>[1-9]\.[0-9](\.[1-9]){0,2})(\.0){0,2}",
            |caps| caps["num"].to_string(),
        ),
        SubRule::text(r"(?i)^(ind|intex)_.+$", "1.3T"),
    ]
});

// =============================================================================
// Device Name Rules
// =============================================================================

/// Device-name substitutions, first match wins.
///
/// Each rule recognizes the spelling variants of one physical device and
/// replaces them with one canonical label.
pub static DEVICE_SUBS: LazyLock<Vec<SubRule>> = LazyLock::new(|| {
    vec![
        // One Touch Fire, with optional C/E suffix.
        SubRule::with(
            r"(?i)^.*one\s*touch.*fire\s*(?P<suffix>[ce]?)(?:\s+\S*)?$",
            |caps| add_suffix("One Touch Fire", &caps["suffix"].to_uppercase()),
        ),
        // Open 2/C.
        SubRule::with(r"(?i)^.*open\s*(?P<suffix>[2c])(?:\s+\S*)?$", |caps| {
            format!("ZTE Open {}", caps["suffix"].to_uppercase())
        }),
        // Open.
        SubRule::text(r"(?i)^.*open\s*$", "ZTE Open"),
        // Flame.
        SubRule::text(r"(?i)^.*flame.*$", "Flame"),
        // Geeksphone.
        SubRule::text(r"(?i)^.*(keon|peak|revolution).*$", "Geeksphone"),
        // Emulators/dev devices.
        SubRule::text(r"(?i)^.*(android|aosp).*$", "Emulator/Android"),
        // Tarako - Cloud FX.
        SubRule::text(r"(?i)^.*clou.?d\s*fx.*$", "Intex Cloud FX"),
        // Tarako - Spice.
        SubRule::with(r"(?i)^.*spice(\s*|_)mi-?fx(?P<ver>[12]).*$", |caps| {
            format!("Spice MIFX{}", &caps["ver"])
        }),
        // Tarako - Cherry Ace.
        SubRule::text(r"(?i)^ace\s*f100.*$", "Ace F100"),
        // Fire C device in Peru.
        SubRule::text(r"(?i)^4019a$", "One Touch Fire C"),
        // Zen U105.
        SubRule::text(r"(?i)^.*u105.*$", "Zen U105"),
        // Fx0.
        SubRule::text(r"(?i)^lgl25.*$", "Fx0"),
        // Pixi 3.
        SubRule::text(r"(?i)^.*pixi\s*3(\s+\(?|\()3\.5\)?.*$", "Pixi 3 (3.5)"),
        // Orange Klif.
        SubRule::text(r"(?i)^.*klif.*$", "Orange Klif"),
        // Panasonic TV.
        SubRule::text(r"(?i)^ptv-.*$", "Panasonic TV"),
        // Sony Xperia Z3C.
        SubRule::text(r"(?i)^.*xperia\s*z3\s*c(ompact)?(\W+.*)?$", "Xperia Z3C"),
    ]
});

// =============================================================================
// Operator Name Rules
// =============================================================================

/// Operator-name substitutions, first match wins.
///
/// The first block collapses known carrier names by prefix; the second
/// covers spelling differences and rebrandings that need fuller patterns.
pub static OPERATOR_SUBS: LazyLock<Vec<SubRule>> = LazyLock::new(|| {
    vec![
        // Prefix-based collapsing.
        SubRule::text(r"(?i)^A1.*$", "A1"),
        SubRule::text(r"(?i)^Aircel.*$", "Aircel"),
        SubRule::text(r"(?i)^Airtel.*$", "Airtel"),
        SubRule::text(r"(?i)^AIS.*$", "AIS"),
        SubRule::text(r"(?i)^AKTel.*$", "Robi"),
        SubRule::text(r"(?i)^Alltel.*$", "Alltel"),
        SubRule::text(r"(?i)^AT&T.*$", "AT&T"),
        SubRule::text(r"(?i)^B-Mobile.*$", "B-Mobile"),
        SubRule::text(r"(?i)^Banglalink.*$", "Banglalink"),
        SubRule::text(r"(?i)^Base.*$", "Base"),
        SubRule::text(r"(?i)^Batelco.*$", "Batelco"),
        SubRule::text(r"(?i)^Bell.*$", "Bell"),
        SubRule::text(r"(?i)^Bite.*$", "Bite"),
        SubRule::text(r"(?i)^blau.*$", "blau"),
        SubRule::text(r"(?i)^Bob.*$", "Bob"),
        SubRule::text(r"(?i)^Bouygues.*$", "Bouygues"),
        SubRule::text(r"(?i)^Breeze.*$", "Breeze"),
        SubRule::text(r"(?i)^CCT.*$", "CCT"),
        SubRule::text(r"(?i)^Cellular One.*$", "Cellular One"),
        SubRule::text(r"(?i)^Claro.*$", "Claro"),
        SubRule::text(r"(?i)^Cloud9.*$", "Cloud9"),
        SubRule::text(r"(?i)^Comcel.*$", "Claro"),
        SubRule::text(r"(?i)^Congstar.*$", "Congstar"),
        SubRule::text(r"(?i)^Corr.*$", "Corr"),
        SubRule::text(r"(?i)^CTBC.*$", "CTBC"),
        SubRule::text(r"(?i)^delight.*$", "delight"),
        SubRule::text(r"(?i)^Digicel.*$", "Digicel"),
        SubRule::text(r"(?i)^Digitel.*$", "Digitel"),
        SubRule::text(r"(?i)^Digital.*$", "Digital"),
        SubRule::text(r"(?i)^disco.*$", "disco"),
        SubRule::text(r"(?i)^Djuice.*$", "Djuice"),
        SubRule::text(r"(?i)^DNA.*$", "DNA"),
        SubRule::text(r"(?i)^Dolphin.*$", "Dolphin"),
        SubRule::text(r"(?i)^DTAC.*$", "DTAC"),
        SubRule::text(r"(?i)^E-Plus.*$", "E-Plus"),
        SubRule::text(r"(?i)^Econet.*$", "Econet"),
        SubRule::text(r"(?i)^eMobile.*$", "eMobile"),
        SubRule::text(r"(?i)^Emtel.*$", "Emtel"),
        SubRule::text(r"(?i)^Entel.*$", "Entel"),
        SubRule::text(r"(?i)^Etisalat.*$", "Etisalat"),
        SubRule::text(r"(?i)^Euskatel.*$", "Euskatel"),
        SubRule::text(r"(?i)^Farmers.*$", "Farmers"),
        SubRule::text(r"(?i)^Fastweb.*$", "Fastweb"),
        SubRule::text(r"(?i)^Fonex.*$", "Fonex"),
        SubRule::text(r"(?i)^Free.*$", "Free"),
        SubRule::text(r"(?i)^Gemalto.*$", "Gemalto"),
        SubRule::text(r"(?i)^Globalstar.*$", "Globalstar"),
        SubRule::text(r"(?i)^Globe.*$", "Globe"),
        SubRule::text(r"(?i)^GLOBUL.*$", "GLOBUL"),
        SubRule::text(r"(?i)^Golan.*$", "Golan"),
        SubRule::text(r"(?i)^Golden Telecom.*$", "Golden Telecom"),
        SubRule::text(r"(?i)^Grameen.*$", "Grameenphone"),
        SubRule::text(r"(?i)^GP$", "Grameenphone"),
        SubRule::text(r"(?i)^Hello.*$", "Hello"),
        SubRule::text(r"(?i)^Highland.*$", "Highland"),
        SubRule::text(r"(?i)^Hits.*$", "Hits"),
        SubRule::text(r"(?i)^Hormuud.*$", "Hormuud"),
        SubRule::text(r"(?i)^HT.*$", "HT"),
        SubRule::text(r"(?i)^ICE.*$", "ICE"),
        SubRule::text(r"(?i)^Idea.*$", "Idea"),
        SubRule::text(r"(?i)^Indigo.*$", "Indigo"),
        SubRule::text(r"(?i)^Indosat.*$", "Indosat"),
        SubRule::text(r"(?i)^Jawwal.*$", "Jawwal"),
        SubRule::text(r"(?i)^Jazztel.*$", "Jazztel"),
        SubRule::text(r"(?i)^KTF.*$", "KTF"),
        SubRule::text(r"(?i)^Liaoning.*$", "China Mobile"),
        SubRule::text(r"(?i)^Libertis.*$", "Libertis"),
        SubRule::text(r"(?i)^Maroc Telecom.*$", "Maroc Telecom"),
        SubRule::text(r"(?i)^MIO.*$", "MIO"),
        SubRule::text(r"(?i)^Mobilis.*$", "Mobilis"),
        SubRule::text(r"(?i)^mobilR.*$", "mobilR"),
        SubRule::text(r"(?i)^mobily.*$", "mobily"),
        SubRule::text(r"(?i)^Mobistar.*$", "Mobistar"),
        SubRule::text(r"(?i)^Moov.*$", "Moov"),
        SubRule::text(r"(?i)^Movilnet.*$", "Movilnet"),
        SubRule::text(r"(?i)^Namaste.*$", "Namaste"),
        SubRule::text(r"(?i)^Nawras.*$", "Nawras"),
        SubRule::text(r"(?i)^NEP.*$", "NEP"),
        SubRule::text(r"(?i)^Netz.*$", "Netz"),
        SubRule::text(r"(?i)^Nextel.*$", "Nextel"),
        SubRule::text(r"(?i)^Nitz.*$", "Nitz"),
        SubRule::text(r"(?i)^O2.*$", "O2"),
        SubRule::text(r"(?i)^olleh.*$", "olleh"),
        SubRule::text(r"(?i)^One\.Tel.*$", "One.Tel"),
        SubRule::text(r"(?i)^OnePhone.*$", "OnePhone"),
        SubRule::text(r"(?i)^Orange.*$", "Orange"),
        SubRule::text(r"(?i)^Outremer.*$", "Outremer"),
        SubRule::text(r"(?i)^OY.*$", "OY"),
        SubRule::text(r"(?i)^Play.*$", "Play"),
        SubRule::text(r"(?i)^Plus.*$", "Plus"),
        SubRule::text(r"(?i)^Poka Lambro.*$", "Poka Lambro"),
        SubRule::text(r"(?i)^Polska Telefonia.*$", "Polska Telefonia"),
        SubRule::text(r"(?i)^Reliance.*$", "Reliance"),
        SubRule::text(r"(?i)^Robi.*$", "Robi"),
        SubRule::text(r"(?i)^Rogers.*$", "Rogers"),
        SubRule::text(r"(?i)^Rwandatel.*$", "Rwandatel"),
        SubRule::text(r"(?i)^Scarlet.*$", "Scarlet"),
        SubRule::text(r"(?i)^SERCOM.*$", "SERCOM"),
        SubRule::text(r"(?i)^SFR.*$", "SFR"),
        SubRule::text(r"(?i)^Simyo.*$", "Simyo"),
        SubRule::text(r"(?i)^SingTel.*$", "SingTel"),
        SubRule::text(r"(?i)^SKT.*$", "SKT"),
        SubRule::text(r"(?i)^SmarTone.*$", "SmarTone"),
        SubRule::text(r"(?i)^Smile.*$", "Smile"),
        SubRule::text(r"(?i)^Softbank.*$", "Softbank"),
        SubRule::text(r"(?i)^Southern Communications.*$", "Southern Communications"),
        SubRule::text(r"(?i)^Spacetel.*$", "Spacetel"),
        SubRule::text(r"(?i)^Tango.*$", "Tango"),
        SubRule::text(r"(?i)^TATA Teleservices.*$", "Docomo"),
        SubRule::text(r"(?i)^Telcel.*$", "Telcel"),
        SubRule::text(r"(?i)^Telenor.*$", "Telenor"),
        SubRule::text(r"(?i)^Teletalk.*$", "Teletalk"),
        SubRule::text(r"(?i)^Tele\.ring.*$", "Tele.ring"),
        SubRule::text(r"(?i)^Telma.*$", "Telma"),
        SubRule::text(r"(?i)^Telstra.*$", "Telstra"),
        SubRule::text(r"(?i)^Telus.*$", "Telus"),
        SubRule::text(r"(?i)^Tesco.*$", "Tesco"),
        SubRule::text(r"(?i)^Test.*$", "Test"),
        SubRule::text(r"(?i)^Thinta.*$", "Thinta"),
        SubRule::text(r"(?i)^Thuraya.*$", "Thuraya"),
        SubRule::text(r"(?i)^Tigo.*$", "Tigo"),
        SubRule::text(r"(?i)^TMA.*$", "TMA"),
        SubRule::text(r"(?i)^True.*$", "True"),
        SubRule::text(r"(?i)^Tuenti.*$", "Tuenti"),
        SubRule::text(r"(?i)^Unicom.*$", "Unicom"),
        SubRule::text(r"(?i)^Uninor.*$", "Uninor"),
        SubRule::text(r"(?i)^UTS.*$", "UTS"),
        SubRule::text(r"(?i)^Vectone.*$", "Vectone"),
        SubRule::text(r"(?i)^Velcom.*$", "Velcom"),
        SubRule::text(r"(?i)^Videocon.*$", "Videocon"),
        SubRule::text(r"(?i)^Viettel.*$", "Viettel"),
        SubRule::text(r"(?i)^VIP.*$", "VIP"),
        SubRule::text(r"(?i)^Virgin.*$", "Virgin"),
        SubRule::text(r"(?i)^Viva.*$", "Viva"),
        SubRule::text(r"(?i)^Vivo.*$", "Vivo"),
        SubRule::text(r"(?i)^VoiceStream.*$", "VoiceStream"),
        SubRule::text(r"(?i)^VTR.*$", "VTR"),
        SubRule::text(r"(?i)^Warid.*$", "Warid"),
        SubRule::text(r"(?i)^Wataniya.*$", "Wataniya"),
        SubRule::text(r"(?i)^Wind.*$", "Wind"),
        SubRule::text(r"(?i)^XL.*$", "XL"),
        SubRule::text(r"(?i)^Yesss.*$", "Yesss"),
        SubRule::text(r"(?i)^Yoigo.*$", "Yoigo"),
        SubRule::text(r"(?i)^Zain.*$", "Zain"),
        // Fuller patterns for spelling differences and rebrandings.
        SubRule::text(r"(?i)^!dea(\s.+)?$", "Idea"),
        SubRule::text(r"(?i)^3[^\w].+$", "3"),
        SubRule::text(r"(?i)^bee\s*line(\s.+)?$", "Beeline"),
        SubRule::text(r"(?i)^bh\s*mobile(\s.+)?$", "BH Mobile"),
        SubRule::text(r"(?i)^(.+\s)?bsnl(\s.+)?$", "BSNL"),
        SubRule::text(r"(?i)^cab(le|el) (&|and) wireless.*$", "Cable & Wireless"),
        SubRule::text(r"(?i)celcom", "Cellcom"),
        SubRule::with(
            r"(?i)^(?:.+\s)?china.*\s(?P<suffix>mobile|telecom|unicom)(\s.+)?$",
            |caps| {
                let suffix = caps["suffix"].to_lowercase();
                let mut chars = suffix.chars();
                let capitalized = match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                };
                format!("China {}", capitalized)
            },
        ),
        SubRule::text(r"(?i)^(chn-)?(unicom|cu[^\w]*(cc|gsm)).*$", "China Unicom"),
        SubRule::text(r"(?i)^CMCC$", "China Mobile"),
        SubRule::text(r"(?i)^(chungh?wa.*|CHT)$", "Chunghwa"),
        SubRule::text(r"(?i)^.*cingular.*$", "Cingular"),
        SubRule::text(r"(?i)^(.+\s)?cosmote(\s.+)?$", "Cosmote"),
        SubRule::text(r"(?i)^da?tatel(\s.+)?$", "Datatel"),
        SubRule::text(r"(?i)^diall?og$", "Dialog"),
        SubRule::text(r"(?i)^digi([^\w]+.*)?$", "Digi"),
        SubRule::text(r"(?i)^(.+\s)?docomo(\s.+)?$", "Docomo"),
        SubRule::text(r"(?i)^esto es el.+$", "Unknown"),
        SubRule::text(r"(?i)^glo(\s.+)?$", "Glo"),
        SubRule::text(r"(?i)^gramee?n(phone)?$", "Grameenphone"),
        SubRule::text(r"(?i)^guin.tel.*$", "Guinetel"),
        SubRule::text(r"(?i)^life(\s.+)?$", "life:)"),
        SubRule::text(r"(?i)^lime(\s.+)?$", "Lime"),
        SubRule::text(r"(?i)^lyca.*$", "Lyca Mobile"),
        SubRule::text(r"(?i)^m[:-]?tel(\s.+)?$", "M-Tel"),
        SubRule::text(r"(?i)^medion\s*mobile(\s.+)?", "Medion"),
        SubRule::text(r"(?i)^mobil?com([^\w].+)?$", "Mobilcom"),
        SubRule::text(r"(?i)^mobil?tel(\s.+)?$", "Mobitel"),
        SubRule::text(r"(?i)^(.+\s)?movie?star(\s.+)?$", "Movistar"),
        SubRule::with(r"(?i)^mt:?(?P<suffix>[cns])([^\w].*)?$", |caps| {
            format!("MT{}", caps["suffix"].to_uppercase())
        }),
        SubRule::text(r"(?i)^mudio", "Mundio"),
        SubRule::text(r"(?i)^oi(\s.+)?$", "Oi"),
        SubRule::text(r"(?i)^proxi(mus)?(\s.+)?$", "Proximus"),
        SubRule::text(r"(?i)^Sask\s?[Tt]el.*$", "SaskTel"),
        SubRule::text(r"(?i)^smarts?(\s.+)?$", "Smart"),
        SubRule::text(r"(?i)^s\s+tel.*$", "S Tel"),
        SubRule::text(r"(?i)^sun(\s.+)?$", "Sun"),
        SubRule::text(r"(?i)^t\s*-\s*mobile.*$", "T-Mobile"),
        SubRule::text(r"(?i)^.*tele?\s*2.*$", "Tele2"),
        SubRule::text(r"(?i)^tel\w+\scel$", "Telecel"),
        SubRule::text(r"(?i)^telekom\.de(\s.+)?$", "T-Mobile"),
        SubRule::text(r"(?i)^telekom(\.|\s)hu(\s.+)?$", "T-Mobile"),
        SubRule::text(r"(?i)^tm([^\w].+)?$", "TM"),
        SubRule::text(r"(?i)^tw\s*m(obile)?(\s.+)?$", "Taiwan Mobile"),
        SubRule::text(r"(?i)^.*verizon.*$", "Verizon"),
        SubRule::text(r"(?i)^vid.otron.*$", "Videotron"),
        SubRule::text(r"(?i)^vip([^\w].*)?$", "VIP"),
        SubRule::text(r"(?i)^voda.*$", "Vodafone"),
        SubRule::text(r"(?i)^W1(\s.+)?$", "WirelessOne"),
        SubRule::text(r"(?i)^Wikes Cellular$", "Wilkes Cellular"),
    ]
});

// =============================================================================
// Channel and Locale Rules
// =============================================================================

/// Standard release channels searched for inside custom channel strings
pub static STANDARD_CHANNELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("release|beta|aurora|nightly|default").expect("static pattern"));

/// Strips the country identifier from a locale code (`pt-BR` -> `pt`)
pub static LOCALE_BASE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("-.+$").expect("static pattern"));
